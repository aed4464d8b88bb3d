use std::collections::HashMap;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, EngineError, Money, ResultEngine, accounts, entries, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Opens a new account for `owner_id`.
    ///
    /// The account starts with `balance == initial_balance`. Names are unique
    /// per owner, ignoring case.
    pub async fn new_account(
        &self,
        owner_id: &str,
        name: &str,
        kind_label: &str,
        initial_balance: Money,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "account")?;
        let kind_label = kind_label.trim().to_string();
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            self.ensure_account_name_free(&db_tx, owner_id, &name, None)
                .await?;

            let account = Account::new(owner_id.to_string(), name, kind_label, initial_balance);
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            tracing::info!(owner = owner_id, account = %account.id, "account opened");
            Ok(account.id)
        })
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id, account_id).await
        })
    }

    /// All accounts of an owner, ordered by name.
    pub async fn accounts(&self, owner_id: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(accounts::Column::NameNorm)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Account::from).collect())
        })
    }

    /// Renames an existing account.
    pub async fn rename_account(
        &self,
        owner_id: &str,
        account_id: Uuid,
        new_name: &str,
    ) -> ResultEngine<()> {
        let new_name = normalize_required_name(new_name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id, account_id).await?;
            self.ensure_account_name_free(&db_tx, owner_id, &new_name, Some(account_id))
                .await?;

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(account_id),
                name_norm: ActiveValue::Set(new_name.to_lowercase()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes an account that no entry references.
    pub async fn delete_account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id, account_id).await?;

            let referencing = entries::Entity::find()
                .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
                .filter(entries::Column::AccountId.eq(account_id))
                .count(&db_tx)
                .await?;
            if referencing > 0 {
                return Err(EngineError::Validation(format!(
                    "account still referenced by {referencing} entries"
                )));
            }

            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(owner = owner_id, account = %account_id, "account deleted");
            Ok(())
        })
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .one(db)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))
    }

    /// Display names of every account of `owner_id`, keyed by id.
    pub(super) async fn account_names(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .all(db)
            .await?;
        Ok(models.into_iter().map(|m| (m.id, m.name)).collect())
    }

    async fn ensure_account_name_free(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .filter(accounts::Column::NameNorm.eq(name.to_lowercase()));
        if let Some(id) = except {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
