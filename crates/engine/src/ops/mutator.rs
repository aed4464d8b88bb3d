//! Balance mutations.
//!
//! Every balance change is a single `UPDATE ... SET balance = balance + ?`
//! scoped to the owner and run inside the caller's transaction.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, EngineError, Entry, EntryStatus, Money, ResultEngine, accounts, entries,
};

use super::{Engine, with_tx};

/// An account whose stored balance disagrees with its entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub account_id: Uuid,
    pub name: String,
    pub recorded: Money,
    pub derived: Money,
}

impl Engine {
    /// Adds the signed effect of a settled `entry` to its account.
    pub(super) async fn apply_entry(
        &self,
        db: &DatabaseTransaction,
        entry: &Entry,
    ) -> ResultEngine<()> {
        if !entry.is_settled() {
            return Ok(());
        }
        shift_balance(db, &entry.owner_id, entry.account_id, entry.signed_effect()).await
    }

    /// Undoes what [`Engine::apply_entry`] did for `entry`.
    pub(super) async fn reverse_entry(
        &self,
        db: &DatabaseTransaction,
        entry: &Entry,
    ) -> ResultEngine<()> {
        if !entry.is_settled() {
            return Ok(());
        }
        shift_balance(db, &entry.owner_id, entry.account_id, -entry.signed_effect()).await
    }

    /// Accounts whose stored balance differs from
    /// `initial_balance + Σ settled effects`. Read-only.
    pub async fn balance_drift(&self, owner_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            derive_drift(&db_tx, owner_id).await
        })
    }

    /// Rewrites every drifted balance from the ledger and returns what was
    /// corrected.
    pub async fn recompute_balances(&self, owner_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let drift = derive_drift(&db_tx, owner_id).await?;
            for item in &drift {
                accounts::Entity::update_many()
                    .col_expr(
                        accounts::Column::BalanceMinor,
                        Expr::value(item.derived.cents()),
                    )
                    .col_expr(
                        accounts::Column::Version,
                        Expr::col(accounts::Column::Version).add(1),
                    )
                    .filter(accounts::Column::Id.eq(item.account_id))
                    .exec(&db_tx)
                    .await?;
                tracing::warn!(
                    owner = owner_id,
                    account = %item.account_id,
                    recorded = %item.recorded,
                    derived = %item.derived,
                    "balance recomputed"
                );
            }
            Ok(drift)
        })
    }
}

async fn shift_balance(
    db: &DatabaseTransaction,
    owner_id: &str,
    account_id: Uuid,
    delta: Money,
) -> ResultEngine<()> {
    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::BalanceMinor,
            Expr::col(accounts::Column::BalanceMinor).add(delta.cents()),
        )
        .col_expr(
            accounts::Column::Version,
            Expr::col(accounts::Column::Version).add(1),
        )
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::AccountNotFound(account_id.to_string()));
    }
    tracing::debug!(owner = owner_id, account = %account_id, delta = %delta, "balance shifted");
    Ok(())
}

async fn derive_drift(db: &DatabaseTransaction, owner_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
    let owned: Vec<Account> = accounts::Entity::find()
        .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
        .all(db)
        .await?
        .into_iter()
        .map(Account::from)
        .collect();

    let mut effects: HashMap<Uuid, Money> = HashMap::new();
    let settled = entries::Entity::find()
        .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
        .filter(entries::Column::Status.eq(EntryStatus::Settled.as_str()))
        .all(db)
        .await?;
    for model in settled {
        let entry = Entry::try_from(model)?;
        let effect = effects.entry(entry.account_id).or_insert(Money::ZERO);
        *effect = effect
            .checked_add(entry.signed_effect())
            .ok_or_else(|| balance_overflow(entry.account_id))?;
    }

    let mut drift = Vec::new();
    for account in owned {
        let derived = account
            .initial_balance
            .checked_add(effects.get(&account.id).copied().unwrap_or(Money::ZERO))
            .ok_or_else(|| balance_overflow(account.id))?;
        if derived != account.balance {
            drift.push(BalanceDrift {
                account_id: account.id,
                name: account.name,
                recorded: account.balance,
                derived,
            });
        }
    }
    Ok(drift)
}

fn balance_overflow(account_id: Uuid) -> EngineError {
    EngineError::InvalidAmount(format!("{account_id}: derived balance overflows"))
}
