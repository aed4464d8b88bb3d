//! Categories and counterparties referenced by entries.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, categories, counterparties,
    util::{normalize_name_key, normalize_required_name},
};

use super::{Engine, with_tx};

/// A named record owned by one owner (category or counterparty).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub id: Uuid,
    pub name: String,
}

impl Engine {
    /// Creates a category; names are unique per owner after normalization.
    pub async fn new_category(&self, owner_id: &str, name: &str) -> ResultEngine<Uuid> {
        let display = normalize_required_name(name, "category")?;
        let key = normalize_name_key(&display)?;
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let exists = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .filter(categories::Column::NameNorm.eq(key.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(display));
            }

            let id = Uuid::new_v4();
            categories::ActiveModel {
                id: ActiveValue::Set(id),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                name: ActiveValue::Set(display),
                name_norm: ActiveValue::Set(key),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn categories(&self, owner_id: &str) -> ResultEngine<Vec<NamedRecord>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(categories::Column::NameNorm)
                .all(&db_tx)
                .await?;
            Ok(models
                .into_iter()
                .map(|m| NamedRecord {
                    id: m.id,
                    name: m.name,
                })
                .collect())
        })
    }

    /// Creates a counterparty; names are unique per owner after normalization.
    pub async fn new_counterparty(&self, owner_id: &str, name: &str) -> ResultEngine<Uuid> {
        let display = normalize_required_name(name, "counterparty")?;
        let key = normalize_name_key(&display)?;
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let exists = counterparties::Entity::find()
                .filter(counterparties::Column::OwnerId.eq(owner_id.to_string()))
                .filter(counterparties::Column::NameNorm.eq(key.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(display));
            }

            let id = Uuid::new_v4();
            counterparties::ActiveModel {
                id: ActiveValue::Set(id),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                name: ActiveValue::Set(display),
                name_norm: ActiveValue::Set(key),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn counterparties(&self, owner_id: &str) -> ResultEngine<Vec<NamedRecord>> {
        with_tx!(self, |db_tx| {
            let models = counterparties::Entity::find()
                .filter(counterparties::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(counterparties::Column::NameNorm)
                .all(&db_tx)
                .await?;
            Ok(models
                .into_iter()
                .map(|m| NamedRecord {
                    id: m.id,
                    name: m.name,
                })
                .collect())
        })
    }

    /// Fails with `KeyNotFound` unless the owner has the referenced category
    /// and counterparty.
    pub(super) async fn require_references(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        category_id: Option<Uuid>,
        counterparty_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if let Some(id) = category_id {
            categories::Entity::find_by_id(id)
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        }
        if let Some(id) = counterparty_id {
            counterparties::Entity::find_by_id(id)
                .filter(counterparties::Column::OwnerId.eq(owner_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("counterparty not exists".to_string()))?;
        }
        Ok(())
    }
}
