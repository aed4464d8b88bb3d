use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{EngineError, PlanTier, ResultEngine, owners, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a new owner on the given plan tier.
    pub async fn register_owner(&self, owner_id: &str, plan: PlanTier) -> ResultEngine<()> {
        let owner_id = normalize_required_name(owner_id, "owner")?;
        with_tx!(self, |db_tx| {
            if owners::Entity::find_by_id(owner_id.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(owner_id));
            }

            let active = owners::ActiveModel {
                id: ActiveValue::Set(owner_id.clone()),
                plan: ActiveValue::Set(plan.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            active.insert(&db_tx).await?;
            tracing::info!(owner = %owner_id, plan = plan.as_str(), "owner registered");
            Ok(())
        })
    }

    /// Moves an owner to another plan tier.
    pub async fn set_owner_plan(&self, owner_id: &str, plan: PlanTier) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let active = owners::ActiveModel {
                id: ActiveValue::Set(owner_id.to_string()),
                plan: ActiveValue::Set(plan.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Returns the plan tier of an owner.
    pub async fn owner_plan(&self, owner_id: &str) -> ResultEngine<PlanTier> {
        with_tx!(self, |db_tx| self.require_owner(&db_tx, owner_id).await)
    }

    pub(super) async fn require_owner(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<PlanTier> {
        let model = owners::Entity::find_by_id(owner_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("owner not exists".to_string()))?;
        PlanTier::try_from(model.plan.as_str())
    }
}
