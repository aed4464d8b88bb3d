use chrono::{NaiveDate, NaiveTime};
use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Period, ResultEngine, UsageSummary, entries, usage};

use super::{Engine, with_tx};

impl Engine {
    /// Distinct operations of `owner_id` created (UTC) on a day within
    /// `[start, end]`. Entry dates play no part: backdating an operation or
    /// editing its date does not move it to another period.
    pub async fn count_distinct_operations(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<u64> {
        if start > end {
            return Err(EngineError::Validation(
                "invalid range: start must be <= end".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            self.count_operations_between(&db_tx, owner_id, start, end)
                .await
        })
    }

    /// Cap usage of the calendar month containing `today`.
    pub async fn usage_summary(
        &self,
        owner_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<UsageSummary> {
        with_tx!(self, |db_tx| {
            let plan = self.require_owner(&db_tx, owner_id).await?;
            let period = Period::month_of(today);
            let used = self
                .count_operations_between(&db_tx, owner_id, period.start, period.end)
                .await?;
            Ok(UsageSummary::new(
                plan,
                used,
                self.plan_limits.cap(plan),
                period,
                today,
            ))
        })
    }

    /// Refuses a new operation once the owner's monthly cap is used up.
    pub(super) async fn ensure_within_plan_cap(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<()> {
        let plan = self.require_owner(db, owner_id).await?;
        let Some(cap) = self.plan_limits.cap(plan) else {
            return Ok(());
        };
        let period = Period::month_of(today);
        let used = self
            .count_operations_between(db, owner_id, period.start, period.end)
            .await?;
        if used >= u64::from(cap) {
            tracing::warn!(owner = owner_id, plan = plan.as_str(), used, cap, "plan limit reached");
            return Err(EngineError::PlanLimitExceeded { used, cap });
        }
        Ok(())
    }

    async fn count_operations_between(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<u64> {
        let mut query = entries::Entity::find()
            .select_only()
            .column(entries::Column::Id)
            .column(entries::Column::GroupKey)
            .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
            .filter(entries::Column::CreatedAt.gte(start.and_time(NaiveTime::MIN).and_utc()));
        if let Some(next) = end.succ_opt() {
            query = query.filter(entries::Column::CreatedAt.lt(next.and_time(NaiveTime::MIN).and_utc()));
        }
        let rows: Vec<(Uuid, Option<String>)> = query.into_tuple().all(db).await?;
        Ok(usage::count_distinct_operations(
            rows.iter().map(|(id, key)| (*id, key.as_deref())),
        ))
    }
}
