use chrono::NaiveDate;
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, EntryFilter, EntryKind, EntryStatus, Money, ReportRequest, ResultEngine,
    count_distinct_operations,
};

use super::{Engine, with_tx};

/// Totals of one owner over a date range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub settled_inflow: Money,
    pub settled_outflow: Money,
    pub payable_inflow: Money,
    pub payable_outflow: Money,
    /// `settled_inflow - settled_outflow`.
    pub net: Money,
    pub operation_count: u64,
    /// Revenue needed for settled costs to be `cost_ratio_percent` of it.
    pub revenue_target: Money,
}

impl Engine {
    pub async fn period_summary(&self, request: &ReportRequest) -> ResultEngine<PeriodSummary> {
        if request.cost_ratio_percent == 0 || request.cost_ratio_percent > 100 {
            return Err(EngineError::Validation(
                "cost ratio must be within 1..=100 percent".to_string(),
            ));
        }
        let filter = EntryFilter::between(request.from, request.to);
        filter.validate()?;

        with_tx!(self, |db_tx| {
            let owner_id = request.owner_id.as_str();
            self.require_owner(&db_tx, owner_id).await?;
            let found = self.find_filtered(&db_tx, owner_id, &filter).await?;

            let mut summary = PeriodSummary {
                from: request.from,
                to: request.to,
                settled_inflow: Money::ZERO,
                settled_outflow: Money::ZERO,
                payable_inflow: Money::ZERO,
                payable_outflow: Money::ZERO,
                net: Money::ZERO,
                operation_count: count_distinct_operations(
                    found
                        .iter()
                        .map(|entry| (entry.id, entry.group_key.as_deref())),
                ),
                revenue_target: Money::ZERO,
            };
            for entry in &found {
                let bucket = match (entry.status, entry.kind) {
                    (EntryStatus::Settled, EntryKind::Inflow) => &mut summary.settled_inflow,
                    (EntryStatus::Settled, EntryKind::Outflow) => &mut summary.settled_outflow,
                    (EntryStatus::Payable, EntryKind::Inflow) => &mut summary.payable_inflow,
                    (EntryStatus::Payable, EntryKind::Outflow) => &mut summary.payable_outflow,
                };
                *bucket += entry.amount;
            }
            summary.net = summary.settled_inflow - summary.settled_outflow;
            summary.revenue_target = summary
                .settled_outflow
                .mul_div_half_up(100, i64::from(request.cost_ratio_percent))?;
            Ok(summary)
        })
    }
}
