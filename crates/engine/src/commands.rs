//! Command structs for engine operations.
//!
//! These types group parameters for write operations and queries (operation
//! forms, listing filters, report requests), keeping call sites readable and
//! avoiding long argument lists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntryKind, EntryStatus, Money, ResultEngine};

/// One `(account, amount)` split of an operation.
///
/// Lines missing either side are skipped when the form is saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub account_id: Option<Uuid>,
    pub amount: Option<Money>,
}

impl PaymentLine {
    #[must_use]
    pub fn new(account_id: Uuid, amount: Money) -> Self {
        Self {
            account_id: Some(account_id),
            amount: Some(amount),
        }
    }
}

/// Create or edit an operation.
///
/// A present, non-blank `group_key` makes this an edit of the existing
/// operation; otherwise a new operation is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationForm {
    pub group_key: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub category_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub fiscal_document: Option<bool>,
    pub lines: Vec<PaymentLine>,
    pub existing_attachments: Vec<String>,
}

impl OperationForm {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        date: NaiveDate,
        kind: EntryKind,
        status: EntryStatus,
    ) -> Self {
        Self {
            group_key: None,
            description: description.into(),
            date,
            kind,
            status,
            category_id: None,
            counterparty_id: None,
            fiscal_document: None,
            lines: Vec::new(),
            existing_attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn group_key(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    #[must_use]
    pub fn line(mut self, account_id: Uuid, amount: Money) -> Self {
        self.lines.push(PaymentLine::new(account_id, amount));
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty_id: Uuid) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    #[must_use]
    pub fn fiscal_document(mut self, fiscal_document: bool) -> Self {
        self.fiscal_document = Some(fiscal_document);
        self
    }

    #[must_use]
    pub fn attachment(mut self, path: impl Into<String>) -> Self {
        self.existing_attachments.push(path.into());
        self
    }

    /// The group key of the operation being edited, if any.
    pub fn edited_group_key(&self) -> Option<&str> {
        self.group_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Lines with both an account and an amount.
    pub fn complete_lines(&self) -> impl Iterator<Item = (Uuid, Money)> + '_ {
        self.lines
            .iter()
            .filter_map(|line| Some((line.account_id?, line.amount?)))
    }
}

/// Filters for listing entries and operations.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub kind: Option<EntryKind>,
    pub category_id: Option<Uuid>,
    pub fiscal_document: Option<bool>,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    #[must_use]
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::Validation(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of results.
///
/// `total` counts the underlying rows of the query, which for aggregated
/// operations is the number of entries, not the number of operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// Default share of revenue expected to go to costs, in percent.
pub const DEFAULT_COST_RATIO_PERCENT: u32 = 60;

/// Request for a period report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub owner_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub cost_ratio_percent: u32,
}

impl ReportRequest {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            owner_id: owner_id.into(),
            from,
            to,
            cost_ratio_percent: DEFAULT_COST_RATIO_PERCENT,
        }
    }
}
