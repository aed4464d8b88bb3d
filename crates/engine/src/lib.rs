//! Grouped ledger engine for small-business bookkeeping.
//!
//! Users record *operations*; each operation is stored as one or more
//! [`Entry`] rows sharing a group key, one per account the money was split
//! across. Settled entries move their account balance, payable ones wait for
//! [`Engine::settle_entry`]. Every write goes through the [`Engine`], which
//! keeps `balance == initial_balance + Σ settled effects` for every account.

pub use accounts::Account;
pub use aggregate::{
    MULTIPLE_ACCOUNTS_LABEL, OperationView, accounts_label, aggregate_operations, aggregate_page,
};
pub use attachments::{AttachmentStore, UploadedFile};
pub use commands::{
    DEFAULT_COST_RATIO_PERCENT, EntryFilter, OperationForm, Page, PaymentLine, ReportRequest,
};
pub use entries::{Entry, EntryKind, EntryStatus};
pub use error::EngineError;
pub use money::Money;
pub use ops::{BalanceDrift, Engine, EngineBuilder, NamedRecord, PeriodSummary};
pub use owners::{PlanLimits, PlanTier};
pub use usage::{Period, UsageSummary, count_distinct_operations};

mod accounts;
mod aggregate;
mod attachments;
mod categories;
mod commands;
mod counterparties;
mod entries;
mod error;
mod money;
mod ops;
mod owners;
mod usage;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
