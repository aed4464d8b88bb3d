use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{AttachmentStore, PlanLimits, ResultEngine};

mod accounts;
mod directory;
mod listing;
mod mutator;
mod operations;
mod owners;
mod reports;
mod store;
mod usage;

pub use directory::NamedRecord;
pub use mutator::BalanceDrift;
pub use reports::PeriodSummary;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    attachments: Option<Arc<dyn AttachmentStore>>,
    plan_limits: PlanLimits,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Monthly caps applied to plan tiers.
    pub fn plan_limits(&self) -> PlanLimits {
        self.plan_limits
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    attachments: Option<Arc<dyn AttachmentStore>>,
    plan_limits: PlanLimits,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Storage used for files uploaded with operation forms.
    pub fn attachment_store(mut self, store: impl AttachmentStore + 'static) -> EngineBuilder {
        self.attachments = Some(Arc::new(store));
        self
    }

    pub fn plan_limits(mut self, limits: PlanLimits) -> EngineBuilder {
        self.plan_limits = limits;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
            attachments: self.attachments,
            plan_limits: self.plan_limits,
        })
    }
}
