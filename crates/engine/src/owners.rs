//! Owners and their plan tier.
//!
//! Every account, entry, category and counterparty is scoped to one owner. The
//! plan tier decides how many operations the owner may create per calendar
//! month.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Essential,
    Unlimited,
}

impl PlanTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Essential => "essential",
            Self::Unlimited => "unlimited",
        }
    }
}

impl TryFrom<&str> for PlanTier {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "essential" => Ok(Self::Essential),
            "unlimited" => Ok(Self::Unlimited),
            other => Err(EngineError::Validation(format!(
                "invalid plan tier: {other}"
            ))),
        }
    }
}

/// Monthly operation caps per plan tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanLimits {
    pub free: u32,
    pub essential: u32,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: 20,
            essential: 200,
        }
    }
}

impl PlanLimits {
    /// Cap for `tier`; `None` means unlimited.
    #[must_use]
    pub fn cap(&self, tier: PlanTier) -> Option<u32> {
        match tier {
            PlanTier::Free => Some(self.free),
            PlanTier::Essential => Some(self.essential),
            PlanTier::Unlimited => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "owners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_cap_free_tier_at_twenty() {
        let limits = PlanLimits::default();
        assert_eq!(limits.cap(PlanTier::Free), Some(20));
        assert_eq!(limits.cap(PlanTier::Essential), Some(200));
        assert_eq!(limits.cap(PlanTier::Unlimited), None);
    }

    #[test]
    fn parses_tier_names_case_insensitively() {
        assert_eq!(PlanTier::try_from(" Essential ").unwrap(), PlanTier::Essential);
        assert!(PlanTier::try_from("gold").is_err());
    }
}
