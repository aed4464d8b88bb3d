//! Ledger entries.
//!
//! An [`Entry`] is one ledger line affecting exactly one account. Entries that
//! share a group key form one logical operation: the same description, date,
//! kind and status split across several accounts.
//!
//! Amounts are stored as positive integer **minor units**; the direction of
//! the balance effect is carried by [`EntryKind`].

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Inflow,
    Outflow,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "inflow" => Ok(Self::Inflow),
            "outflow" => Ok(Self::Outflow),
            other => Err(EngineError::Validation(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// The money moved; the entry affects its account balance.
    Settled,
    /// Still to be paid or received; no balance effect yet.
    Payable,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Payable => "payable",
        }
    }
}

impl TryFrom<&str> for EntryStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "settled" => Ok(Self::Settled),
            "payable" => Ok(Self::Payable),
            other => Err(EngineError::Validation(format!(
                "invalid entry status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub owner_id: String,
    pub account_id: Uuid,
    pub amount: Money,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub date: NaiveDate,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub fiscal_document: Option<bool>,
    pub group_key: Option<String>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        owner_id: String,
        account_id: Uuid,
        amount: Money,
        kind: EntryKind,
        status: EntryStatus,
        date: NaiveDate,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            account_id,
            amount,
            kind,
            status,
            date,
            description,
            category_id: None,
            counterparty_id: None,
            fiscal_document: None,
            group_key: None,
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Signed effect of this entry on its account balance.
    pub fn signed_effect(&self) -> Money {
        match self.kind {
            EntryKind::Inflow => self.amount,
            EntryKind::Outflow => -self.amount,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status == EntryStatus::Settled
    }

    /// Returns the explicit group key, if present and non-blank.
    pub fn explicit_group_key(&self) -> Option<&str> {
        self.group_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Key of the operation this entry belongs to.
    ///
    /// Entries without a group key are singleton operations keyed by their
    /// own id.
    pub fn operation_key(&self) -> String {
        operation_key(self.group_key.as_deref(), self.id)
    }
}

/// Operation key for a raw `(group_key, id)` pair.
pub(crate) fn operation_key(group_key: Option<&str>, id: Uuid) -> String {
    match group_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => key.to_string(),
        None => id.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub kind: String,
    pub status: String,
    pub date: Date,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub fiscal_document: Option<bool>,
    pub group_key: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            owner_id: ActiveValue::Set(entry.owner_id.clone()),
            account_id: ActiveValue::Set(entry.account_id),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            date: ActiveValue::Set(entry.date),
            description: ActiveValue::Set(entry.description.clone()),
            category_id: ActiveValue::Set(entry.category_id),
            counterparty_id: ActiveValue::Set(entry.counterparty_id),
            fiscal_document: ActiveValue::Set(entry.fiscal_document),
            group_key: ActiveValue::Set(entry.group_key.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            account_id: model.account_id,
            amount: Money::new(model.amount_minor),
            kind: EntryKind::try_from(model.kind.as_str())?,
            status: EntryStatus::try_from(model.status.as_str())?,
            date: model.date,
            description: model.description,
            category_id: model.category_id,
            counterparty_id: model.counterparty_id,
            fiscal_document: model.fiscal_document,
            group_key: model.group_key,
            attachments: Vec::new(),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind) -> Entry {
        Entry::new(
            "alice".to_string(),
            Uuid::new_v4(),
            Money::new(150_55),
            kind,
            EntryStatus::Settled,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            "Office rent".to_string(),
        )
    }

    #[test]
    fn signed_effect_follows_kind() {
        assert_eq!(entry(EntryKind::Inflow).signed_effect(), Money::new(150_55));
        assert_eq!(entry(EntryKind::Outflow).signed_effect(), Money::new(-150_55));
    }

    #[test]
    fn blank_group_key_falls_back_to_id() {
        let mut entry = entry(EntryKind::Inflow);
        assert_eq!(entry.operation_key(), entry.id.to_string());

        entry.group_key = Some("   ".to_string());
        assert_eq!(entry.operation_key(), entry.id.to_string());
        assert_eq!(entry.explicit_group_key(), None);

        entry.group_key = Some("op-1".to_string());
        assert_eq!(entry.operation_key(), "op-1");
    }

    #[test]
    fn kind_and_status_round_trip_through_storage_names() {
        for kind in [EntryKind::Inflow, EntryKind::Outflow] {
            assert_eq!(EntryKind::try_from(kind.as_str()).unwrap(), kind);
        }
        for status in [EntryStatus::Settled, EntryStatus::Payable] {
            assert_eq!(EntryStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(EntryKind::try_from("transfer").is_err());
    }
}
