//! The module contains `Account` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Entry, Money};

/// An account.
///
/// An account is a named monetary balance owned by one user: a bank account,
/// a cash drawer, a card. Its `balance` always equals `initial_balance` plus
/// the signed effect of every settled entry posted against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier for this account.
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    /// Free-form label such as "bank", "cash" or "card".
    pub kind_label: String,
    pub initial_balance: Money,
    pub balance: Money,
    /// Bumped on every balance change.
    pub version: i64,
}

impl Account {
    pub fn new(owner_id: String, name: String, kind_label: String, initial_balance: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            kind_label,
            initial_balance,
            balance: initial_balance,
            version: 0,
        }
    }

    /// Balance derived from the opening amount and the given entries.
    ///
    /// Only settled entries posted against this account contribute.
    pub fn derived_balance<'a>(&self, entries: impl IntoIterator<Item = &'a Entry>) -> Money {
        self.initial_balance
            + entries
                .into_iter()
                .filter(|entry| entry.account_id == self.id && entry.is_settled())
                .map(Entry::signed_effect)
                .sum::<Money>()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind_label: String,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(
        belongs_to = "super::owners::Entity",
        from = "Column::OwnerId",
        to = "super::owners::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(value.name.to_lowercase()),
            kind_label: ActiveValue::Set(value.kind_label.clone()),
            initial_balance_minor: ActiveValue::Set(value.initial_balance.cents()),
            balance_minor: ActiveValue::Set(value.balance.cents()),
            version: ActiveValue::Set(value.version),
        }
    }
}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            kind_label: model.kind_label,
            initial_balance: Money::new(model.initial_balance_minor),
            balance: Money::new(model.balance_minor),
            version: model.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{EntryKind, EntryStatus};

    fn entry(account_id: Uuid, cents: i64, kind: EntryKind, status: EntryStatus) -> Entry {
        let mut entry = Entry::new(
            "alice".to_string(),
            account_id,
            Money::new(cents),
            kind,
            status,
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            "test".to_string(),
        );
        entry.group_key = Some("g".to_string());
        entry
    }

    #[test]
    fn new_account_starts_at_initial_balance() {
        let account = Account::new(
            "alice".to_string(),
            "Bank".to_string(),
            "bank".to_string(),
            Money::new(1000_00),
        );
        assert_eq!(account.balance, Money::new(1000_00));
        assert_eq!(account.version, 0);
    }

    #[test]
    fn derived_balance_ignores_payable_and_foreign_entries() {
        let account = Account::new(
            "alice".to_string(),
            "Bank".to_string(),
            "bank".to_string(),
            Money::new(1000_00),
        );
        let other = Uuid::new_v4();
        let entries = vec![
            entry(account.id, 150_55, EntryKind::Outflow, EntryStatus::Settled),
            entry(account.id, 20_00, EntryKind::Inflow, EntryStatus::Settled),
            entry(account.id, 999_00, EntryKind::Outflow, EntryStatus::Payable),
            entry(other, 5_00, EntryKind::Inflow, EntryStatus::Settled),
        ];

        assert_eq!(account.derived_balance(&entries), Money::new(869_45));
    }
}
