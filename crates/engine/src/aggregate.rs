//! Operation-level views over flat entry lists.
//!
//! Storage only knows entries. Listing and reporting want operations: one row
//! per group key with a total and a label of the accounts it touched. The
//! functions here rebuild that view without touching the database.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Entry, EntryKind, EntryStatus, Money, Page};

/// Label prefix used when an operation spans more than one account.
pub const MULTIPLE_ACCOUNTS_LABEL: &str = "Multiple accounts";

/// One logical operation, rebuilt from its entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationView {
    /// Id of the representative (first) entry.
    pub id: Uuid,
    pub group_key: String,
    pub description: String,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub total: Money,
    pub accounts_label: String,
    pub account_ids: Vec<Uuid>,
    pub category_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub fiscal_document: Option<bool>,
    pub attachments: Vec<String>,
    pub entry_count: usize,
}

impl OperationView {
    /// Signed effect of the whole operation once settled.
    pub fn signed_total(&self) -> Money {
        match self.kind {
            EntryKind::Inflow => self.total,
            EntryKind::Outflow => -self.total,
        }
    }
}

/// Label for the distinct account names touched by an operation.
///
/// ```rust
/// use engine::accounts_label;
///
/// assert_eq!(accounts_label(&["Bank".to_string()]), "Bank");
/// assert_eq!(
///     accounts_label(&["Bank".to_string(), "Cash".to_string()]),
///     "Multiple accounts (Bank, Cash)"
/// );
/// ```
pub fn accounts_label(names: &[String]) -> String {
    match names {
        [single] => single.clone(),
        _ => format!("{MULTIPLE_ACCOUNTS_LABEL} ({})", names.join(", ")),
    }
}

struct Group {
    members: Vec<Entry>,
}

impl Group {
    fn into_view(self, key: String, account_names: &HashMap<Uuid, String>) -> Option<OperationView> {
        let mut members = self.members.into_iter();
        let first = members.next()?;

        let mut total = first.amount;
        let mut account_ids = vec![first.account_id];
        let mut attachments = first.attachments.clone();
        let mut seen_attachments: HashSet<String> = attachments.iter().cloned().collect();
        let mut entry_count = 1;

        for member in members {
            total = total.saturating_add(member.amount);
            entry_count += 1;
            if !account_ids.contains(&member.account_id) {
                account_ids.push(member.account_id);
            }
            for path in member.attachments {
                if seen_attachments.insert(path.clone()) {
                    attachments.push(path);
                }
            }
        }

        let mut names: Vec<String> = Vec::with_capacity(account_ids.len());
        for id in &account_ids {
            let name = account_names
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string());
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Some(OperationView {
            id: first.id,
            group_key: key,
            description: first.description,
            date: first.date,
            kind: first.kind,
            status: first.status,
            total,
            accounts_label: accounts_label(&names),
            account_ids,
            category_id: first.category_id,
            counterparty_id: first.counterparty_id,
            fiscal_document: first.fiscal_document,
            attachments,
            entry_count,
        })
    }
}

/// Groups `entries` into operations.
///
/// Entries are partitioned by group key (falling back to their own id), each
/// group yields one [`OperationView`] whose shared fields come from its first
/// member, and the result is sorted by date descending, then representative id
/// descending.
pub fn aggregate_operations(
    entries: Vec<Entry>,
    account_names: &HashMap<Uuid, String>,
) -> Vec<OperationView> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for entry in entries {
        let key = entry.operation_key();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Group {
                    members: Vec::new(),
                }
            })
            .members
            .push(entry);
    }

    let mut views: Vec<OperationView> = order
        .into_iter()
        .filter_map(|key| {
            let group = groups.remove(&key)?;
            group.into_view(key, account_names)
        })
        .collect();

    views.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    views
}

/// Groups one page of entries into operations.
///
/// Only the entries of the fetched page are grouped, so an operation whose
/// entries straddle a page boundary shows up partially on each page. The page
/// reports `total_entries` (the size of the underlying entry query) as its
/// total.
pub fn aggregate_page(
    page_entries: Vec<Entry>,
    account_names: &HashMap<Uuid, String>,
    page: u64,
    per_page: u64,
    total_entries: u64,
) -> Page<OperationView> {
    Page {
        items: aggregate_operations(page_entries, account_names),
        total: total_entries,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn entry(account_id: Uuid, cents: i64, day: u32, group_key: Option<&str>) -> Entry {
        let mut entry = Entry::new(
            "alice".to_string(),
            account_id,
            Money::new(cents),
            EntryKind::Inflow,
            EntryStatus::Settled,
            date(day),
            "Consulting".to_string(),
        );
        entry.group_key = group_key.map(ToString::to_string);
        entry
    }

    fn names(pairs: &[(Uuid, &str)]) -> HashMap<Uuid, String> {
        pairs
            .iter()
            .map(|(id, name)| (*id, (*name).to_string()))
            .collect()
    }

    #[test]
    fn split_operation_yields_one_view_with_summed_total() {
        let bank = Uuid::new_v4();
        let cash = Uuid::new_v4();
        let entries = vec![
            entry(bank, 300_00, 5, Some("op")),
            entry(cash, 200_00, 5, Some("op")),
        ];
        let first_id = entries[0].id;

        let views = aggregate_operations(entries, &names(&[(bank, "Bank"), (cash, "Cash")]));

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.id, first_id);
        assert_eq!(view.total, Money::new(500_00));
        assert_eq!(view.accounts_label, "Multiple accounts (Bank, Cash)");
        assert_eq!(view.account_ids, vec![bank, cash]);
        assert_eq!(view.entry_count, 2);
    }

    #[test]
    fn many_entries_same_key_sum_exactly() {
        let bank = Uuid::new_v4();
        let amounts = [1, 2_50, 33_33, 99_99, 1000_00, 7];
        let entries: Vec<Entry> = amounts
            .iter()
            .map(|cents| entry(bank, *cents, 1, Some("bulk")))
            .collect();

        let views = aggregate_operations(entries, &names(&[(bank, "Bank")]));

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].total, Money::new(amounts.iter().sum()));
        assert_eq!(views[0].accounts_label, "Bank");
    }

    #[test]
    fn oversized_totals_saturate_instead_of_wrapping() {
        let bank = Uuid::new_v4();
        let entries = vec![
            entry(bank, i64::MAX - 10, 1, Some("huge")),
            entry(bank, 20, 1, Some("huge")),
        ];

        let views = aggregate_operations(entries, &names(&[(bank, "Bank")]));

        assert_eq!(views[0].total, Money::new(i64::MAX));
    }

    #[test]
    fn ungrouped_entries_are_singletons_keyed_by_id() {
        let bank = Uuid::new_v4();
        let a = entry(bank, 10_00, 1, None);
        let b = entry(bank, 20_00, 1, Some(""));
        let (a_id, b_id) = (a.id, b.id);

        let views = aggregate_operations(vec![a, b], &names(&[(bank, "Bank")]));

        assert_eq!(views.len(), 2);
        let keys: HashSet<String> = views.iter().map(|v| v.group_key.clone()).collect();
        assert!(keys.contains(&a_id.to_string()));
        assert!(keys.contains(&b_id.to_string()));
    }

    #[test]
    fn views_sorted_by_date_then_id_descending() {
        let bank = Uuid::new_v4();
        let mut old = entry(bank, 1_00, 1, None);
        let mut same_day_first = entry(bank, 2_00, 9, None);
        let mut same_day_second = entry(bank, 3_00, 9, None);
        old.id = Uuid::from_u128(3);
        same_day_first.id = Uuid::from_u128(1);
        same_day_second.id = Uuid::from_u128(2);
        let second_id = same_day_second.id;
        let first_id = same_day_first.id;
        let old_id = old.id;

        let views = aggregate_operations(
            vec![old, same_day_first, same_day_second],
            &names(&[(bank, "Bank")]),
        );

        let ids: Vec<Uuid> = views.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![second_id, first_id, old_id]);
    }

    #[test]
    fn attachments_are_unioned_without_duplicates() {
        let bank = Uuid::new_v4();
        let cash = Uuid::new_v4();
        let mut a = entry(bank, 1_00, 1, Some("op"));
        let mut b = entry(cash, 1_00, 1, Some("op"));
        a.attachments = vec!["invoice.pdf".to_string(), "p1.png".to_string()];
        b.attachments = vec!["invoice.pdf".to_string(), "p2.png".to_string()];

        let views = aggregate_operations(vec![a, b], &HashMap::new());

        assert_eq!(
            views[0].attachments,
            vec!["invoice.pdf", "p1.png", "p2.png"]
        );
    }

    #[test]
    fn unknown_account_falls_back_to_id() {
        let ghost = Uuid::new_v4();
        let views = aggregate_operations(vec![entry(ghost, 1_00, 1, None)], &HashMap::new());
        assert_eq!(views[0].accounts_label, ghost.to_string());
    }

    #[test]
    fn page_reports_entry_total() {
        let bank = Uuid::new_v4();
        let entries = vec![
            entry(bank, 1_00, 2, Some("op")),
            entry(bank, 2_00, 2, Some("op")),
            entry(bank, 3_00, 1, None),
        ];

        let page = aggregate_page(entries, &names(&[(bank, "Bank")]), 0, 3, 7);

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn view_serializes_with_snake_case_enums() {
        let bank = Uuid::new_v4();
        let views = aggregate_operations(vec![entry(bank, 12_34, 1, None)], &HashMap::new());
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["kind"], "inflow");
        assert_eq!(json["status"], "settled");
        assert_eq!(json["total"], 1234);
    }
}
