//! Entry store: persistence of entries and their attachment rows.
//!
//! Every query is scoped by the acting owner; an entry owned by somebody else
//! behaves exactly like a missing one.

use std::collections::HashMap;

use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Entry, EntryFilter, ResultEngine, attachments, entries,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

trait ApplyEntryFilters: QueryFilter + Sized {
    fn apply_entry_filters(self, filter: &EntryFilter) -> Self;
}

impl<T> ApplyEntryFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_entry_filters(mut self, filter: &EntryFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(entries::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(entries::Column::Date.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            self = self.filter(entries::Column::AccountId.eq(account_id));
        }
        if let Some(counterparty_id) = filter.counterparty_id {
            self = self.filter(entries::Column::CounterpartyId.eq(counterparty_id));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(entries::Column::CategoryId.eq(category_id));
        }
        if let Some(fiscal) = filter.fiscal_document {
            self = self.filter(entries::Column::FiscalDocument.eq(fiscal));
        }
        if let Some(needle) = normalize_optional_text(filter.description.as_deref()) {
            self = self.filter(entries::Column::Description.contains(needle));
        }
        if let Some(status) = filter.status {
            self = self.filter(entries::Column::Status.eq(status.as_str()));
        }
        self
    }
}

impl Engine {
    /// Returns one entry of `owner_id`, with its attachments.
    pub async fn entry(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            self.require_entry(&db_tx, owner_id, entry_id).await
        })
    }

    /// Returns the entries of `owner_id` matching `filter`, newest first.
    pub async fn entries(&self, owner_id: &str, filter: &EntryFilter) -> ResultEngine<Vec<Entry>> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            self.find_filtered(&db_tx, owner_id, filter).await
        })
    }

    /// Persists `entry` and one attachment row per path it carries.
    pub(super) async fn save_entry(
        &self,
        db: &DatabaseTransaction,
        entry: &Entry,
    ) -> ResultEngine<()> {
        entries::ActiveModel::from(entry).insert(db).await?;
        for path in &entry.attachments {
            attachments::ActiveModel::for_entry(entry.id, path)
                .insert(db)
                .await?;
        }
        Ok(())
    }

    /// Removes `doomed` and their attachment rows.
    pub(super) async fn delete_all(
        &self,
        db: &DatabaseTransaction,
        doomed: &[Entry],
    ) -> ResultEngine<()> {
        if doomed.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = doomed.iter().map(|entry| entry.id).collect();
        attachments::Entity::delete_many()
            .filter(attachments::Column::EntryId.is_in(ids.clone()))
            .exec(db)
            .await?;
        entries::Entity::delete_many()
            .filter(entries::Column::Id.is_in(ids))
            .exec(db)
            .await?;
        Ok(())
    }

    pub(super) async fn find_by_id(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        entry_id: Uuid,
    ) -> ResultEngine<Option<Entry>> {
        let Some(model) = entries::Entity::find_by_id(entry_id)
            .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let mut found = with_attachments(db, vec![Entry::try_from(model)?]).await?;
        Ok(found.pop())
    }

    pub(super) async fn require_entry(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        entry_id: Uuid,
    ) -> ResultEngine<Entry> {
        self.find_by_id(db, owner_id, entry_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))
    }

    /// All entries of the operation keyed `key`, oldest first.
    ///
    /// An ungrouped entry is its own operation, keyed by its id, so a key that
    /// parses as the id of such an entry resolves to that single entry.
    pub(super) async fn find_by_group_key_and_owner(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        key: &str,
    ) -> ResultEngine<Vec<Entry>> {
        let key = key.trim();
        let mut models = entries::Entity::find()
            .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
            .filter(entries::Column::GroupKey.eq(key))
            .order_by_asc(entries::Column::Id)
            .all(db)
            .await?;

        if models.is_empty()
            && let Ok(id) = Uuid::parse_str(key)
            && let Some(model) = entries::Entity::find_by_id(id)
                .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
                .one(db)
                .await?
            && model
                .group_key
                .as_deref()
                .is_none_or(|group| group.trim().is_empty())
        {
            models.push(model);
        }

        let found = models
            .into_iter()
            .map(Entry::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        with_attachments(db, found).await
    }

    /// Entries matching `filter`, ordered by date desc, then id desc.
    pub(super) async fn find_filtered(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        filter: &EntryFilter,
    ) -> ResultEngine<Vec<Entry>> {
        let models = entries::Entity::find()
            .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
            .apply_entry_filters(filter)
            .order_by_desc(entries::Column::Date)
            .order_by_desc(entries::Column::Id)
            .all(db)
            .await?;
        let found = models
            .into_iter()
            .map(Entry::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        with_attachments(db, found).await
    }

    /// One zero-based page of [`Engine::find_filtered`], plus the total number
    /// of matching entries.
    pub(super) async fn find_filtered_page(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        filter: &EntryFilter,
        page: u64,
        per_page: u64,
    ) -> ResultEngine<(Vec<Entry>, u64)> {
        if per_page == 0 {
            return Err(EngineError::Validation(
                "per_page must be positive".to_string(),
            ));
        }
        let paginator = entries::Entity::find()
            .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
            .apply_entry_filters(filter)
            .order_by_desc(entries::Column::Date)
            .order_by_desc(entries::Column::Id)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;
        let found = models
            .into_iter()
            .map(Entry::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok((with_attachments(db, found).await?, total))
    }
}

/// Fills `attachments` of every entry, preserving stored order.
async fn with_attachments(
    db: &DatabaseTransaction,
    mut found: Vec<Entry>,
) -> ResultEngine<Vec<Entry>> {
    if found.is_empty() {
        return Ok(found);
    }
    let ids: Vec<Uuid> = found.iter().map(|entry| entry.id).collect();
    let rows = attachments::Entity::find()
        .filter(attachments::Column::EntryId.is_in(ids))
        .order_by_asc(attachments::Column::Id)
        .all(db)
        .await?;

    let mut by_entry: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        by_entry.entry(row.entry_id).or_default().push(row.path);
    }
    for entry in &mut found {
        entry.attachments = by_entry.remove(&entry.id).unwrap_or_default();
    }
    Ok(found)
}
