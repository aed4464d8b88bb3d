//! Operation orchestration: create, edit, delete and settle grouped entries.
//!
//! Each public method runs in one transaction. Balance effects of settled
//! entries are reversed before their rows are removed and applied after new
//! rows are written, so an edit that changes nothing leaves balances intact.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Entry, EntryStatus, Money, OperationForm, PaymentLine, ResultEngine,
    UploadedFile, entries,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a new operation, or replaces the one named by `form.group_key`.
    ///
    /// Creating counts against the owner's monthly cap; editing never does.
    /// A `group_key` with no stored entries is treated as an edit too, so it
    /// skips the cap check; the recreated entries are stamped as created now
    /// and count toward the current month from then on. Edited entries keep
    /// the creation time of the operation they replace.
    /// Lines missing an account or an amount are skipped. Uploaded files are
    /// stored through the configured [`crate::AttachmentStore`] and shared by
    /// every entry of the operation, together with `form.existing_attachments`.
    ///
    /// Returns the operation's group key.
    pub async fn create_or_update(
        &self,
        owner_id: &str,
        form: &OperationForm,
        uploads: &[UploadedFile],
    ) -> ResultEngine<String> {
        let description = form.description.trim().to_string();
        if description.is_empty() {
            return Err(EngineError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        let lines: Vec<(Uuid, Money)> = form.complete_lines().collect();
        if lines.is_empty() {
            return Err(EngineError::Validation(
                "operation needs at least one payment line".to_string(),
            ));
        }
        if let Some((_, amount)) = lines.iter().find(|(_, amount)| !amount.is_positive()) {
            return Err(EngineError::InvalidAmount(format!(
                "{amount}: amount must be > 0"
            )));
        }
        if let Some((_, amount)) = lines.iter().find(|(_, amount)| *amount > Money::MAX_AMOUNT) {
            return Err(EngineError::InvalidAmount(format!(
                "{amount}: amount must be <= {}",
                Money::MAX_AMOUNT
            )));
        }

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (group_key, created_at, is_edit) = match form.edited_group_key() {
                Some(key) => {
                    self.require_owner(&db_tx, owner_id).await?;
                    let created_at = self
                        .discard_operation(&db_tx, owner_id, key)
                        .await?
                        .unwrap_or(now);
                    (key.to_string(), created_at, true)
                }
                None => {
                    self.ensure_within_plan_cap(&db_tx, owner_id, now.date_naive())
                        .await?;
                    (Uuid::now_v7().to_string(), now, false)
                }
            };

            self.require_references(&db_tx, owner_id, form.category_id, form.counterparty_id)
                .await?;
            for (account_id, _) in &lines {
                self.require_account(&db_tx, owner_id, *account_id).await?;
            }

            let attachments = self.collect_attachments(owner_id, form, uploads)?;

            let mut created = Vec::with_capacity(lines.len());
            for (account_id, amount) in &lines {
                let mut entry = Entry::new(
                    owner_id.to_string(),
                    *account_id,
                    *amount,
                    form.kind,
                    form.status,
                    form.date,
                    description.clone(),
                );
                entry.category_id = form.category_id;
                entry.counterparty_id = form.counterparty_id;
                entry.fiscal_document = form.fiscal_document;
                entry.group_key = Some(group_key.clone());
                entry.attachments = attachments.clone();
                entry.created_at = created_at;
                self.save_entry(&db_tx, &entry).await?;
                created.push(entry);
            }

            for entry in &created {
                self.apply_entry(&db_tx, entry).await?;
            }

            tracing::info!(
                owner = owner_id,
                operation = %group_key,
                entries = created.len(),
                edit = is_edit,
                "operation saved"
            );
            Ok(group_key)
        })
    }

    /// Rebuilds the form of the operation `entry_id` belongs to.
    ///
    /// Shared fields come from the first entry of the operation; each entry
    /// contributes one payment line.
    pub async fn load_for_edit(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<OperationForm> {
        with_tx!(self, |db_tx| {
            let entry = self.require_entry(&db_tx, owner_id, entry_id).await?;
            let group_key = entry.operation_key();
            let siblings = self.siblings_of(&db_tx, owner_id, entry).await?;
            let Some(first) = siblings.first() else {
                return Err(EngineError::KeyNotFound("entry not exists".to_string()));
            };

            let mut form = OperationForm::new(
                first.description.clone(),
                first.date,
                first.kind,
                first.status,
            )
            .group_key(group_key);
            form.category_id = first.category_id;
            form.counterparty_id = first.counterparty_id;
            form.fiscal_document = first.fiscal_document;
            for sibling in &siblings {
                form.lines
                    .push(PaymentLine::new(sibling.account_id, sibling.amount));
                for path in &sibling.attachments {
                    if !form.existing_attachments.contains(path) {
                        form.existing_attachments.push(path.clone());
                    }
                }
            }
            Ok(form)
        })
    }

    /// Deletes the whole operation `entry_id` belongs to, reversing the
    /// balance effect of its settled entries. Returns the number of entries
    /// removed.
    pub async fn delete_operation(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let entry = self.require_entry(&db_tx, owner_id, entry_id).await?;
            let group_key = entry.operation_key();
            let siblings = self.siblings_of(&db_tx, owner_id, entry).await?;
            for sibling in &siblings {
                self.reverse_entry(&db_tx, sibling).await?;
            }
            self.delete_all(&db_tx, &siblings).await?;
            tracing::info!(
                owner = owner_id,
                operation = %group_key,
                entries = siblings.len(),
                "operation deleted"
            );
            Ok(siblings.len())
        })
    }

    /// Marks a payable entry as settled and applies its balance effect.
    ///
    /// Settling an entry that is already settled changes nothing. Returns
    /// whether the entry changed.
    pub async fn settle_entry(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let entry = self.require_entry(&db_tx, owner_id, entry_id).await?;
            self.settle(&db_tx, entry).await
        })
    }

    /// Settles every payable entry of the operation `entry_id` belongs to.
    /// Returns how many entries changed.
    pub async fn settle_operation(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let entry = self.require_entry(&db_tx, owner_id, entry_id).await?;
            let siblings = self.siblings_of(&db_tx, owner_id, entry).await?;
            let mut settled = 0;
            for sibling in siblings {
                if self.settle(&db_tx, sibling).await? {
                    settled += 1;
                }
            }
            Ok(settled)
        })
    }

    async fn settle(&self, db: &DatabaseTransaction, mut entry: Entry) -> ResultEngine<bool> {
        if entry.is_settled() {
            tracing::debug!(entry = %entry.id, "entry already settled");
            return Ok(false);
        }
        let active = entries::ActiveModel {
            id: ActiveValue::Set(entry.id),
            status: ActiveValue::Set(EntryStatus::Settled.as_str().to_string()),
            ..Default::default()
        };
        active.update(db).await?;
        entry.status = EntryStatus::Settled;
        self.apply_entry(db, &entry).await?;
        tracing::info!(owner = %entry.owner_id, entry = %entry.id, "entry settled");
        Ok(true)
    }

    /// Reverses and removes the entries of an edited operation, returning the
    /// earliest creation time among them. An unknown key has nothing to
    /// reverse.
    async fn discard_operation(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        group_key: &str,
    ) -> ResultEngine<Option<DateTime<Utc>>> {
        let existing = self
            .find_by_group_key_and_owner(db, owner_id, group_key)
            .await?;
        if existing.is_empty() {
            tracing::debug!(owner = owner_id, operation = group_key, "edited operation has no entries");
        }
        for entry in &existing {
            self.reverse_entry(db, entry).await?;
        }
        self.delete_all(db, &existing).await?;
        Ok(existing.iter().map(|entry| entry.created_at).min())
    }

    /// Entries of the operation `entry` belongs to, `entry` included.
    async fn siblings_of(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        entry: Entry,
    ) -> ResultEngine<Vec<Entry>> {
        match entry.explicit_group_key() {
            Some(key) => self.find_by_group_key_and_owner(db, owner_id, key).await,
            None => Ok(vec![entry]),
        }
    }

    fn collect_attachments(
        &self,
        owner_id: &str,
        form: &OperationForm,
        uploads: &[UploadedFile],
    ) -> ResultEngine<Vec<String>> {
        let mut paths: Vec<String> = Vec::new();
        let kept = form
            .existing_attachments
            .iter()
            .map(|path| path.trim())
            .filter(|path| !path.is_empty());
        for path in kept {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }

        if uploads.is_empty() {
            return Ok(paths);
        }
        let store = self.attachments.as_ref().ok_or_else(|| {
            EngineError::Attachment("no attachment store configured".to_string())
        })?;
        for file in uploads {
            for path in store.store(owner_id, file)? {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        Ok(paths)
    }
}
