//! Attachments linked to ledger entries.
//!
//! File storage itself is delegated to an [`AttachmentStore`]. The engine only
//! keeps the returned references, one row per `(entry, path)`.

use std::fmt::Debug;

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::ResultEngine;

/// A file uploaded together with an operation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Storage backend for uploaded files.
///
/// A single upload may expand into several stored artifacts (for example one
/// per page), so `store` returns every stored path.
pub trait AttachmentStore: Debug + Send + Sync {
    fn store(&self, owner_id: &str, file: &UploadedFile) -> ResultEngine<Vec<String>>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entry_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    pub path: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entries::Entity",
        from = "Column::EntryId",
        to = "super::entries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Entry,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_entry(entry_id: Uuid, path: &str) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::now_v7()),
            entry_id: ActiveValue::Set(entry_id),
            path: ActiveValue::Set(path.to_string()),
        }
    }
}
