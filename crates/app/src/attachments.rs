use std::{
    fs,
    path::{Path, PathBuf},
};

use engine::{AttachmentStore, EngineError, UploadedFile};
use uuid::Uuid;

/// Stores uploads under `<root>/<owner>/<uuid>-<file name>`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AttachmentStore for DirectoryStore {
    fn store(&self, owner_id: &str, file: &UploadedFile) -> Result<Vec<String>, EngineError> {
        let dir = self.root.join(sanitize(owner_id));
        fs::create_dir_all(&dir).map_err(|err| EngineError::Attachment(err.to_string()))?;

        let target = dir.join(format!("{}-{}", Uuid::new_v4(), sanitize(&file.file_name)));
        fs::write(&target, &file.bytes).map_err(|err| EngineError::Attachment(err.to_string()))?;
        tracing::debug!(path = %target.display(), bytes = file.bytes.len(), "attachment stored");
        Ok(vec![target.display().to_string()])
    }
}

/// Keeps the last path component and replaces anything unusual in it.
fn sanitize(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
