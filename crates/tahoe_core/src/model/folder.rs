//! Folder domain model.
//!
//! Folders are a flat grouping of notes. Removing a folder detaches its notes
//! and never deletes them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a folder.
pub type FolderId = Uuid;

/// Name used when a folder is created without a usable one.
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: 0,
            updated_at: 0,
        }
    }
}
