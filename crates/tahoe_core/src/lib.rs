//! Core domain logic for Tahoe Notes.
//! This crate is the single source of truth for note, link and task rules.

pub mod db;
pub mod graph;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod store;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use graph::{
    build_graph, extract_links, hit_test, radial_layout, GraphNode, NoteGraph, NoteLink, Point,
};
pub use logging::{default_log_level, init_logging, log_dir_for, logging_status, LoggingError};
pub use markdown::tasks::{collect_tasks, extract_tasks, toggle_task_line, GlobalTask};
pub use markdown::{
    parse_blocks, render_document, resolve_inline, ContentBlock, InlineStyle, RenderedBlock,
    StyledRun, StyledText,
};
pub use model::folder::{Folder, FolderId};
pub use model::note::{Note, NoteId};
pub use repo::note_repo::{RepoError, RepoResult};
pub use service::folder_service::{FolderService, FolderServiceError};
pub use service::interchange::{export_file_name, InterchangeError};
pub use service::note_service::{NoteService, NoteServiceError};
pub use settings::{AccentColor, AppSettings, Language, SettingsError, Theme};
pub use store::{NoteStore, NoteTreeNode, StoreError, StoreEvent, StoreResult, SubscriptionId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
