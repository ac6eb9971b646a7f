//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/rename/edit/move/delete APIs and relationship queries.
//! - Apply the task toggle to persisted content.
//!
//! # Invariants
//! - Titles are trimmed; blank titles fall back to `New note` on create and are
//!   rejected on rename.
//! - A sub-note created without an explicit folder inherits its parent's.
//! - Move operations must not create parent-child cycles.

use crate::markdown::content_preview;
use crate::markdown::tasks::toggle_task_line;
use crate::model::folder::FolderId;
use crate::model::note::{Note, NoteId, DEFAULT_NOTE_TITLE};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, NoteScope, RepoError, RepoResult};
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Character count of [`NoteService::note_preview`] output.
pub const NOTE_PREVIEW_CHARS: usize = 100;

/// Content given to notes created through [`NoteService::create_root_note`].
pub const ROOT_NOTE_CONTENT: &str = "# New note";

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    NoteNotFound(NoteId),
    ParentNotFound(NoteId),
    FolderNotFound(FolderId),
    /// Re-parenting would make a note its own ancestor.
    CycleDetected {
        note_id: NoteId,
        parent_id: NoteId,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "note title must not be blank"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent note not found: {id}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::CycleDetected { note_id, parent_id } => write!(
                f,
                "move would create cycle: note {note_id} under parent {parent_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            RepoError::FolderNotFound(id) => Self::FolderNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note.
    ///
    /// When `parent_id` is set and `folder_id` is not, the parent's folder is
    /// inherited.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        parent_id: Option<NoteId>,
        folder_id: Option<FolderId>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = Note::new(title_or_default(title.into()), content);

        let inherited_folder = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .repo
                    .get_note(parent_id)?
                    .ok_or(NoteServiceError::ParentNotFound(parent_id))?;
                parent.folder_id
            }
            None => None,
        };
        if let Some(folder_id) = folder_id {
            self.ensure_folder_exists(folder_id)?;
        }

        note.parent_id = parent_id;
        note.folder_id = folder_id.or(inherited_folder);

        let id = self.repo.create_note(&note)?;
        info!(
            "event=note_create module=service status=ok nested={} foldered={}",
            note.parent_id.is_some(),
            note.folder_id.is_some()
        );
        self.read_back(id, "created note not found in read-back")
    }

    /// Creates the default root note used by the "new note" action.
    pub fn create_root_note(&self) -> Result<Note, NoteServiceError> {
        self.create_note(DEFAULT_NOTE_TITLE, ROOT_NOTE_CONTENT, None, None)
    }

    /// Creates an empty sub-note under `parent_id`.
    pub fn create_subnote(
        &self,
        parent_id: NoteId,
        title: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        self.create_note(title, "", Some(parent_id), None)
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_note(id)
    }

    /// Like [`Self::get_note`], but a missing note is an error.
    pub fn require_note(&self, id: NoteId) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Short plain-text preview of the note's content.
    pub fn note_preview(&self, id: NoteId) -> Result<String, NoteServiceError> {
        let note = self.require_note(id)?;
        Ok(content_preview(&note.content, NOTE_PREVIEW_CHARS))
    }

    pub fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.list(NoteScope::All)
    }

    /// Notes without a parent, in creation order.
    pub fn root_notes(&self) -> RepoResult<Vec<Note>> {
        self.list(NoteScope::Roots)
    }

    /// Direct children of `parent_id`, in creation order.
    pub fn children(&self, parent_id: NoteId) -> Result<Vec<Note>, NoteServiceError> {
        self.require_note(parent_id)?;
        Ok(self.list(NoteScope::ChildrenOf(parent_id))?)
    }

    pub fn notes_in_folder(&self, folder_id: FolderId) -> Result<Vec<Note>, NoteServiceError> {
        self.ensure_folder_exists(folder_id)?;
        Ok(self.list(NoteScope::InFolder(folder_id))?)
    }

    pub fn rename_note(
        &self,
        id: NoteId,
        title: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let title = normalize_title(title.into())?;
        let mut note = self.require_note(id)?;
        note.title = title;
        self.repo.update_note(&note)?;
        self.read_back(id, "renamed note not found in read-back")
    }

    /// Replaces note content fully.
    pub fn update_content(
        &self,
        id: NoteId,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let content = content.into();
        self.repo.update_content(id, &content)?;
        debug!(
            "event=note_update module=service status=ok content_bytes={}",
            content.len()
        );
        self.read_back(id, "updated note not found in read-back")
    }

    /// Appends text to the end of the note's content.
    pub fn append_content(&self, id: NoteId, suffix: &str) -> Result<Note, NoteServiceError> {
        let note = self.require_note(id)?;
        self.update_content(id, format!("{}{suffix}", note.content))
    }

    /// Moves a note under `new_parent_id`, or to the root when `None`.
    pub fn move_note(
        &self,
        id: NoteId,
        new_parent_id: Option<NoteId>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require_note(id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id || self.would_create_cycle(id, parent_id)? {
                return Err(NoteServiceError::CycleDetected {
                    note_id: id,
                    parent_id,
                });
            }
        }

        note.parent_id = new_parent_id;
        self.repo.update_note(&note)?;
        info!(
            "event=note_move module=service status=ok to_root={}",
            new_parent_id.is_none()
        );
        self.read_back(id, "moved note not found in read-back")
    }

    /// Assigns the note to a folder, or clears its folder when `None`.
    pub fn set_folder(
        &self,
        id: NoteId,
        folder_id: Option<FolderId>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require_note(id)?;
        if let Some(folder_id) = folder_id {
            self.ensure_folder_exists(folder_id)?;
        }
        note.folder_id = folder_id;
        self.repo.update_note(&note)?;
        self.read_back(id, "note missing after folder change")
    }

    /// Deletes the note and all of its descendants.
    pub fn delete_note(&self, id: NoteId) -> Result<Vec<NoteId>, NoteServiceError> {
        let deleted = self.repo.delete_note_cascade(id)?;
        info!(
            "event=note_delete module=service status=ok deleted_count={}",
            deleted.len()
        );
        Ok(deleted)
    }

    /// Flips the task marker on `line_index` of the note's current content.
    pub fn toggle_task(&self, id: NoteId, line_index: usize) -> Result<Note, NoteServiceError> {
        let note = self.require_note(id)?;
        let toggled = toggle_task_line(&note.content, line_index);
        if toggled == note.content {
            debug!("event=task_toggle module=service status=noop line_index={line_index}");
            return Ok(note);
        }
        self.update_content(id, toggled)
    }

    fn list(&self, scope: NoteScope) -> RepoResult<Vec<Note>> {
        self.repo.list_notes(&NoteListQuery { scope })
    }

    fn ensure_folder_exists(&self, folder_id: FolderId) -> Result<(), NoteServiceError> {
        if self.repo.folder_exists(folder_id)? {
            Ok(())
        } else {
            Err(NoteServiceError::FolderNotFound(folder_id))
        }
    }

    fn read_back(&self, id: NoteId, details: &'static str) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }

    fn would_create_cycle(
        &self,
        note_id: NoteId,
        candidate_parent_id: NoteId,
    ) -> Result<bool, NoteServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == note_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let node = self
                .repo
                .get_note(current)?
                .ok_or(NoteServiceError::ParentNotFound(current))?;
            cursor = node.parent_id;
        }
        Ok(false)
    }
}

fn title_or_default(value: String) -> String {
    normalize_title(value).unwrap_or_else(|_| DEFAULT_NOTE_TITLE.to_string())
}

fn normalize_title(value: String) -> Result<String, NoteServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NoteServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
