//! Application-facing note store.
//!
//! # Responsibility
//! - Own the database connection and the data directory layout.
//! - Route every mutation through the services and notify subscribers.
//! - Re-derive tasks, graph and tree views from current notes on demand.
//!
//! # Invariants
//! - Subscribers are notified only after a mutation has been persisted.
//! - Derived views are never cached.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::graph::{build_graph, NoteGraph};
use crate::markdown::tasks::{collect_tasks, GlobalTask};
use crate::markdown::{render_document, RenderedBlock};
use crate::model::folder::{Folder, FolderId};
use crate::model::note::{Note, NoteId};
use crate::repo::folder_repo::SqliteFolderRepository;
use crate::repo::note_repo::{RepoError, SqliteNoteRepository};
use crate::service::folder_service::{FolderService, FolderServiceError};
use crate::service::interchange::{self, InterchangeError};
use crate::service::note_service::{NoteService, NoteServiceError};
use crate::settings::{self, AppSettings, SettingsError};
use log::debug;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "tahoe.db";

/// Change notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    NoteCreated(Note),
    NoteUpdated(Note),
    /// Deleted note ids, the requested note first.
    NotesDeleted(Vec<NoteId>),
    FolderCreated(Folder),
    FolderUpdated(Folder),
    FolderDeleted { id: FolderId, detached_notes: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&StoreEvent)>;

/// A note with its nested children, in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTreeNode {
    pub note: Note,
    pub children: Vec<NoteTreeNode>,
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
    Note(NoteServiceError),
    Folder(FolderServiceError),
    Interchange(InterchangeError),
    Settings(SettingsError),
    /// The operation needs a data directory but the store is in-memory.
    NoDataDir,
    CreateDataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Note(err) => write!(f, "{err}"),
            Self::Folder(err) => write!(f, "{err}"),
            Self::Interchange(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::NoDataDir => write!(f, "store has no data directory"),
            Self::CreateDataDir { path, source } => write!(
                f,
                "failed to create data directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Note(err) => Some(err),
            Self::Folder(err) => Some(err),
            Self::Interchange(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::NoDataDir => None,
            Self::CreateDataDir { source, .. } => Some(source),
        }
    }
}

macro_rules! store_error_from {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$source> for StoreError {
            fn from(value: $source) -> Self {
                Self::$variant(value)
            }
        })+
    };
}

store_error_from! {
    DbError => Db,
    RepoError => Repo,
    NoteServiceError => Note,
    FolderServiceError => Folder,
    InterchangeError => Interchange,
    SettingsError => Settings,
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct NoteStore {
    conn: Connection,
    data_dir: Option<PathBuf>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl NoteStore {
    /// Opens (creating if needed) the store rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|source| StoreError::CreateDataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let conn = open_db(data_dir.join(DATABASE_FILE_NAME))?;
        Ok(Self::with_connection(conn, Some(data_dir.to_path_buf())))
    }

    /// Opens a transient store with no data directory.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::with_connection(open_db_in_memory()?, None))
    }

    fn with_connection(conn: Connection, data_dir: Option<PathBuf>) -> Self {
        Self {
            conn,
            data_dir,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn subscribe(&mut self, callback: impl Fn(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns whether a subscription with `id` was removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn emit(&self, event: StoreEvent) {
        debug!(
            "event=store_emit module=store status=ok subscribers={}",
            self.subscribers.len()
        );
        for (_, callback) in &self.subscribers {
            callback(&event);
        }
    }

    fn notes(&self) -> StoreResult<NoteService<SqliteNoteRepository<'_>>> {
        Ok(NoteService::new(SqliteNoteRepository::try_new(&self.conn)?))
    }

    fn folders(&self) -> StoreResult<FolderService<SqliteFolderRepository<'_>>> {
        Ok(FolderService::new(SqliteFolderRepository::try_new(
            &self.conn,
        )?))
    }

    fn require_data_dir(&self) -> StoreResult<&Path> {
        self.data_dir.as_deref().ok_or(StoreError::NoDataDir)
    }

    fn created(&self, note: Note) -> Note {
        self.emit(StoreEvent::NoteCreated(note.clone()));
        note
    }

    fn updated(&self, note: Note) -> Note {
        self.emit(StoreEvent::NoteUpdated(note.clone()));
        note
    }

    // Notes

    pub fn create_note(
        &self,
        title: &str,
        content: &str,
        parent_id: Option<NoteId>,
        folder_id: Option<FolderId>,
    ) -> StoreResult<Note> {
        let note = self
            .notes()?
            .create_note(title, content, parent_id, folder_id)?;
        Ok(self.created(note))
    }

    pub fn create_root_note(&self) -> StoreResult<Note> {
        let note = self.notes()?.create_root_note()?;
        Ok(self.created(note))
    }

    pub fn create_subnote(&self, parent_id: NoteId, title: &str) -> StoreResult<Note> {
        let note = self.notes()?.create_subnote(parent_id, title)?;
        Ok(self.created(note))
    }

    pub fn note(&self, id: NoteId) -> StoreResult<Note> {
        Ok(self.notes()?.require_note(id)?)
    }

    pub fn list_notes(&self) -> StoreResult<Vec<Note>> {
        Ok(self.notes()?.list_notes()?)
    }

    pub fn root_notes(&self) -> StoreResult<Vec<Note>> {
        Ok(self.notes()?.root_notes()?)
    }

    pub fn children(&self, parent_id: NoteId) -> StoreResult<Vec<Note>> {
        Ok(self.notes()?.children(parent_id)?)
    }

    pub fn notes_in_folder(&self, folder_id: FolderId) -> StoreResult<Vec<Note>> {
        Ok(self.notes()?.notes_in_folder(folder_id)?)
    }

    pub fn note_preview(&self, id: NoteId) -> StoreResult<String> {
        Ok(self.notes()?.note_preview(id)?)
    }

    pub fn rename_note(&self, id: NoteId, title: &str) -> StoreResult<Note> {
        let note = self.notes()?.rename_note(id, title)?;
        Ok(self.updated(note))
    }

    pub fn update_content(&self, id: NoteId, content: &str) -> StoreResult<Note> {
        let note = self.notes()?.update_content(id, content)?;
        Ok(self.updated(note))
    }

    pub fn move_note(&self, id: NoteId, new_parent_id: Option<NoteId>) -> StoreResult<Note> {
        let note = self.notes()?.move_note(id, new_parent_id)?;
        Ok(self.updated(note))
    }

    pub fn set_folder(&self, id: NoteId, folder_id: Option<FolderId>) -> StoreResult<Note> {
        let note = self.notes()?.set_folder(id, folder_id)?;
        Ok(self.updated(note))
    }

    pub fn delete_note(&self, id: NoteId) -> StoreResult<Vec<NoteId>> {
        let deleted = self.notes()?.delete_note(id)?;
        self.emit(StoreEvent::NotesDeleted(deleted.clone()));
        Ok(deleted)
    }

    pub fn toggle_task(&self, id: NoteId, line_index: usize) -> StoreResult<Note> {
        let service = self.notes()?;
        let before = service.require_note(id)?;
        let note = service.toggle_task(id, line_index)?;
        if note.content == before.content {
            return Ok(note);
        }
        Ok(self.updated(note))
    }

    // Folders

    pub fn create_folder(&self, name: &str) -> StoreResult<Folder> {
        let folder = self.folders()?.create_folder(name)?;
        self.emit(StoreEvent::FolderCreated(folder.clone()));
        Ok(folder)
    }

    pub fn rename_folder(&self, id: FolderId, name: &str) -> StoreResult<Folder> {
        let folder = self.folders()?.rename_folder(id, name)?;
        self.emit(StoreEvent::FolderUpdated(folder.clone()));
        Ok(folder)
    }

    pub fn folder(&self, id: FolderId) -> StoreResult<Folder> {
        Ok(self.folders()?.require_folder(id)?)
    }

    pub fn list_folders(&self) -> StoreResult<Vec<Folder>> {
        Ok(self.folders()?.list_folders()?)
    }

    pub fn delete_folder(&self, id: FolderId) -> StoreResult<usize> {
        let detached_notes = self.folders()?.delete_folder(id)?;
        self.emit(StoreEvent::FolderDeleted { id, detached_notes });
        Ok(detached_notes)
    }

    // Files

    pub fn import_markdown(&self, path: &Path) -> StoreResult<Note> {
        let note = interchange::import_markdown_file(&self.notes()?, path)?;
        Ok(self.created(note))
    }

    pub fn export_markdown(&self, id: NoteId, destination: &Path) -> StoreResult<()> {
        interchange::export_markdown_file(&self.notes()?, id, destination)?;
        Ok(())
    }

    /// Copies an image into the assets directory and references it from the
    /// note. Returns the updated note and the relative image path.
    pub fn attach_image(&self, id: NoteId, source: &Path) -> StoreResult<(Note, String)> {
        let data_dir = self.require_data_dir()?;
        let (note, relative) = interchange::attach_image(&self.notes()?, id, source, data_dir)?;
        Ok((self.updated(note), relative))
    }

    // Derived views

    pub fn tasks(&self) -> StoreResult<Vec<GlobalTask>> {
        Ok(collect_tasks(&self.list_notes()?))
    }

    pub fn graph(&self, width: f64, height: f64) -> StoreResult<NoteGraph> {
        Ok(build_graph(&self.list_notes()?, width, height))
    }

    pub fn render_note(&self, id: NoteId) -> StoreResult<Vec<RenderedBlock>> {
        Ok(render_document(&self.note(id)?.content))
    }

    /// Root notes with their descendants nested beneath them.
    pub fn note_tree(&self) -> StoreResult<Vec<NoteTreeNode>> {
        let notes = self.list_notes()?;
        let mut children_of: HashMap<Option<NoteId>, Vec<Note>> = HashMap::new();
        for note in notes {
            children_of.entry(note.parent_id).or_default().push(note);
        }
        let mut visited = HashSet::new();
        Ok(build_tree_level(&mut children_of, None, &mut visited))
    }

    // Settings

    /// Current settings; defaults for an in-memory store.
    pub fn settings(&self) -> AppSettings {
        match self.data_dir.as_deref() {
            Some(dir) => settings::load_settings(dir),
            None => AppSettings::default(),
        }
    }

    pub fn save_settings(&self, value: &AppSettings) -> StoreResult<()> {
        settings::save_settings(self.require_data_dir()?, value)?;
        Ok(())
    }
}

fn build_tree_level(
    children_of: &mut HashMap<Option<NoteId>, Vec<Note>>,
    parent: Option<NoteId>,
    visited: &mut HashSet<NoteId>,
) -> Vec<NoteTreeNode> {
    let Some(level) = children_of.remove(&parent) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(level.len());
    for note in level {
        if !visited.insert(note.id) {
            continue;
        }
        let children = build_tree_level(children_of, Some(note.id), visited);
        nodes.push(NoteTreeNode { note, children });
    }
    nodes
}
