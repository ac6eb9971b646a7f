//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and relationship queries over the `notes` table.
//! - Own the cascade rule: deleting a note removes its whole subtree.
//!
//! # Invariants
//! - Listing order is creation order (`created_at ASC, rowid ASC`).
//! - Subtree walks terminate even if persisted data contains a cycle.

use crate::db::DbError;
use crate::model::folder::FolderId;
use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::repo::{parse_uuid_column, table_exists};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    parent_uuid,
    folder_uuid,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for note/folder persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NoteNotFound(NoteId),
    FolderNotFound(FolderId),
    /// Required table is missing; the connection was not migrated.
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NoteNotFound(_) => None,
            Self::FolderNotFound(_) => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which slice of the note set a list query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteScope {
    #[default]
    All,
    /// Notes without a parent.
    Roots,
    /// Direct children of one note.
    ChildrenOf(NoteId),
    /// Notes assigned to one folder, at any depth.
    InFolder(FolderId),
}

/// Query options for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub scope: NoteScope,
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts one note and returns its stable id.
    fn create_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Replaces title, content, parent and folder of an existing note.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Replaces content only.
    fn update_content(&self, id: NoteId, content: &str) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    fn delete_note_cascade(&self, id: NoteId) -> RepoResult<Vec<NoteId>>;
    /// Returns whether the folder exists.
    fn folder_exists(&self, id: FolderId) -> RepoResult<bool>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["notes", "folders"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                title,
                content,
                parent_uuid,
                folder_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.parent_id.map(|value| value.to_string()),
                note.folder_id.map(|value| value.to_string()),
            ],
        )?;

        Ok(note.id)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                parent_uuid = ?4,
                folder_uuid = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.parent_id.map(|value| value.to_string()),
                note.folder_id.map(|value| value.to_string()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(note.id));
        }
        Ok(())
    }

    fn update_content(&self, id: NoteId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), content],
        )?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let (filter, bind_value) = match query.scope {
            NoteScope::All => ("", None),
            NoteScope::Roots => ("WHERE parent_uuid IS NULL", None),
            NoteScope::ChildrenOf(parent_id) => {
                ("WHERE parent_uuid = ?1", Some(parent_id.to_string()))
            }
            NoteScope::InFolder(folder_id) => {
                ("WHERE folder_uuid = ?1", Some(folder_id.to_string()))
            }
        };

        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} {filter} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = match bind_value {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };

        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn delete_note_cascade(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let subtree = list_subtree_ids(&tx, id)?;
        if subtree.is_empty() {
            return Err(RepoError::NoteNotFound(id));
        }

        tx.execute(
            "WITH RECURSIVE subtree(uuid) AS (
                SELECT uuid FROM notes WHERE uuid = ?1
                UNION
                SELECT child.uuid
                FROM notes child
                INNER JOIN subtree parent ON child.parent_uuid = parent.uuid
            )
            DELETE FROM notes
            WHERE uuid IN (SELECT uuid FROM subtree);",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(subtree)
    }

    fn folder_exists(&self, id: FolderId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn list_subtree_ids(conn: &Connection, id: NoteId) -> RepoResult<Vec<NoteId>> {
    // UNION (not UNION ALL) so a corrupted parent cycle cannot recurse forever.
    let mut stmt = conn.prepare(
        "WITH RECURSIVE subtree(uuid, depth) AS (
            SELECT uuid, 0 FROM notes WHERE uuid = ?1
            UNION
            SELECT child.uuid, parent.depth + 1
            FROM notes child
            INNER JOIN subtree parent ON child.parent_uuid = parent.uuid
            WHERE parent.depth < 10000
        )
        SELECT uuid, MIN(depth) AS depth
        FROM subtree
        GROUP BY uuid
        ORDER BY depth ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid_column(&value, "notes.uuid").map_err(RepoError::InvalidData)?);
    }
    Ok(ids)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid_column(&uuid_text, "notes.uuid").map_err(RepoError::InvalidData)?;

    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid_column(&value, "notes.parent_uuid"))
        .transpose()
        .map_err(RepoError::InvalidData)?;
    let folder_id = row
        .get::<_, Option<String>>("folder_uuid")?
        .map(|value| parse_uuid_column(&value, "notes.folder_uuid"))
        .transpose()
        .map_err(RepoError::InvalidData)?;

    Ok(Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        parent_id,
        folder_id,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
