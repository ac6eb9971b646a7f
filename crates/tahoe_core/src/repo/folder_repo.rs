//! Folder repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Folder listing is sorted by `name COLLATE NOCASE ASC, uuid ASC`.
//! - Deleting a folder clears `folder_uuid` on its notes before removing the
//!   folder row; notes are never deleted through this path.

use crate::model::folder::{Folder, FolderId};
use crate::repo::note_repo::{RepoError, RepoResult};
use crate::repo::{parse_uuid_column, table_exists};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const FOLDER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    created_at,
    updated_at
FROM folders";

/// Repository interface for folder operations.
pub trait FolderRepository {
    fn create_folder(&self, folder: &Folder) -> RepoResult<FolderId>;
    fn rename_folder(&self, id: FolderId, name: &str) -> RepoResult<()>;
    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>>;
    fn list_folders(&self) -> RepoResult<Vec<Folder>>;
    /// Detaches all notes from the folder and deletes it. Returns the number
    /// of notes detached.
    fn delete_folder(&self, id: FolderId) -> RepoResult<usize>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFolderRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "folders")? {
            return Err(RepoError::MissingRequiredTable("folders"));
        }
        Ok(Self { conn })
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn create_folder(&self, folder: &Folder) -> RepoResult<FolderId> {
        if folder.name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "folder name must not be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO folders (uuid, name) VALUES (?1, ?2);",
            params![folder.id.to_string(), folder.name.as_str()],
        )?;
        Ok(folder.id)
    }

    fn rename_folder(&self, id: FolderId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE folders
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::FolderNotFound(id));
        }
        Ok(())
    }

    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FOLDER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_folder_row(row)?));
        }
        Ok(None)
    }

    fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FOLDER_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        Ok(folders)
    }

    fn delete_folder(&self, id: FolderId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::FolderNotFound(id));
        }

        let detached = tx.execute(
            "UPDATE notes
             SET folder_uuid = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE folder_uuid = ?1;",
            [id.to_string()],
        )?;
        tx.execute("DELETE FROM folders WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(detached)
    }
}

fn parse_folder_row(row: &Row<'_>) -> RepoResult<Folder> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid_column(&uuid_text, "folders.uuid").map_err(RepoError::InvalidData)?;
    Ok(Folder {
        id,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
