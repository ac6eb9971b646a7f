//! Folder use-case service.
//!
//! # Invariants
//! - Folder names are trimmed; a blank name on create falls back to
//!   `New Folder`, a blank rename is rejected.
//! - Deleting a folder never deletes notes.

use crate::model::folder::{Folder, FolderId, DEFAULT_FOLDER_NAME};
use crate::repo::folder_repo::FolderRepository;
use crate::repo::note_repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum FolderServiceError {
    InvalidName,
    FolderNotFound(FolderId),
    Repo(RepoError),
}

impl Display for FolderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "folder name must not be blank"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FolderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FolderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FolderNotFound(id) => Self::FolderNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct FolderService<R: FolderRepository> {
    repo: R,
}

impl<R: FolderRepository> FolderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_folder(&self, name: impl Into<String>) -> Result<Folder, FolderServiceError> {
        let name = name.into();
        let trimmed = name.trim();
        let folder = Folder::new(if trimmed.is_empty() {
            DEFAULT_FOLDER_NAME
        } else {
            trimmed
        });
        let id = self.repo.create_folder(&folder)?;
        info!("event=folder_create module=service status=ok");
        self.require_folder(id)
    }

    pub fn rename_folder(
        &self,
        id: FolderId,
        name: impl Into<String>,
    ) -> Result<Folder, FolderServiceError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FolderServiceError::InvalidName);
        }
        self.repo.rename_folder(id, trimmed)?;
        self.require_folder(id)
    }

    pub fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>> {
        self.repo.get_folder(id)
    }

    pub fn require_folder(&self, id: FolderId) -> Result<Folder, FolderServiceError> {
        self.repo
            .get_folder(id)?
            .ok_or(FolderServiceError::FolderNotFound(id))
    }

    pub fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        self.repo.list_folders()
    }

    /// Deletes the folder and returns how many notes were detached from it.
    pub fn delete_folder(&self, id: FolderId) -> Result<usize, FolderServiceError> {
        let detached = self.repo.delete_folder(id)?;
        info!("event=folder_delete module=service status=ok detached_count={detached}");
        Ok(detached)
    }
}
