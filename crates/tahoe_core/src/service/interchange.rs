//! Markdown file import/export and image attachment.
//!
//! # Responsibility
//! - Turn a `.md` file on disk into a new root note and back.
//! - Copy images into the assets directory and reference them from content.
//!
//! # Invariants
//! - Exported files contain the note content byte-for-byte.
//! - Attached image paths are relative: `assets/img_<6 hex>.png`.

use crate::model::note::{Note, NoteId, DEFAULT_NOTE_TITLE};
use crate::repo::note_repo::NoteRepository;
use crate::service::note_service::{NoteService, NoteServiceError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory, relative to the data directory, where attached images live.
pub const ASSETS_DIR_NAME: &str = "assets";

const FORBIDDEN_FILE_NAME_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', '|', '"', '<', '>', ':'];

#[derive(Debug)]
pub enum InterchangeError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The imported file is not valid UTF-8.
    InvalidUtf8(PathBuf),
    Service(NoteServiceError),
}

impl Display for InterchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::InvalidUtf8(path) => write!(f, "file is not valid UTF-8: `{}`", path.display()),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InterchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidUtf8(_) => None,
            Self::Service(err) => Some(err),
        }
    }
}

impl From<NoteServiceError> for InterchangeError {
    fn from(value: NoteServiceError) -> Self {
        Self::Service(value)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> InterchangeError + '_ {
    move |source| InterchangeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Creates a root note from a markdown file, titled with the file stem.
pub fn import_markdown_file<R: NoteRepository>(
    service: &NoteService<R>,
    path: &Path,
) -> Result<Note, InterchangeError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let content =
        String::from_utf8(bytes).map_err(|_| InterchangeError::InvalidUtf8(path.to_path_buf()))?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string());

    let note = service.create_note(title, content, None, None)?;
    info!(
        "event=note_import module=interchange status=ok content_bytes={}",
        note.content.len()
    );
    Ok(note)
}

/// Writes the note's content verbatim into `destination`.
pub fn export_markdown_file<R: NoteRepository>(
    service: &NoteService<R>,
    id: NoteId,
    destination: &Path,
) -> Result<(), InterchangeError> {
    let note = service.require_note(id)?;
    std::fs::write(destination, note.content.as_bytes()).map_err(io_error(destination))?;
    info!(
        "event=note_export module=interchange status=ok content_bytes={}",
        note.content.len()
    );
    Ok(())
}

/// Suggested file name for exporting a note with `title`.
pub fn export_file_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|ch| {
            if FORBIDDEN_FILE_NAME_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .collect();
    format!("{sanitized}.md")
}

/// Copies `source` into `<data_dir>/assets/` and appends an image reference
/// to the note. Returns the updated note and the relative image path.
pub fn attach_image<R: NoteRepository>(
    service: &NoteService<R>,
    id: NoteId,
    source: &Path,
    data_dir: &Path,
) -> Result<(Note, String), InterchangeError> {
    service.require_note(id)?;

    let assets_dir = data_dir.join(ASSETS_DIR_NAME);
    std::fs::create_dir_all(&assets_dir).map_err(io_error(&assets_dir))?;

    let file_name = image_file_name();
    let target = assets_dir.join(&file_name);
    if let Err(err) = std::fs::copy(source, &target) {
        warn!("event=image_attach module=interchange status=error reason=copy_failed");
        return Err(InterchangeError::Io {
            path: source.to_path_buf(),
            source: err,
        });
    }

    let relative = format!("{ASSETS_DIR_NAME}/{file_name}");
    let note = service.append_content(id, &format!("\n\n![image]({relative})\n"))?;
    info!("event=image_attach module=interchange status=ok");
    Ok((note, relative))
}

fn image_file_name() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("img_{}.png", &hex[..6])
}

#[cfg(test)]
mod tests {
    use super::{export_file_name, image_file_name};

    #[test]
    fn export_file_name_replaces_forbidden_characters() {
        assert_eq!(export_file_name("a/b:c?"), "a_b_c_.md");
        assert_eq!(export_file_name("Plain title"), "Plain title.md");
    }

    #[test]
    fn image_file_name_has_six_hex_digits() {
        let name = image_file_name();
        assert!(name.starts_with("img_"));
        assert!(name.ends_with(".png"));
        let hex = &name["img_".len()..name.len() - ".png".len()];
        assert_eq!(hex.len(), 6);
        assert!(hex.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
