use tahoe_core::db::open_db_in_memory;
use tahoe_core::model::folder::DEFAULT_FOLDER_NAME;
use tahoe_core::repo::folder_repo::SqliteFolderRepository;
use tahoe_core::repo::note_repo::SqliteNoteRepository;
use tahoe_core::{FolderService, FolderServiceError, NoteService, NoteServiceError};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn create_folder_defaults_blank_name() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());

    let folder = folders.create_folder("  ").unwrap();
    assert_eq!(folder.name, DEFAULT_FOLDER_NAME);
}

#[test]
fn list_folders_sorts_case_insensitively() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());

    folders.create_folder("beta").unwrap();
    folders.create_folder("Alpha").unwrap();
    folders.create_folder("gamma").unwrap();

    let names: Vec<_> = folders
        .list_folders()
        .unwrap()
        .into_iter()
        .map(|folder| folder.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
}

#[test]
fn rename_folder_rejects_blank_and_missing() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    let folder = folders.create_folder("Inbox").unwrap();

    assert!(matches!(
        folders.rename_folder(folder.id, "").unwrap_err(),
        FolderServiceError::InvalidName
    ));
    assert!(matches!(
        folders.rename_folder(Uuid::new_v4(), "Other").unwrap_err(),
        FolderServiceError::FolderNotFound(_)
    ));
    assert_eq!(folders.rename_folder(folder.id, "Archive").unwrap().name, "Archive");
}

#[test]
fn delete_folder_keeps_notes_and_clears_assignment() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let folder = folders.create_folder("Work").unwrap();
    let a = notes.create_note("A", "", None, Some(folder.id)).unwrap();
    let b = notes.create_subnote(a.id, "B").unwrap();
    let loose = notes.create_note("Loose", "", None, None).unwrap();

    assert_eq!(notes.notes_in_folder(folder.id).unwrap().len(), 2);

    let detached = folders.delete_folder(folder.id).unwrap();
    assert_eq!(detached, 2);
    assert!(folders.get_folder(folder.id).unwrap().is_none());

    for id in [a.id, b.id, loose.id] {
        let note = notes.get_note(id).unwrap().expect("note must survive folder delete");
        assert_eq!(note.folder_id, None);
    }
}

#[test]
fn set_folder_validates_folder_existence() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let folder = folders.create_folder("Personal").unwrap();
    let note = notes.create_note("Diary", "", None, None).unwrap();

    let assigned = notes.set_folder(note.id, Some(folder.id)).unwrap();
    assert_eq!(assigned.folder_id, Some(folder.id));

    let err = notes.set_folder(note.id, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, NoteServiceError::FolderNotFound(_)));

    let cleared = notes.set_folder(note.id, None).unwrap();
    assert_eq!(cleared.folder_id, None);
}
