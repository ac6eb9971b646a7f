use tahoe_core::db::open_db_in_memory;
use tahoe_core::repo::folder_repo::SqliteFolderRepository;
use tahoe_core::repo::note_repo::SqliteNoteRepository;
use tahoe_core::{FolderService, NoteService, NoteServiceError};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn subnote_inherits_parent_folder() {
    let conn = setup();
    let folders = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let folder = folders.create_folder("Work").unwrap();
    let parent = notes
        .create_note("Project", "", None, Some(folder.id))
        .unwrap();
    let child = notes.create_subnote(parent.id, "Meeting").unwrap();

    assert_eq!(child.parent_id, Some(parent.id));
    assert_eq!(child.folder_id, Some(folder.id));
    assert_eq!(child.content, "");
}

#[test]
fn subnote_with_missing_parent_is_rejected() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    let err = notes.create_subnote(missing, "Orphan").unwrap_err();
    assert!(matches!(err, NoteServiceError::ParentNotFound(id) if id == missing));
    assert!(notes.list_notes().unwrap().is_empty());
}

#[test]
fn roots_and_children_are_separated() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let root = notes.create_note("Root", "", None, None).unwrap();
    let child_a = notes.create_subnote(root.id, "A").unwrap();
    let child_b = notes.create_subnote(root.id, "B").unwrap();
    notes.create_subnote(child_a.id, "A1").unwrap();

    let roots: Vec<_> = notes.root_notes().unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(roots, vec![root.id]);

    let children: Vec<_> = notes
        .children(root.id)
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(children, vec![child_a.id, child_b.id]);
}

#[test]
fn delete_removes_whole_subtree_only() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let root = notes.create_note("Root", "", None, None).unwrap();
    let child = notes.create_subnote(root.id, "Child").unwrap();
    let grandchild = notes.create_subnote(child.id, "Grandchild").unwrap();
    let other = notes.create_note("Other", "", None, None).unwrap();

    let deleted = notes.delete_note(root.id).unwrap();
    assert_eq!(deleted.len(), 3);
    assert_eq!(deleted[0], root.id);
    assert!(deleted.contains(&child.id));
    assert!(deleted.contains(&grandchild.id));

    let remaining: Vec<_> = notes.list_notes().unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(remaining, vec![other.id]);
}

#[test]
fn delete_missing_note_is_not_found() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = notes.delete_note(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(_)));
}

#[test]
fn move_under_own_descendant_is_rejected() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let root = notes.create_note("Root", "", None, None).unwrap();
    let child = notes.create_subnote(root.id, "Child").unwrap();
    let grandchild = notes.create_subnote(child.id, "Grandchild").unwrap();

    let err = notes.move_note(root.id, Some(grandchild.id)).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::CycleDetected { note_id, parent_id }
            if note_id == root.id && parent_id == grandchild.id
    ));

    let err = notes.move_note(root.id, Some(root.id)).unwrap_err();
    assert!(matches!(err, NoteServiceError::CycleDetected { .. }));

    assert_eq!(notes.get_note(root.id).unwrap().unwrap().parent_id, None);
}

#[test]
fn move_to_root_and_to_sibling() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let a = notes.create_note("A", "", None, None).unwrap();
    let b = notes.create_note("B", "", None, None).unwrap();
    let child = notes.create_subnote(a.id, "Child").unwrap();

    let moved = notes.move_note(child.id, Some(b.id)).unwrap();
    assert_eq!(moved.parent_id, Some(b.id));

    let moved = notes.move_note(child.id, None).unwrap();
    assert!(moved.is_root());
}

#[test]
fn move_under_missing_parent_is_rejected() {
    let conn = setup();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = notes.create_note("A", "", None, None).unwrap();

    let err = notes.move_note(note.id, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, NoteServiceError::ParentNotFound(_)));
}
