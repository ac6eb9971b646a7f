use tahoe_core::db::open_db_in_memory;
use tahoe_core::model::note::DEFAULT_NOTE_TITLE;
use tahoe_core::model::note::Note;
use tahoe_core::repo::note_repo::{
    NoteListQuery, NoteRepository, NoteScope, SqliteNoteRepository,
};
use tahoe_core::service::note_service::ROOT_NOTE_CONTENT;
use tahoe_core::{NoteService, NoteServiceError};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn create_root_note_uses_defaults() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let note = service.create_root_note().unwrap();
    assert_eq!(note.title, DEFAULT_NOTE_TITLE);
    assert_eq!(note.content, ROOT_NOTE_CONTENT);
    assert!(note.is_root());
    assert!(note.created_at > 0);
}

#[test]
fn blank_title_falls_back_to_default_and_is_trimmed_otherwise() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let blank = service.create_note("   ", "", None, None).unwrap();
    assert_eq!(blank.title, DEFAULT_NOTE_TITLE);

    let padded = service.create_note("  Ideas  ", "", None, None).unwrap();
    assert_eq!(padded.title, "Ideas");
}

#[test]
fn rename_rejects_blank_title() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service.create_note("Draft", "", None, None).unwrap();

    let err = service.rename_note(note.id, " \t").unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidTitle));

    let renamed = service.rename_note(note.id, "Final").unwrap();
    assert_eq!(renamed.title, "Final");
}

#[test]
fn update_content_replaces_text_and_missing_note_is_reported() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service.create_note("Log", "old", None, None).unwrap();

    let updated = service.update_content(note.id, "new body").unwrap();
    assert_eq!(updated.content, "new body");
    assert_eq!(service.get_note(note.id).unwrap().unwrap().content, "new body");

    let missing = Uuid::new_v4();
    let err = service.update_content(missing, "x").unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(id) if id == missing));
}

#[test]
fn list_notes_keeps_creation_order() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let first = service.create_note("First", "", None, None).unwrap();
    let second = service.create_note("Second", "", None, None).unwrap();
    let third = service.create_note("Third", "", None, None).unwrap();

    let ids: Vec<_> = service
        .list_notes()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[test]
fn note_preview_is_capped_at_one_hundred_chars() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create_note("Long", "é".repeat(150), None, None)
        .unwrap();

    let preview = service.note_preview(note.id).unwrap();
    assert_eq!(preview.chars().count(), 100);
}

#[test]
fn toggle_task_persists_and_round_trips() {
    let conn = setup();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let content = "# Chores\n- [ ] buy milk\n- [x] call mom";
    let note = service.create_note("Chores", content, None, None).unwrap();

    let toggled = service.toggle_task(note.id, 1).unwrap();
    assert_eq!(toggled.content, "# Chores\n- [x] buy milk\n- [x] call mom");

    let restored = service.toggle_task(note.id, 1).unwrap();
    assert_eq!(restored.content, content);

    let unchanged = service.toggle_task(note.id, 42).unwrap();
    assert_eq!(unchanged.content, content);
}

#[test]
fn repository_lists_each_scope() {
    let conn = setup();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let root = Note::with_id(Uuid::new_v4(), "Root", "");
    let mut child = Note::with_id(Uuid::new_v4(), "Child", "");
    child.parent_id = Some(root.id);
    repo.create_note(&root).unwrap();
    repo.create_note(&child).unwrap();

    let ids = |scope| -> Vec<Uuid> {
        repo.list_notes(&NoteListQuery { scope })
            .unwrap()
            .into_iter()
            .map(|note| note.id)
            .collect()
    };
    assert_eq!(ids(NoteScope::All), vec![root.id, child.id]);
    assert_eq!(ids(NoteScope::Roots), vec![root.id]);
    assert_eq!(ids(NoteScope::ChildrenOf(root.id)), vec![child.id]);
    assert!(ids(NoteScope::ChildrenOf(child.id)).is_empty());
    assert!(ids(NoteScope::InFolder(Uuid::new_v4())).is_empty());
}
