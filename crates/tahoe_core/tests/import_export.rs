use std::fs;
use tahoe_core::db::open_db_in_memory;
use tahoe_core::repo::note_repo::SqliteNoteRepository;
use tahoe_core::service::interchange::{
    attach_image, export_file_name, export_markdown_file, import_markdown_file, ASSETS_DIR_NAME,
};
use tahoe_core::{InterchangeError, NoteService};

#[test]
fn export_then_import_reproduces_content() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let dir = tempfile::tempdir().unwrap();

    let content = "# Trip\r\n\n- [ ] pack ✈️\n\n```\n  indented\n```\n\n";
    let original = service.create_note("Trip", content, None, None).unwrap();

    let path = dir.path().join(export_file_name(&original.title));
    export_markdown_file(&service, original.id, &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), content.as_bytes());

    let imported = import_markdown_file(&service, &path).unwrap();
    assert_eq!(imported.title, "Trip");
    assert_eq!(imported.content, content);
    assert_ne!(imported.id, original.id);
    assert!(imported.is_root());
}

#[test]
fn import_rejects_invalid_utf8() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.md");
    fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

    let err = import_markdown_file(&service, &path).unwrap_err();
    assert!(matches!(err, InterchangeError::InvalidUtf8(_)));
    assert!(service.list_notes().unwrap().is_empty());
}

#[test]
fn import_missing_file_is_io_error() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let dir = tempfile::tempdir().unwrap();

    let err = import_markdown_file(&service, &dir.path().join("absent.md")).unwrap_err();
    assert!(matches!(err, InterchangeError::Io { .. }));
}

#[test]
fn attach_image_copies_file_and_appends_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let data_dir = tempfile::tempdir().unwrap();
    let source_dir = tempfile::tempdir().unwrap();

    let source = source_dir.path().join("photo.jpg");
    fs::write(&source, b"fake image bytes").unwrap();
    let note = service.create_note("Album", "intro", None, None).unwrap();

    let (updated, relative) = attach_image(&service, note.id, &source, data_dir.path()).unwrap();

    assert!(relative.starts_with(&format!("{ASSETS_DIR_NAME}/img_")));
    assert!(relative.ends_with(".png"));
    assert_eq!(
        updated.content,
        format!("intro\n\n![image]({relative})\n")
    );
    assert_eq!(
        fs::read(data_dir.path().join(&relative)).unwrap(),
        b"fake image bytes"
    );
}

#[test]
fn export_file_name_sanitizes_every_reserved_character() {
    assert_eq!(export_file_name(r#"a/b\c?d%e*f|g"h<i>j:k"#), "a_b_c_d_e_f_g_h_i_j_k.md");
}
