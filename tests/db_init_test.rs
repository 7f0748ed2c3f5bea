//! On-disk database lifecycle: creation, persistence across reopen,
//! migrations.

use orbgame::content::{Category, Epoch, Language};
use orbgame::db;
use orbgame::story::store;
use orbgame::story::types::Story;

fn sample_story() -> Story {
    let now = chrono::Utc::now().to_rfc3339();
    Story {
        id: uuid::Uuid::now_v7().to_string(),
        category: Category::Space,
        epoch: Epoch::Future,
        language: Language::En,
        headline: "Orbit cleanup succeeds".into(),
        summary: "Debris removal works.".into(),
        full_text: "A debris removal mission cleaned a busy orbit.".into(),
        source: "test".into(),
        figure: None,
        published_at: now.clone(),
        created_at: now,
        last_used: None,
        use_count: 0,
        has_audio: false,
    }
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("orbgame.db");

    let conn = db::open_database(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store::story_count(&conn).unwrap(), 0);
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orbgame.db");

    let story = sample_story();
    {
        let conn = db::open_database(&path).unwrap();
        store::insert_story(&conn, &story).unwrap();
        store::touch_story(&conn, &story.id).unwrap();
    }

    let conn = db::open_database(&path).unwrap();
    let found = store::get_story(&conn, &story.id).unwrap().unwrap();
    assert_eq!(found.headline, "Orbit cleanup succeeds");
    assert_eq!(found.use_count, 1);
    assert!(found.last_used.is_some());
}

#[test]
fn schema_version_is_current_after_open() {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open_database(dir.path().join("orbgame.db")).unwrap();
    assert_eq!(
        db::migrations::get_schema_version(&conn).unwrap(),
        db::migrations::CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn wal_mode_is_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open_database(dir.path().join("orbgame.db")).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
