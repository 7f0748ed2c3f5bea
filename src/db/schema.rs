//! SQL DDL for all Orb Game tables.
//!
//! Defines the `stories`, `story_audio`, `figure_images`, `figure_seeds`,
//! and `schema_meta` tables. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization.

use rusqlite::Connection;

/// All schema DDL statements for the Orb Game store.
const SCHEMA_SQL: &str = r#"
-- Core story cache
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    epoch TEXT NOT NULL,
    language TEXT NOT NULL CHECK(language IN ('en','es')),
    headline TEXT NOT NULL,
    summary TEXT NOT NULL,
    full_text TEXT NOT NULL,
    source TEXT NOT NULL,
    figure TEXT,
    published_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_used TEXT,
    use_count INTEGER NOT NULL DEFAULT 0,
    has_audio INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_stories_key ON stories(category, epoch, language);
CREATE INDEX IF NOT EXISTS idx_stories_figure ON stories(figure);
CREATE INDEX IF NOT EXISTS idx_stories_last_used ON stories(last_used);
CREATE INDEX IF NOT EXISTS idx_stories_created ON stories(created_at);

-- TTS audio, linked by story id. Payload is base64-encoded MP3.
CREATE TABLE IF NOT EXISTS story_audio (
    story_id TEXT PRIMARY KEY REFERENCES stories(id) ON DELETE CASCADE,
    audio_b64 TEXT NOT NULL,
    voice TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Portrait/gallery image metadata keyed by normalized figure name.
CREATE TABLE IF NOT EXISTS figure_images (
    id TEXT PRIMARY KEY,
    figure TEXT NOT NULL,
    category TEXT NOT NULL,
    epoch TEXT NOT NULL,
    image_type TEXT NOT NULL CHECK(image_type IN ('portrait','gallery')),
    url TEXT NOT NULL,
    source TEXT,
    licensing TEXT,
    permalink TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_figure ON figure_images(figure);
CREATE INDEX IF NOT EXISTS idx_images_category ON figure_images(category);
CREATE INDEX IF NOT EXISTS idx_images_type ON figure_images(image_type);

-- Historical figure seed list driving story rotation.
CREATE TABLE IF NOT EXISTS figure_seeds (
    figure TEXT NOT NULL,
    category TEXT NOT NULL,
    epoch TEXT NOT NULL,
    context TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (figure, category, epoch)
);

CREATE INDEX IF NOT EXISTS idx_seeds_key ON figure_seeds(category, epoch);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"stories".to_string()));
        assert!(tables.contains(&"story_audio".to_string()));
        assert!(tables.contains(&"figure_images".to_string()));
        assert!(tables.contains(&"figure_seeds".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn language_check_constraint_rejects_unknown() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO stories (id, category, epoch, language, headline, summary, full_text, source, published_at, created_at) \
             VALUES ('x', 'Technology', 'Modern', 'fr', 'h', 's', 'f', 'src', '2026-01-01', '2026-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
