//! Story persistence — inserts, keyed lookups, usage tracking, audio links.
//!
//! All functions take a plain [`Connection`] so callers choose the backing
//! store (file-backed in production, in-memory in tests). Usage tracking is a
//! single-statement `UPDATE`, so concurrent serves cannot lose increments.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use crate::content::{Category, Epoch, Language};
use crate::story::types::{AudioRecord, FigureSeed, Story};

/// Per-figure usage aggregate for one (category, epoch, language) key.
#[derive(Debug, Clone, Default)]
pub struct FigureUsage {
    /// Sum of `use_count` across the figure's stories.
    pub use_count: u32,
    /// Most recent `last_used` across the figure's stories.
    pub last_used: Option<String>,
}

fn parse_col<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn row_to_story(row: &rusqlite::Row) -> rusqlite::Result<Story> {
    Ok(Story {
        id: row.get(0)?,
        category: parse_col(1, row.get::<_, String>(1)?)?,
        epoch: parse_col(2, row.get::<_, String>(2)?)?,
        language: parse_col(3, row.get::<_, String>(3)?)?,
        headline: row.get(4)?,
        summary: row.get(5)?,
        full_text: row.get(6)?,
        source: row.get(7)?,
        figure: row.get(8)?,
        published_at: row.get(9)?,
        created_at: row.get(10)?,
        last_used: row.get(11)?,
        use_count: row.get(12)?,
        has_audio: row.get::<_, i64>(13)? != 0,
    })
}

const STORY_COLUMNS: &str = "id, category, epoch, language, headline, summary, full_text, \
     source, figure, published_at, created_at, last_used, use_count, has_audio";

/// Insert a new story row.
pub fn insert_story(conn: &Connection, story: &Story) -> Result<()> {
    conn.execute(
        "INSERT INTO stories (id, category, epoch, language, headline, summary, full_text, \
         source, figure, published_at, created_at, last_used, use_count, has_audio) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            story.id,
            story.category.as_str(),
            story.epoch.as_str(),
            story.language.as_str(),
            story.headline,
            story.summary,
            story.full_text,
            story.source,
            story.figure,
            story.published_at,
            story.created_at,
            story.last_used,
            story.use_count,
            story.has_audio as i64,
        ],
    )
    .context("failed to insert story")?;
    Ok(())
}

/// Fetch stories for a key, least-recently-served first.
///
/// Never-served stories (`last_used IS NULL`) sort before any served story,
/// then ascending use count, then stalest `last_used`.
pub fn find_stories(
    conn: &Connection,
    category: Category,
    epoch: Epoch,
    language: Language,
    limit: usize,
) -> Result<Vec<Story>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STORY_COLUMNS} FROM stories \
         WHERE category = ?1 AND epoch = ?2 AND language = ?3 \
         ORDER BY (last_used IS NOT NULL), use_count ASC, last_used ASC, created_at ASC \
         LIMIT ?4"
    ))?;
    let stories = stmt
        .query_map(
            params![category.as_str(), epoch.as_str(), language.as_str(), limit as i64],
            row_to_story,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stories)
}

/// Count cached stories for a key.
pub fn count_stories(
    conn: &Connection,
    category: Category,
    epoch: Epoch,
    language: Language,
) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stories WHERE category = ?1 AND epoch = ?2 AND language = ?3",
        params![category.as_str(), epoch.as_str(), language.as_str()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Fetch a single story by id.
pub fn get_story(conn: &Connection, id: &str) -> Result<Option<Story>> {
    let story = conn
        .query_row(
            &format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"),
            params![id],
            row_to_story,
        )
        .optional()?;
    Ok(story)
}

/// Record a serve: bump `use_count` and stamp `last_used` in one atomic
/// UPDATE, then return the fresh (use_count, last_used) pair.
pub fn touch_story(conn: &Connection, id: &str) -> Result<(u32, String)> {
    let now = chrono::Utc::now().to_rfc3339();
    let rows = conn.execute(
        "UPDATE stories SET use_count = use_count + 1, last_used = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    anyhow::ensure!(rows == 1, "story not found: {id}");

    let use_count: u32 = conn.query_row(
        "SELECT use_count FROM stories WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok((use_count, now))
}

/// Total number of cached stories.
pub fn story_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Per-figure usage aggregates for one key, for rotation ordering.
pub fn figure_usage(
    conn: &Connection,
    category: Category,
    epoch: Epoch,
    language: Language,
) -> Result<HashMap<String, FigureUsage>> {
    let mut stmt = conn.prepare(
        "SELECT figure, SUM(use_count), MAX(last_used) FROM stories \
         WHERE category = ?1 AND epoch = ?2 AND language = ?3 AND figure IS NOT NULL \
         GROUP BY figure",
    )?;
    let rows = stmt.query_map(
        params![category.as_str(), epoch.as_str(), language.as_str()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                FigureUsage {
                    use_count: row.get::<_, i64>(1)? as u32,
                    last_used: row.get(2)?,
                },
            ))
        },
    )?;

    let mut usage = HashMap::new();
    for row in rows {
        let (figure, entry) = row?;
        usage.insert(figure, entry);
    }
    Ok(usage)
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Store a TTS payload and flip the story's `has_audio` flag.
pub fn insert_audio(conn: &Connection, audio: &AudioRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO story_audio (story_id, audio_b64, voice, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![audio.story_id, audio.audio_b64, audio.voice, audio.created_at],
    )?;
    conn.execute(
        "UPDATE stories SET has_audio = 1 WHERE id = ?1",
        params![audio.story_id],
    )?;
    Ok(())
}

/// Fetch a story's TTS payload, if one exists.
pub fn get_audio(conn: &Connection, story_id: &str) -> Result<Option<AudioRecord>> {
    let audio = conn
        .query_row(
            "SELECT story_id, audio_b64, voice, created_at FROM story_audio WHERE story_id = ?1",
            params![story_id],
            |row| {
                Ok(AudioRecord {
                    story_id: row.get(0)?,
                    audio_b64: row.get(1)?,
                    voice: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(audio)
}

/// Stories whose TTS generation previously failed or was skipped.
pub fn stories_missing_audio(conn: &Connection, limit: usize) -> Result<Vec<Story>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE has_audio = 0 ORDER BY created_at ASC LIMIT ?1"
    ))?;
    let stories = stmt
        .query_map(params![limit], row_to_story)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stories)
}

// ── Seeds ─────────────────────────────────────────────────────────────────────

/// Upsert a figure seed.
pub fn insert_seed(conn: &Connection, seed: &FigureSeed) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO figure_seeds (figure, category, epoch, context) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            seed.figure,
            seed.category.as_str(),
            seed.epoch.as_str(),
            seed.context
        ],
    )?;
    Ok(())
}

/// All seeds for one (category, epoch), in stable name order.
pub fn seeds_for(conn: &Connection, category: Category, epoch: Epoch) -> Result<Vec<FigureSeed>> {
    let mut stmt = conn.prepare(
        "SELECT figure, category, epoch, context FROM figure_seeds \
         WHERE category = ?1 AND epoch = ?2 ORDER BY figure",
    )?;
    let seeds = stmt
        .query_map(params![category.as_str(), epoch.as_str()], |row| {
            Ok(FigureSeed {
                figure: row.get(0)?,
                category: parse_col(1, row.get::<_, String>(1)?)?,
                epoch: parse_col(2, row.get::<_, String>(2)?)?,
                context: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(seeds)
}

/// Total number of figure seeds.
pub fn seed_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM figure_seeds", [], |row| row.get(0))?;
    Ok(count as usize)
}

// ── Maintenance ───────────────────────────────────────────────────────────────

/// Delete stories older than `days`. Audio rows cascade via the foreign key.
pub fn clear_old_stories(conn: &Connection, days: u32) -> Result<usize> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(days as i64)).to_rfc3339();
    let deleted = conn.execute(
        "DELETE FROM stories WHERE created_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
