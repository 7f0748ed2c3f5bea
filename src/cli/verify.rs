//! `orbgame verify` — read-only invariant checks over the store.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::OrbConfig;
use crate::content::{Category, Epoch, Language};
use crate::db;

/// Run all checks. Returns the number of violations found.
pub fn run(config: &OrbConfig) -> Result<usize> {
    let conn = db::open_database(config.resolved_db_path())?;
    let mut violations = 0;

    violations += check_figure_uniqueness(&conn)?;
    violations += check_audio_flags(&conn)?;
    violations += check_usage_consistency(&conn)?;
    violations += check_known_dimensions(&conn)?;

    if violations == 0 {
        println!("OK: all invariants hold.");
    } else {
        println!("FAILED: {violations} violation(s) found.");
    }
    Ok(violations)
}

/// At most one story per (category, epoch, language, figure).
fn check_figure_uniqueness(conn: &Connection) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT category, epoch, language, figure, COUNT(*) FROM stories \
         WHERE figure IS NOT NULL \
         GROUP BY category, epoch, language, figure HAVING COUNT(*) > 1",
    )?;
    let dupes: Vec<(String, String, String, String, i64)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (category, epoch, language, figure, count) in &dupes {
        println!("duplicate figure story: {figure} x{count} in {category}/{epoch}/{language}");
    }
    Ok(dupes.len())
}

/// `has_audio` must match the presence of a `story_audio` row, both ways.
fn check_audio_flags(conn: &Connection) -> Result<usize> {
    let flagged_without: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stories s \
         WHERE s.has_audio = 1 AND NOT EXISTS \
         (SELECT 1 FROM story_audio a WHERE a.story_id = s.id)",
        [],
        |row| row.get(0),
    )?;
    let unflagged_with: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stories s \
         WHERE s.has_audio = 0 AND EXISTS \
         (SELECT 1 FROM story_audio a WHERE a.story_id = s.id)",
        [],
        |row| row.get(0),
    )?;

    if flagged_without > 0 {
        println!("{flagged_without} stories flagged has_audio without an audio row");
    }
    if unflagged_with > 0 {
        println!("{unflagged_with} stories with audio rows but has_audio = 0");
    }
    Ok((flagged_without + unflagged_with) as usize)
}

/// A served story must have both counters set together.
fn check_usage_consistency(conn: &Connection) -> Result<usize> {
    let inconsistent: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stories \
         WHERE (use_count > 0 AND last_used IS NULL) \
            OR (use_count = 0 AND last_used IS NOT NULL)",
        [],
        |row| row.get(0),
    )?;
    if inconsistent > 0 {
        println!("{inconsistent} stories with inconsistent use_count/last_used");
    }
    Ok(inconsistent as usize)
}

/// Every stored dimension value must parse into the known enums.
fn check_known_dimensions(conn: &Connection) -> Result<usize> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT category, epoch, language FROM stories")?;
    let rows: Vec<(String, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut violations = 0;
    for (category, epoch, language) in rows {
        if category.parse::<Category>().is_err() {
            println!("unknown category in store: {category}");
            violations += 1;
        }
        if epoch.parse::<Epoch>().is_err() {
            println!("unknown epoch in store: {epoch}");
            violations += 1;
        }
        if language.parse::<Language>().is_err() {
            println!("unknown language in store: {language}");
            violations += 1;
        }
    }
    Ok(violations)
}
