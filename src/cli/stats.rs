//! `orbgame stats` — cache coverage and usage summary.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::OrbConfig;
use crate::db;
use crate::images;
use crate::story::store;

pub fn run(config: &OrbConfig) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    println!("Stories: {}", store::story_count(&conn)?);
    println!("Figure seeds: {}", store::seed_count(&conn)?);

    print_coverage(&conn)?;
    print_audio(&conn)?;

    let images = images::store::image_stats(&conn)?;
    println!(
        "Images: {} total ({} figures, {} portraits, {} gallery)",
        images.total_images, images.figures, images.portraits, images.galleries
    );
    Ok(())
}

fn print_coverage(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT category, epoch, COUNT(*), SUM(use_count) FROM stories \
         GROUP BY category, epoch ORDER BY category, epoch",
    )?;
    let rows: Vec<(String, String, i64, i64)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        println!("No cached stories yet.");
        return Ok(());
    }

    println!("Coverage by category/epoch:");
    for (category, epoch, count, uses) in rows {
        println!("  {category:<12} {epoch:<12} {count:>4} stories, {uses:>5} serves");
    }
    Ok(())
}

fn print_audio(conn: &Connection) -> Result<()> {
    let with_audio: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stories WHERE has_audio = 1",
        [],
        |row| row.get(0),
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))?;
    if total > 0 {
        println!(
            "Audio coverage: {with_audio}/{total} ({:.0}%)",
            100.0 * with_audio as f64 / total as f64
        );
    }
    Ok(())
}
