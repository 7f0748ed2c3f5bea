//! `orbgame clear-old` — delete stories past the retention window.

use anyhow::Result;

use crate::config::OrbConfig;
use crate::db;
use crate::story::store;

pub fn run(config: &OrbConfig, days: u32) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let deleted = store::clear_old_stories(&conn, days)?;
    println!("Deleted {deleted} stories older than {days} days.");
    Ok(())
}
