//! `orbgame import-images` / `orbgame import-seeds` — reference data import.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::OrbConfig;
use crate::db;
use crate::images;
use crate::story::store;
use crate::story::types::FigureSeed;

pub fn run_images(config: &OrbConfig, file: &Path) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let imported = images::store::import_images_json(&conn, &json)?;
    println!("Imported {imported} image records from {}.", file.display());
    Ok(())
}

pub fn run_seeds(config: &OrbConfig, file: &Path) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let seeds: Vec<FigureSeed> =
        serde_json::from_str(&json).context("failed to parse seed JSON")?;
    for seed in &seeds {
        store::insert_seed(&conn, seed)?;
    }
    println!("Imported {} figure seeds from {}.", seeds.len(), file.display());
    Ok(())
}
