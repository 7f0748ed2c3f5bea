pub mod clear_old;
pub mod import;
pub mod preload;
pub mod stats;
pub mod verify;

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::config::OrbConfig;
use crate::db;
use crate::provider;
use crate::story::service::StoryService;

/// Open the configured database and build a story service for CLI use.
/// Missing credentials degrade the providers instead of aborting the command.
pub(crate) fn build_service(config: &OrbConfig) -> Result<Arc<StoryService>> {
    let conn = db::open_database(config.resolved_db_path())?;
    let db = Arc::new(Mutex::new(conn));

    let generator = match provider::create_generator(&config.providers) {
        Ok(generator) => Arc::from(generator),
        Err(e) => {
            warn!(error = %e, "no story generator available, preloading fallback stories");
            Arc::new(provider::Disabled) as Arc<dyn provider::StoryGenerator>
        }
    };
    let synthesizer = match provider::create_synthesizer(&config.providers) {
        Ok(synthesizer) => Some(Arc::from(synthesizer)),
        Err(e) => {
            warn!(error = %e, "no speech synthesizer available, skipping audio");
            None
        }
    };

    Ok(Arc::new(StoryService::new(db, generator, synthesizer)))
}
