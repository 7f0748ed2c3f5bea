//! `orbgame preload` — top up the story cache ahead of traffic.

use anyhow::Result;

use crate::config::OrbConfig;
use crate::content::Epoch;

pub async fn run(config: &OrbConfig, epoch: Option<Epoch>, repair_audio: bool) -> Result<()> {
    let service = super::build_service(config)?;
    let floor = config.refresh.stories_per_key;

    let report = match epoch {
        Some(epoch) => {
            println!("Preloading epoch {epoch} to {floor} stories per key...");
            service.ensure_epoch(epoch, floor).await?
        }
        None => {
            println!("Preloading all epochs to {floor} stories per key...");
            service.ensure_content(floor).await?
        }
    };

    println!(
        "Checked {} keys, generated {} stories.",
        report.keys_checked, report.generated
    );

    if repair_audio {
        let repaired = service.repair_missing_audio(usize::MAX).await?;
        println!("Repaired audio for {repaired} stories.");
    } else if report.audio_repaired > 0 {
        println!("Repaired audio for {} stories.", report.audio_repaired);
    }

    Ok(())
}
