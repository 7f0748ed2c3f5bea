//! Cache-or-generate orchestration.
//!
//! [`StoryService::get_stories`] is the single read path: serve cached
//! stories when enough exist, otherwise generate exactly the shortfall,
//! persist it, and opportunistically attach TTS audio. Generation never
//! fails the request — provider errors degrade to a static fallback story.

use anyhow::{anyhow, Result};
use base64::Engine;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::content::{Category, Epoch, Language, ALL_CATEGORIES, ALL_EPOCHS, ALL_LANGUAGES};
use crate::provider::{SpeechSynthesizer, StoryGenerator, StoryPrompt};
use crate::story::rotation;
use crate::story::store;
use crate::story::types::{AudioRecord, Story, StoryDraft};

/// Outcome of an [`StoryService::ensure_content`] sweep.
#[derive(Debug, Default)]
pub struct EnsureReport {
    pub keys_checked: usize,
    pub generated: usize,
    pub audio_repaired: usize,
}

pub struct StoryService {
    db: Arc<Mutex<Connection>>,
    generator: Arc<dyn StoryGenerator>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl StoryService {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        generator: Arc<dyn StoryGenerator>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            db,
            generator,
            synthesizer,
        }
    }

    pub fn db(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }

    /// Serve `count` stories for a key, generating the shortfall.
    ///
    /// Cached stories are served least-recently-used first; every serve bumps
    /// the story's use count atomically. When the cache already holds `count`
    /// stories, no generation call is made.
    pub async fn get_stories(
        &self,
        category: Category,
        epoch: Epoch,
        language: Language,
        count: usize,
    ) -> Result<Vec<Story>> {
        let mut served = {
            let conn = self.lock_db()?;
            let cached = store::find_stories(&conn, category, epoch, language, count)?;
            let mut served = Vec::with_capacity(count);
            for mut story in cached {
                let (use_count, last_used) = store::touch_story(&conn, &story.id)?;
                story.use_count = use_count;
                story.last_used = Some(last_used);
                served.push(story);
            }
            served
        };

        let shortfall = count.saturating_sub(served.len());
        if shortfall == 0 {
            return Ok(served);
        }

        info!(
            category = %category,
            epoch = %epoch,
            language = %language,
            cached = served.len(),
            shortfall,
            "cache miss, generating stories"
        );
        let generated = self
            .generate_batch(category, epoch, language, shortfall, true)
            .await?;
        served.extend(generated);
        Ok(served)
    }

    /// Force generation of `count` fresh stories, bypassing the cache check.
    pub async fn generate_stories(
        &self,
        category: Category,
        epoch: Epoch,
        language: Language,
        count: usize,
    ) -> Result<Vec<Story>> {
        self.generate_batch(category, epoch, language, count, true)
            .await
    }

    /// Generate, persist, and serve `count` stories.
    ///
    /// Figure slots follow the rotation policy over seeds that do not yet
    /// have a story for this key (one story per figure per key); slots beyond
    /// the available figures become plain positive-news stories. When `serve`
    /// is false (background top-up) new stories keep `use_count == 0` so they
    /// sort first on the next read.
    async fn generate_batch(
        &self,
        category: Category,
        epoch: Epoch,
        language: Language,
        count: usize,
        serve: bool,
    ) -> Result<Vec<Story>> {
        let figures: Vec<Option<(String, String)>> = {
            let conn = self.lock_db()?;
            let seeds = store::seeds_for(&conn, category, epoch)?;
            let usage = store::figure_usage(&conn, category, epoch, language)?;

            let mut slots: Vec<Option<(String, String)>> =
                rotation::next_figures(&seeds, &usage, seeds.len())
                    .into_iter()
                    .filter(|seed| !usage.contains_key(&seed.figure))
                    .take(count)
                    .map(|seed| Some((seed.figure.clone(), seed.context.clone())))
                    .collect();
            slots.resize(count, None);
            slots
        };

        let mut stories = Vec::with_capacity(count);
        for figure in figures {
            let story = self
                .generate_one(category, epoch, language, figure, serve)
                .await?;
            stories.push(story);
        }
        Ok(stories)
    }

    /// Generate one story, insert it, and attach audio best-effort.
    async fn generate_one(
        &self,
        category: Category,
        epoch: Epoch,
        language: Language,
        figure: Option<(String, String)>,
        serve: bool,
    ) -> Result<Story> {
        let prompt = StoryPrompt {
            category,
            epoch,
            language,
            figure: figure.clone(),
        };

        let draft = match self.generator.generate_story(&prompt).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(
                    category = %category,
                    epoch = %epoch,
                    error = %e,
                    "story generation failed, using fallback"
                );
                fallback_draft(category, language)
            }
        };

        let now = chrono::Utc::now().to_rfc3339();
        let mut story = Story {
            id: uuid::Uuid::now_v7().to_string(),
            category,
            epoch,
            language,
            headline: draft.headline,
            summary: draft.summary,
            full_text: draft.full_text,
            source: draft.source,
            figure: figure.map(|(name, _)| name),
            published_at: now.clone(),
            created_at: now,
            last_used: None,
            use_count: 0,
            has_audio: false,
        };

        {
            let conn = self.lock_db()?;
            store::insert_story(&conn, &story)?;
        }

        // TTS is opportunistic: failure leaves has_audio = 0 and never rolls
        // back the story insert.
        if self.attach_audio(&story).await? {
            story.has_audio = true;
        }

        if serve {
            let conn = self.lock_db()?;
            let (use_count, last_used) = store::touch_story(&conn, &story.id)?;
            story.use_count = use_count;
            story.last_used = Some(last_used);
        }
        Ok(story)
    }

    /// Synthesize and store audio for a story. Returns whether audio exists.
    async fn attach_audio(&self, story: &Story) -> Result<bool> {
        let Some(synthesizer) = &self.synthesizer else {
            return Ok(false);
        };

        match synthesizer.synthesize(&story.full_text, story.language).await {
            Ok(bytes) => {
                let audio = AudioRecord {
                    story_id: story.id.clone(),
                    audio_b64: base64::engine::general_purpose::STANDARD.encode(bytes),
                    voice: "alloy".into(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                };
                let conn = self.lock_db()?;
                store::insert_audio(&conn, &audio)?;
                Ok(true)
            }
            Err(e) => {
                warn!(story_id = %story.id, error = %e, "TTS generation failed");
                Ok(false)
            }
        }
    }

    /// Re-attempt TTS for stories that have none. Returns how many gained audio.
    pub async fn repair_missing_audio(&self, limit: usize) -> Result<usize> {
        let missing = {
            let conn = self.lock_db()?;
            store::stories_missing_audio(&conn, limit)?
        };

        let mut repaired = 0;
        for story in missing {
            if self.attach_audio(&story).await? {
                repaired += 1;
            }
        }
        Ok(repaired)
    }

    /// Walk every (category, epoch, language) key and top each up to `floor`
    /// cached stories, then repair missing audio.
    pub async fn ensure_content(&self, floor: usize) -> Result<EnsureReport> {
        let mut report = self.ensure_keys(&ALL_EPOCHS, floor).await?;
        report.audio_repaired = self.repair_missing_audio(usize::MAX).await?;
        Ok(report)
    }

    /// Top up every (category, language) key within one epoch.
    pub async fn ensure_epoch(&self, epoch: Epoch, floor: usize) -> Result<EnsureReport> {
        self.ensure_keys(&[epoch], floor).await
    }

    async fn ensure_keys(&self, epochs: &[Epoch], floor: usize) -> Result<EnsureReport> {
        let mut report = EnsureReport::default();

        for category in ALL_CATEGORIES {
            for &epoch in epochs {
                for language in ALL_LANGUAGES {
                    report.keys_checked += 1;
                    let existing = {
                        let conn = self.lock_db()?;
                        store::count_stories(&conn, category, epoch, language)?
                    };
                    if existing >= floor {
                        continue;
                    }
                    let generated = self
                        .generate_batch(category, epoch, language, floor - existing, false)
                        .await?;
                    report.generated += generated.len();
                }
            }
        }
        Ok(report)
    }

    fn lock_db(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| anyhow!("db lock poisoned: {e}"))
    }
}

/// Static story served when the provider is down or unusable.
pub fn fallback_draft(category: Category, language: Language) -> StoryDraft {
    let topic = category.as_str().to_lowercase();
    match language {
        Language::En => StoryDraft {
            headline: format!("Positive {} News", category.as_str()),
            summary: format!(
                "Great things are happening in {topic} that inspire hope and progress."
            ),
            full_text: format!(
                "The field of {topic} continues to show remarkable progress and positive \
                 developments. These advances demonstrate the incredible potential for \
                 positive change and innovation in our world."
            ),
            source: "AI Generated".into(),
        },
        Language::Es => StoryDraft {
            headline: format!("Noticias positivas de {}", category.as_str()),
            summary: format!(
                "Grandes avances en {topic} inspiran esperanza y progreso."
            ),
            full_text: format!(
                "El campo de {topic} sigue mostrando un progreso notable y desarrollos \
                 positivos. Estos avances demuestran el enorme potencial de cambio \
                 positivo e innovaci\u{f3}n en nuestro mundo."
            ),
            source: "AI Generated".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_mentions_category() {
        let draft = fallback_draft(Category::Space, Language::En);
        assert!(draft.headline.contains("Space"));
        assert!(draft.full_text.contains("space"));
        assert_eq!(draft.source, "AI Generated");
    }

    #[test]
    fn fallback_is_localized() {
        let draft = fallback_draft(Category::Science, Language::Es);
        assert!(draft.headline.starts_with("Noticias"));
    }
}
