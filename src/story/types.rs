//! Core story type definitions.
//!
//! Defines [`Story`] (a cached record), [`StoryDraft`] (generated text before
//! persistence), [`AudioRecord`] (a story's TTS payload), and [`FigureSeed`]
//! (a rotation candidate).

use serde::{Deserialize, Serialize};

use crate::content::{Category, Epoch, Language};

/// A cached story record, matching the `stories` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    pub category: Category,
    pub epoch: Epoch,
    pub language: Language,
    pub headline: String,
    pub summary: String,
    /// Full narrative text, the TTS input.
    pub full_text: String,
    /// Label of whatever produced the text (deployment name or "AI Generated").
    pub source: String,
    /// Historical figure the story is about. `None` for plain positive news.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<String>,
    /// ISO 8601 publication timestamp.
    pub published_at: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp of the last serve, or `None` if never served.
    pub last_used: Option<String>,
    /// Number of times this story has been served.
    pub use_count: u32,
    /// Whether a TTS payload exists in `story_audio`.
    pub has_audio: bool,
}

/// Generated story text before it becomes a persisted [`Story`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDraft {
    pub headline: String,
    pub summary: String,
    #[serde(rename = "fullText")]
    pub full_text: String,
    pub source: String,
}

/// A story's TTS audio, stored separately from the text record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRecord {
    pub story_id: String,
    /// Base64-encoded MP3.
    pub audio_b64: String,
    pub voice: String,
    pub created_at: String,
}

/// A historical figure eligible for story generation in one (category, epoch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureSeed {
    pub figure: String,
    pub category: Category,
    pub epoch: Epoch,
    /// Short blurb handed to the generator as grounding context.
    #[serde(default)]
    pub context: String,
}
