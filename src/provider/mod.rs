//! External AI provider seam.
//!
//! Provides the [`StoryGenerator`] and [`SpeechSynthesizer`] traits and the
//! HTTP-backed implementations ([`azure`], [`perplexity`]). Providers are
//! created via [`create_generator`] / [`create_synthesizer`] from
//! configuration; everything above this module works against the traits, so
//! tests substitute counting mocks.

pub mod azure;
pub mod parse;
pub mod perplexity;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::{Category, Epoch, Language};
use crate::story::types::StoryDraft;

/// Errors from the external text-generation and TTS APIs.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// What to generate: a key plus an optional specific historical figure.
#[derive(Debug, Clone)]
pub struct StoryPrompt {
    pub category: Category,
    pub epoch: Epoch,
    pub language: Language,
    /// Figure name and grounding context; `None` for plain positive news.
    pub figure: Option<(String, String)>,
}

/// Generates one story's text from a prompt.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate_story(&self, prompt: &StoryPrompt) -> Result<StoryDraft, ProviderError>;

    /// Label recorded in the story's `source` field.
    fn label(&self) -> &str;
}

/// Converts story text to MP3 bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: Language)
        -> Result<Vec<u8>, ProviderError>;
}

/// Answers a free-form chat message (the `/api/chat` path).
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, ProviderError>;
}

/// Stand-in provider used when credentials are absent. Every call fails with
/// [`ProviderError::MissingCredentials`], so callers degrade to fallbacks
/// instead of the process refusing to start.
pub struct Disabled;

#[async_trait]
impl StoryGenerator for Disabled {
    async fn generate_story(&self, _prompt: &StoryPrompt) -> Result<StoryDraft, ProviderError> {
        Err(ProviderError::MissingCredentials("no generator configured"))
    }

    fn label(&self) -> &str {
        "offline"
    }
}

#[async_trait]
impl SpeechSynthesizer for Disabled {
    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
    ) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::MissingCredentials("no synthesizer configured"))
    }
}

#[async_trait]
impl ChatCompleter for Disabled {
    async fn complete(&self, _message: &str) -> Result<String, ProviderError> {
        Err(ProviderError::MissingCredentials("no chat backend configured"))
    }
}

/// Create a story generator from config.
///
/// Supported backends: `azure`, `perplexity`.
pub fn create_generator(
    config: &crate::config::ProviderConfig,
) -> anyhow::Result<Box<dyn StoryGenerator>> {
    match config.generator.as_str() {
        "azure" => Ok(Box::new(azure::AzureOpenAi::new(config)?)),
        "perplexity" => Ok(Box::new(perplexity::Perplexity::new(config)?)),
        other => anyhow::bail!("unknown generator backend: {other}. Supported: azure, perplexity"),
    }
}

/// Create a speech synthesizer from config. Azure is the only TTS backend.
pub fn create_synthesizer(
    config: &crate::config::ProviderConfig,
) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    Ok(Box::new(azure::AzureOpenAi::new(config)?))
}

/// Create a chat completer from config, mirroring [`create_generator`].
pub fn create_chat(
    config: &crate::config::ProviderConfig,
) -> anyhow::Result<Box<dyn ChatCompleter>> {
    match config.generator.as_str() {
        "azure" => Ok(Box::new(azure::AzureOpenAi::new(config)?)),
        "perplexity" => Ok(Box::new(perplexity::Perplexity::new(config)?)),
        other => anyhow::bail!("unknown generator backend: {other}. Supported: azure, perplexity"),
    }
}

/// System prompt for the free-form chat path.
pub(crate) const CHAT_SYSTEM_PROMPT: &str =
    "You are a friendly, concise assistant. Answer in the language of the question.";

/// System prompt for figure stories.
pub(crate) const FIGURE_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates engaging, educational stories about specific historical figures. You MUST focus on the exact historical figure mentioned and tell their story. Always include the historical figure's name in the headline and story. Focus on uplifting and inspiring content about their specific achievements and contributions. NEVER create generic stories.";

/// System prompt for plain positive-news stories.
pub(crate) const NEWS_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates engaging, positive news stories. Always focus on uplifting and inspiring content.";

/// Build the user prompt for a [`StoryPrompt`].
pub(crate) fn user_prompt(prompt: &StoryPrompt) -> String {
    let language_clause = match prompt.language {
        Language::En => "",
        Language::Es => " Write the story in Spanish.",
    };

    match &prompt.figure {
        Some((name, context)) => format!(
            "Generate a story about {name}, a historical figure in {category}.\n\n\
             Context: {context}\n\n\
             Tell the story of {name}: their specific achievements in {category}, how their \
             innovations changed the world during {epoch} times, their background and the \
             challenges they faced, and the lasting impact of their contributions. Make it \
             engaging and educational with concrete details about their life and work.\
             {language_clause} \
             Return ONLY a valid JSON object with this exact format: \
             {{ \"headline\": \"Brief headline mentioning the historical figure\", \
             \"summary\": \"One sentence summary\", \
             \"fullText\": \"2-3 sentence story about the historical figure\", \
             \"source\": \"AI Generated\" }}",
            category = prompt.category.as_str().to_lowercase(),
            epoch = prompt.epoch.as_str().to_lowercase(),
        ),
        None => format!(
            "Create a positive news story about {category}.{language_clause} \
             Return ONLY a valid JSON object with this exact format, no other text: \
             {{ \"headline\": \"Brief, engaging headline\", \
             \"summary\": \"One sentence summary of the story\", \
             \"fullText\": \"2-3 sentence detailed story with positive tone\", \
             \"source\": \"AI Generated\" }}",
            category = prompt.category.as_str(),
        ),
    }
}
