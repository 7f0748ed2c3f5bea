//! Salvaging parser for model-produced story JSON.
//!
//! Chat models are asked for bare JSON but routinely wrap it in prose or
//! code fences. [`parse_draft`] tries a strict parse first, then extracts the
//! outermost brace-delimited span and retries before giving up.

use regex::Regex;
use std::sync::LazyLock;

use crate::provider::ProviderError;
use crate::story::types::StoryDraft;

/// Outermost `{ ... }` span, spanning newlines.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Parse a story draft from raw model output.
pub fn parse_draft(content: &str) -> Result<StoryDraft, ProviderError> {
    if let Ok(draft) = serde_json::from_str::<StoryDraft>(content) {
        return Ok(draft);
    }

    let span = JSON_SPAN
        .find(content)
        .ok_or_else(|| ProviderError::Malformed(preview(content)))?;

    serde_json::from_str(span.as_str()).map_err(|e| {
        ProviderError::Malformed(format!("{e} in extracted JSON: {}", preview(span.as_str())))
    })
}

fn preview(content: &str) -> String {
    let end = content
        .char_indices()
        .take_while(|(i, _)| *i < 120)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(content.len());
    content[..end].to_string()
}
