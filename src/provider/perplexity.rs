//! Perplexity chat client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::provider::{
    parse, ChatCompleter, ProviderError, StoryGenerator, StoryPrompt, CHAT_SYSTEM_PROMPT,
    FIGURE_SYSTEM_PROMPT, NEWS_SYSTEM_PROMPT,
};
use crate::story::types::StoryDraft;

const API_URL: &str = "https://api.perplexity.ai/chat/completions";

pub struct Perplexity {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl Perplexity {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config
            .perplexity_api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials("PERPLEXITY_API_KEY"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            model: config.perplexity_model.clone(),
            api_key,
        })
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "stream": false,
                "max_tokens": 800,
                "temperature": 0.7,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("empty choices array".into()))
    }
}

#[async_trait]
impl StoryGenerator for Perplexity {
    async fn generate_story(&self, prompt: &StoryPrompt) -> Result<StoryDraft, ProviderError> {
        let system = if prompt.figure.is_some() {
            FIGURE_SYSTEM_PROMPT
        } else {
            NEWS_SYSTEM_PROMPT
        };
        let content = self.chat(system, &super::user_prompt(prompt)).await?;
        parse::parse_draft(&content)
    }

    fn label(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompleter for Perplexity {
    async fn complete(&self, message: &str) -> Result<String, ProviderError> {
        self.chat(CHAT_SYSTEM_PROMPT, message).await
    }
}
