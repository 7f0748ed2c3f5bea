//! Azure OpenAI chat and TTS clients.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::content::Language;
use crate::provider::{
    parse, ChatCompleter, ProviderError, SpeechSynthesizer, StoryGenerator, StoryPrompt,
    CHAT_SYSTEM_PROMPT, FIGURE_SYSTEM_PROMPT, NEWS_SYSTEM_PROMPT,
};
use crate::story::types::StoryDraft;

const CHAT_API_VERSION: &str = "2024-12-01-preview";
const TTS_API_VERSION: &str = "2025-03-01-preview";

pub struct AzureOpenAi {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    tts_deployment: String,
    voice: String,
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

impl AzureOpenAi {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config
            .azure_api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials("AZURE_OPENAI_API_KEY"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        // Endpoint must end with a slash so deployment paths append cleanly.
        let mut endpoint = config.azure_endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(Self {
            client,
            endpoint,
            deployment: config.azure_deployment.clone(),
            tts_deployment: config.azure_tts_deployment.clone(),
            voice: config.tts_voice.clone(),
            api_key,
        })
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}openai/deployments/{}/chat/completions?api-version={CHAT_API_VERSION}",
            self.endpoint, self.deployment
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&json!({
                "model": self.deployment,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "max_completion_tokens": 1000,
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
impl StoryGenerator for AzureOpenAi {
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
        &self.deployment
    }
}

#[async_trait]
impl ChatCompleter for AzureOpenAi {
    async fn complete(&self, message: &str) -> Result<String, ProviderError> {
        self.chat(CHAT_SYSTEM_PROMPT, message).await
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureOpenAi {
    async fn synthesize(
        &self,
        text: &str,
        _language: Language,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = format!(
            "{}openai/deployments/{}/audio/speech?api-version={TTS_API_VERSION}",
            self.endpoint, self.tts_deployment
        );

        // One voice for both languages; the model handles pronunciation.
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&json!({
                "model": self.tts_deployment,
                "input": text,
                "voice": self.voice,
                "response_format": "mp3",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
