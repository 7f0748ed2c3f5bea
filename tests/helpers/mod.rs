#![allow(dead_code)]

use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use orbgame::content::{Category, Epoch, Language};
use orbgame::db;
use orbgame::provider::{
    ChatCompleter, ProviderError, SpeechSynthesizer, StoryGenerator, StoryPrompt,
};
use orbgame::story::service::StoryService;
use orbgame::story::store;
use orbgame::story::types::{FigureSeed, StoryDraft};

/// Counting story generator with deterministic output.
pub struct MockGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryGenerator for MockGenerator {
    async fn generate_story(&self, prompt: &StoryPrompt) -> Result<StoryDraft, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Http {
                status: 500,
                body: "mock outage".into(),
            });
        }
        let subject = prompt
            .figure
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| format!("{} breakthrough", prompt.category));
        Ok(StoryDraft {
            headline: format!("{subject}: story {n}"),
            summary: format!("Summary {n} about {subject}."),
            full_text: format!("Full text {n} about {subject} in the {} era.", prompt.epoch),
            source: "mock".into(),
        })
    }

    fn label(&self) -> &str {
        "mock"
    }
}

/// Counting speech synthesizer.
pub struct MockSynthesizer {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
    ) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Http {
                status: 500,
                body: "mock tts outage".into(),
            });
        }
        Ok(vec![0x49, 0x44, 0x33, 0x04]) // ID3 header bytes
    }
}

/// Echoing chat completer.
pub struct MockChat {
    pub calls: AtomicUsize,
}

impl MockChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompleter for MockChat {
    async fn complete(&self, message: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("echo: {message}"))
    }
}

/// A story service over a fresh in-memory database.
pub fn test_service(
    generator: Arc<MockGenerator>,
    synthesizer: Option<Arc<MockSynthesizer>>,
) -> Arc<StoryService> {
    let conn = db::open_memory_database().unwrap();
    let db = Arc::new(Mutex::new(conn));
    let synthesizer = synthesizer.map(|s| s as Arc<dyn SpeechSynthesizer>);
    Arc::new(StoryService::new(db, generator, synthesizer))
}

/// Insert figure seeds for one (category, epoch).
pub fn seed_figures(conn: &Connection, category: Category, epoch: Epoch, names: &[&str]) {
    for name in names {
        store::insert_seed(
            conn,
            &FigureSeed {
                figure: (*name).into(),
                category,
                epoch,
                context: format!("{name} context"),
            },
        )
        .unwrap();
    }
}
