//! HTTP API over axum.
//!
//! [`serve`] wires the database, providers, story service, and chat memory
//! into a running server with graceful shutdown. [`router`] is separate so
//! integration tests can drive handlers against in-memory state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

use crate::chat::memory::MemoryStore;
use crate::config::OrbConfig;
use crate::content::{Category, Epoch, Language};
use crate::db;
use crate::images;
use crate::provider::{self, ChatCompleter};
use crate::refresh::RefreshTask;
use crate::story::service::StoryService;
use crate::story::store;

/// Most stories a single request may serve or generate.
const MAX_COUNT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StoryService>,
    pub memory: Arc<Mutex<MemoryStore>>,
    pub chat: Arc<dyn ChatCompleter>,
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(msg: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.to_string() })))
}

fn unavailable(context: &str, e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "{context}");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": format!("{context} is temporarily unavailable") })),
    )
}

fn not_found(msg: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": msg })))
}

#[derive(Debug, Deserialize, Default)]
struct StoryQuery {
    epoch: Option<String>,
    language: Option<String>,
    count: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateBody {
    #[serde(default)]
    epoch: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    count: Option<usize>,
}

struct StoryKey {
    category: Category,
    epoch: Epoch,
    language: Language,
    count: usize,
}

fn parse_key(
    category: &str,
    epoch: Option<&str>,
    language: Option<&str>,
    count: Option<usize>,
) -> Result<StoryKey, ApiError> {
    let category: Category = category.parse().map_err(bad_request)?;
    let epoch: Epoch = epoch.unwrap_or("Modern").parse().map_err(bad_request)?;
    let language: Language = language.unwrap_or("en").parse().map_err(bad_request)?;
    let count = count.unwrap_or(1);
    if count == 0 || count > MAX_COUNT {
        return Err(bad_request(format!("count must be between 1 and {MAX_COUNT}")));
    }
    Ok(StoryKey {
        category,
        epoch,
        language,
        count,
    })
}

/// Build the API router around shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/orb/positive-news/{category}", get(positive_news))
        .route("/api/orb/generate-news/{category}", post(generate_news))
        .route("/api/orb/stories-with-images/{category}", get(stories_with_images))
        .route("/api/orb/images/stats", get(images_stats))
        .route("/api/orb/audio/{story_id}", get(story_audio))
        .route("/api/chat", post(chat))
        .route("/api/memory/search", post(memory_search))
        .route("/api/memory/stats", get(memory_stats))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state.service.db();
    let conn = db.lock().map_err(|e| unavailable("storage", e))?;
    let stories = store::story_count(&conn).map_err(|e| unavailable("storage", e))?;
    Ok(Json(json!({ "status": "healthy", "stories": stories })))
}

async fn positive_news(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<StoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let key = parse_key(
        &category,
        query.epoch.as_deref(),
        query.language.as_deref(),
        query.count,
    )?;

    let stories = state
        .service
        .get_stories(key.category, key.epoch, key.language, key.count)
        .await
        .map_err(|e| unavailable("story service", e))?;
    Ok(Json(json!(stories)))
}

async fn generate_news(
    State(state): State<AppState>,
    Path(category): Path<String>,
    body: Option<Json<GenerateBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let key = parse_key(
        &category,
        body.epoch.as_deref(),
        body.language.as_deref(),
        body.count,
    )?;

    let stories = state
        .service
        .generate_stories(key.category, key.epoch, key.language, key.count)
        .await
        .map_err(|e| unavailable("story service", e))?;
    Ok(Json(json!(stories)))
}

async fn stories_with_images(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<StoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let key = parse_key(
        &category,
        query.epoch.as_deref(),
        query.language.as_deref(),
        query.count,
    )?;

    let stories = state
        .service
        .get_stories(key.category, key.epoch, key.language, key.count)
        .await
        .map_err(|e| unavailable("story service", e))?;

    let db = state.service.db();
    let conn = db.lock().map_err(|e| unavailable("storage", e))?;
    let mut enriched = Vec::with_capacity(stories.len());
    for story in stories {
        let images = images::resolve::images_for_story(&conn, &story, key.category)
            .map_err(|e| unavailable("image resolution", e))?;
        enriched.push(json!({ "story": story, "images": images }));
    }
    Ok(Json(json!(enriched)))
}

async fn images_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state.service.db();
    let conn = db.lock().map_err(|e| unavailable("storage", e))?;
    let stats = images::store::image_stats(&conn).map_err(|e| unavailable("storage", e))?;
    Ok(Json(json!(stats)))
}

async fn story_audio(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = state.service.db();
    let conn = db.lock().map_err(|e| unavailable("storage", e))?;
    match store::get_audio(&conn, &story_id).map_err(|e| unavailable("storage", e))? {
        Some(audio) => Ok(Json(json!(audio))),
        None => Err(not_found("no audio for that story")),
    }
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    message: String,
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<Value>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    // Memory first — a remembered answer skips the provider entirely.
    {
        let mut memory = state.memory.lock().map_err(|e| unavailable("memory", e))?;
        if let Some(entry) = memory.retrieve(&body.message) {
            return Ok(Json(json!({ "response": entry.answer, "fromMemory": true })));
        }
    }

    let answer = match state.chat.complete(&body.message).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "chat completion failed");
            return Err(unavailable("chat", e));
        }
    };

    let mut memory = state.memory.lock().map_err(|e| unavailable("memory", e))?;
    memory.store(&body.message, &answer);
    Ok(Json(json!({ "response": answer, "fromMemory": false })))
}

#[derive(Debug, Deserialize)]
struct MemorySearchBody {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn memory_search(
    State(state): State<AppState>,
    Json(body): Json<MemorySearchBody>,
) -> Result<Json<Value>, ApiError> {
    let memory = state.memory.lock().map_err(|e| unavailable("memory", e))?;
    let results = memory.search(&body.query, body.limit.unwrap_or(10));
    Ok(Json(json!({ "results": results })))
}

async fn memory_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let memory = state.memory.lock().map_err(|e| unavailable("memory", e))?;
    Ok(Json(json!(memory.stats())))
}

/// Open the database, create providers, and run the server until ctrl-c.
pub async fn serve(config: OrbConfig) -> anyhow::Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;

    // Surface a generator change: cached stories may read differently.
    if let Ok(Some(stored)) = db::migrations::get_generator_model(&conn) {
        if stored != config.providers.azure_deployment {
            warn!(
                stored = %stored,
                configured = %config.providers.azure_deployment,
                "generator deployment changed — cached stories were produced by the old one"
            );
        }
    }

    let db = Arc::new(Mutex::new(conn));

    let generator = match provider::create_generator(&config.providers) {
        Ok(generator) => Arc::from(generator),
        Err(e) => {
            warn!(error = %e, "no story generator available, serving fallback stories");
            Arc::new(provider::Disabled) as Arc<dyn provider::StoryGenerator>
        }
    };
    let synthesizer = match provider::create_synthesizer(&config.providers) {
        Ok(synthesizer) => Some(Arc::from(synthesizer)),
        Err(e) => {
            warn!(error = %e, "no speech synthesizer available, stories will lack audio");
            None
        }
    };
    let chat: Arc<dyn ChatCompleter> = match provider::create_chat(&config.providers) {
        Ok(chat) => Arc::from(chat),
        Err(_) => Arc::new(provider::Disabled),
    };

    let service = Arc::new(StoryService::new(db, generator, synthesizer));
    let memory = Arc::new(Mutex::new(MemoryStore::new(
        config.memory.max_entries,
        config.memory.similarity_threshold,
    )));

    let refresh = if config.refresh.enabled {
        Some(RefreshTask::spawn(
            Arc::clone(&service),
            std::time::Duration::from_secs(config.refresh.interval_minutes * 60),
            config.refresh.stories_per_key,
        ))
    } else {
        None
    };

    let state = AppState {
        service,
        memory,
        chat,
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Orb Game backend listening at http://{bind_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    if let Some(refresh) = refresh {
        refresh.shutdown().await;
    }
    Ok(())
}
