//! Orb Game backend — cache-or-generate story pipeline with TTS audio and
//! figure imagery, served over HTTP.
//!
//! Stories are keyed by (category, epoch, language). A read checks the SQLite
//! cache first; shortfalls are generated through an external AI chat API,
//! persisted, and opportunistically voiced through a TTS API. Image
//! resolution maps a story's historical figure to stored portrait/gallery
//! metadata with category placeholders as the total fallback. A small
//! in-process memory keeps PII-scrubbed chat completions for reuse.
//!
//! # Architecture
//!
//! - **Storage**: SQLite; stories, audio payloads (base64 MP3), image
//!   metadata, and figure seeds in per-concern tables
//! - **Generation**: Azure OpenAI or Perplexity chat completions behind the
//!   [`provider::StoryGenerator`] seam; Azure TTS behind
//!   [`provider::SpeechSynthesizer`]
//! - **Selection**: unused-first, least-used, stalest-first rotation for
//!   both serving and figure assignment
//! - **Transport**: axum JSON API plus an operational CLI
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`content`] — Fixed category/epoch/language dimensions
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`story`] — Cache-or-generate pipeline: store, rotation, orchestration
//! - [`provider`] — External AI chat and TTS clients
//! - [`images`] — Figure image resolution with placeholder fallback
//! - [`chat`] — PII scrubbing and the in-process completion memory
//! - [`refresh`] — Owned background ensure-content task
//! - [`server`] — HTTP API

pub mod chat;
pub mod cli;
pub mod config;
pub mod content;
pub mod db;
pub mod images;
pub mod provider;
pub mod refresh;
pub mod server;
pub mod story;
