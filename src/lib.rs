//! grundkat — structured ingestion and normalization of IT-Grundschutz
//! control catalogs.
//!
//! The crate turns regulatory catalog PDFs into a queryable hierarchy of
//! catalogs, modules and requirements, then repairs extraction damage
//! (hyphenation, lost spacing, broken line wraps) with a deterministic
//! heuristic pipeline plus an optional LLM pass — without ever altering the
//! normative meaning of the text. Web routing, authentication and task
//! scheduling live in the embedding service; this crate exposes the
//! synchronous core they call into.

pub mod config;
pub mod db;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for embedders that do not bring their own subscriber.
/// Respects `RUST_LOG`, falls back to the crate default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
