pub mod ollama;

pub use ollama::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("Ollama endpoint /api/chat not found (404) — check the configured base URL")]
    EndpointNotFound,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
