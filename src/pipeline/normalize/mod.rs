pub mod job;
pub mod normalizer;
pub mod validate;

pub use job::*;
pub use normalizer::*;
pub use validate::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("LLM unreachable: {0}")]
    LlmUnreachable(String),

    #[error("LLM answer rejected: {0}")]
    LlmRejected(String),

    #[error("Catalog not found: {0}")]
    CatalogNotFound(uuid::Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
