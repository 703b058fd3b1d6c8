use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ExtractionStatus;

/// One versioned ingestion of a source control document.
///
/// Immutable once created (apart from derived modules/requirements).
/// Re-uploading under the same logical name creates a new catalog with the
/// next version number; old versions are superseded, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: Uuid,
    /// Logical catalog name; the version counter is scoped to this name.
    pub name: String,
    pub version: i64,
    /// Original filename of the uploaded PDF.
    pub filename: String,
    /// Where the uploaded PDF was stored on disk.
    pub storage_path: Option<String>,
    pub status: ExtractionStatus,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}
