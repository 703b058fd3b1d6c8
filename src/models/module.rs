use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A control group inside a catalog, identified by its hierarchical code
/// (e.g. `SYS.3.2.2`).
///
/// Exactly one module exists per `(catalog_id, code)` — repeated occurrences
/// of a code in the source document merge into the first module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub catalog_id: Uuid,
    pub code: String,
    pub title: String,
    pub created_at: NaiveDateTime,
}
