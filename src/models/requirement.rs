use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Classification;

/// One control statement under a module.
///
/// `title`/`description` hold the normalized text and may be rewritten by the
/// normalization engine in persist mode. `raw_title`/`raw_description` keep
/// the as-extracted originals for audit and are write-once: populated at
/// parse time (or on first normalization) and never overwritten afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub module_id: Uuid,
    /// Module-scoped identifier, e.g. `A1`.
    pub req_id: String,
    /// Composite display/lookup key: module code + requirement number +
    /// title + classification tag, e.g. `SYS.3.2.2.A1 Patchmanagement (B)`.
    pub code: String,
    pub title: String,
    pub raw_title: Option<String>,
    pub classification: Option<Classification>,
    /// True when the source marks the requirement as superseded
    /// (`ENTFALLEN` in the title, case-insensitive).
    pub is_obsolete: bool,
    pub description: String,
    pub raw_description: Option<String>,
    pub created_at: NaiveDateTime,
}
