//! Per-requirement normalization: one LLM attempt plus the deterministic
//! repair pipeline, with full audit flags.
//!
//! The computation is pure with respect to the store — it never writes.
//! Mode handling (persist vs. diagnose) lives in the job layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::LlmClient;
use crate::models::Requirement;
use crate::pipeline::cleanup::{clean_description, clean_title, contains_artifacts};

use super::validate::{parse_tagged_answer, reject_reason};

/// Corrector instruction. Formatting repairs only — any content change is a
/// validation failure. The answer format is fixed so it can be parsed
/// strictly.
pub const NORMALIZER_SYSTEM_PROMPT: &str = "\
Du bist ein Textkorrektor. Du darfst ausschließlich Worttrennung, \
Leerzeichen, Silbentrennung und Formatierung korrigieren. \
Du darfst KEINEN Inhalt verändern, KEINE Beispiele ergänzen, \
KEINE Tools/Produkte nennen und KEINE neuen Sätze hinzufügen. \
Erhalte Fachbegriffe, Codes und Norm-Begriffe (MUSS/SOLL/SOLLTE/DARF) unverändert. \
Aufzählungszeichen (•) bleiben am Zeilenanfang.\n\
\n\
Gib DEINE Antwort strikt in genau diesem Format zurück (ohne zusätzliche Zeilen davor/danach):\n\
<TITLE>\n\
...\n\
</TITLE>\n\
<DESCRIPTION>\n\
...\n\
</DESCRIPTION>";

/// Audit flags of one normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationFlags {
    /// The LLM answered (even if its answer was later rejected).
    pub llm_used: bool,
    /// The accepted LLM answer differs from the raw text.
    pub llm_changed: bool,
    /// The LLM answered but the answer failed validation.
    pub llm_rejected: bool,
    pub llm_reject_reason: Option<String>,
    /// The deterministic repair pipeline ran (always true today).
    pub heuristic_used: bool,
    pub artifact_before: bool,
    pub artifact_after: bool,
}

/// Full result of normalizing one requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementNormalization {
    pub requirement_id: Uuid,
    pub req_id: String,
    pub raw_title: String,
    pub raw_description: String,
    /// Accepted LLM text; equals raw when the call failed or was rejected.
    pub llm_title: String,
    pub llm_description: String,
    pub final_title: String,
    pub final_description: String,
    pub flags: NormalizationFlags,
}

fn build_user_prompt(raw_title: &str, raw_description: &str) -> String {
    format!(
        "Titel (Original):\n<<<\n{raw_title}\n>>>\n\nBeschreibung (Original):\n<<<\n{raw_description}\n>>>"
    )
}

/// Normalize one requirement: capture raw text, attempt the LLM rewrite,
/// validate it, run the repair heuristics, compute artifact flags.
pub fn normalize_requirement(
    llm: &dyn LlmClient,
    model: &str,
    req: &Requirement,
) -> RequirementNormalization {
    // Raw text is the write-once original where present, else current text.
    let raw_title = req.raw_title.clone().unwrap_or_else(|| req.title.clone());
    let raw_description = req
        .raw_description
        .clone()
        .unwrap_or_else(|| req.description.clone());

    let mut flags = NormalizationFlags::default();
    let mut llm_title = raw_title.clone();
    let mut llm_description = raw_description.clone();

    if !raw_title.is_empty() || !raw_description.is_empty() {
        match llm.chat(
            model,
            NORMALIZER_SYSTEM_PROMPT,
            &build_user_prompt(&raw_title, &raw_description),
        ) {
            Err(e) => {
                flags.llm_reject_reason = Some(format!("llm_error:{e}"));
            }
            Ok(answer) if answer.is_empty() => {
                // Empty answer means "no changes"
                flags.llm_used = true;
            }
            Ok(answer) => {
                flags.llm_used = true;
                match parse_tagged_answer(&answer) {
                    None => {
                        flags.llm_rejected = true;
                        flags.llm_reject_reason = Some("unparseable_output".to_string());
                    }
                    Some(parsed) => {
                        // Candidates may not become empty
                        let cand_title = if parsed.title.is_empty() {
                            raw_title.clone()
                        } else {
                            parsed.title
                        };
                        let cand_description = if parsed.description.is_empty() {
                            raw_description.clone()
                        } else {
                            parsed.description
                        };

                        match reject_reason(
                            &raw_title,
                            &raw_description,
                            &cand_title,
                            &cand_description,
                        ) {
                            Some(reason) => {
                                flags.llm_rejected = true;
                                flags.llm_reject_reason = Some(reason);
                            }
                            None => {
                                flags.llm_changed = cand_title.trim() != raw_title.trim()
                                    || cand_description.trim() != raw_description.trim();
                                llm_title = cand_title;
                                llm_description = cand_description;
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(reason) = &flags.llm_reject_reason {
        tracing::debug!(
            requirement = %req.id,
            reason = %reason,
            "LLM normalization answer not used"
        );
    }

    // Heuristics always run — on the accepted LLM text, or on raw text when
    // the call failed or was rejected.
    let final_title = clean_title(&llm_title);
    let final_description = clean_description(&llm_description);
    flags.heuristic_used = true;
    flags.artifact_before = contains_artifacts(&raw_title) || contains_artifacts(&raw_description);
    flags.artifact_after =
        contains_artifacts(&final_title) || contains_artifacts(&final_description);

    RequirementNormalization {
        requirement_id: req.id,
        req_id: req.req_id.clone(),
        raw_title,
        raw_description,
        llm_title,
        llm_description,
        final_title,
        final_description,
        flags,
    }
}
