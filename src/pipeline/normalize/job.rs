//! Catalog-level normalization runs.
//!
//! One pure computation per requirement ([`normalize_requirement`]), a thin
//! write policy per mode at the end of each iteration:
//!
//! - `Dev`: nothing is persisted; the job result is a full diagnostic. If
//!   artifacts remain, the job still completes but carries a warning — a run
//!   that leaves imperfections never looks like a silent full success.
//! - `Prod`: the final text is written per requirement (all-or-nothing row
//!   update, raw fields filled once). An unreachable LLM or a rejected
//!   answer fails the whole job; there is no silent heuristic-only fallback
//!   in persist mode.
//!
//! The runner reports progress after every requirement and honors the
//! cancellation flag between requirements — a cancelled run is a valid,
//! resumable partial state.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::{apply_normalization, get_catalog, list_requirements_for_catalog};
use crate::jobs::{CancelFlag, Job, JobStore};
use crate::llm::LlmClient;

use super::normalizer::{normalize_requirement, RequirementNormalization};
use super::NormalizeError;

/// Whether a run persists its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Diagnostic only, no writes.
    Dev,
    /// Persist final text; strict failure semantics.
    Prod,
}

impl From<crate::config::EnvProfile> for NormalizeMode {
    fn from(profile: crate::config::EnvProfile) -> Self {
        if profile.is_prod() {
            Self::Prod
        } else {
            Self::Dev
        }
    }
}

/// Aggregate counters over one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationSummary {
    pub total: usize,
    pub llm_used_count: usize,
    pub llm_changed_count: usize,
    pub heuristic_used_count: usize,
    pub artifact_remaining_count: usize,
}

impl NormalizationSummary {
    fn add(&mut self, result: &RequirementNormalization) {
        self.total += 1;
        if result.flags.llm_used {
            self.llm_used_count += 1;
        }
        if result.flags.llm_changed {
            self.llm_changed_count += 1;
        }
        if result.flags.heuristic_used {
            self.heuristic_used_count += 1;
        }
        if result.flags.artifact_after {
            self.artifact_remaining_count += 1;
        }
    }
}

/// Completed run: per-requirement results plus the aggregate summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationRun {
    pub requirements: Vec<RequirementNormalization>,
    pub summary: NormalizationSummary,
}

/// Run a normalization job over a catalog, optionally scoped to one module
/// code. Progress, result and failure are recorded on the given job.
pub fn run_normalize_job(
    conn: &Connection,
    llm: &dyn LlmClient,
    model: &str,
    job_store: &dyn JobStore,
    job_id: &Uuid,
    catalog_id: &Uuid,
    module_code: Option<&str>,
    mode: NormalizeMode,
    cancel: &CancelFlag,
) -> Result<NormalizationRun, NormalizeError> {
    let Some(mut job) = job_store.get(job_id) else {
        tracing::warn!(job = %job_id, "Normalize job not found in store");
        return Ok(NormalizationRun::default());
    };

    job.start();
    job_store.update(&job);

    match normalize_catalog(
        conn, llm, model, job_store, &mut job, catalog_id, module_code, mode, cancel,
    ) {
        Ok(Some(run)) => {
            let warning = (mode == NormalizeMode::Dev && run.summary.artifact_remaining_count > 0)
                .then(|| {
                    format!(
                        "WARN: Normalization incomplete for {}/{} requirements; artifacts remain.",
                        run.summary.artifact_remaining_count, run.summary.total
                    )
                });
            job.complete(serde_json::json!({
                "requirements": run.requirements,
                "summary": run.summary,
            }));
            job.error = warning;
            job_store.update(&job);
            tracing::info!(
                job = %job_id,
                total = run.summary.total,
                llm_used = run.summary.llm_used_count,
                artifacts_remaining = run.summary.artifact_remaining_count,
                "Normalization job completed"
            );
            Ok(run)
        }
        Ok(None) => {
            // Cancelled between requirements: valid partial state.
            job.cancel();
            job_store.update(&job);
            tracing::info!(job = %job_id, "Normalization job cancelled");
            Ok(NormalizationRun::default())
        }
        Err(e) => {
            job.fail(e.to_string());
            job_store.update(&job);
            tracing::warn!(job = %job_id, error = %e, "Normalization job failed");
            Err(e)
        }
    }
}

/// Iterate the catalog's requirements. `Ok(None)` signals cancellation.
#[allow(clippy::too_many_arguments)]
fn normalize_catalog(
    conn: &Connection,
    llm: &dyn LlmClient,
    model: &str,
    job_store: &dyn JobStore,
    job: &mut Job,
    catalog_id: &Uuid,
    module_code: Option<&str>,
    mode: NormalizeMode,
    cancel: &CancelFlag,
) -> Result<Option<NormalizationRun>, NormalizeError> {
    if get_catalog(conn, catalog_id)?.is_none() {
        return Err(NormalizeError::CatalogNotFound(*catalog_id));
    }

    let requirements = list_requirements_for_catalog(conn, catalog_id, module_code)?;
    let total = requirements.len();
    let mut run = NormalizationRun::default();

    if total == 0 {
        return Ok(Some(run));
    }

    for (idx, req) in requirements.iter().enumerate() {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let result = normalize_requirement(llm, model, req);

        if mode == NormalizeMode::Prod {
            // Persist mode is strict: no LLM, no write.
            if !result.flags.llm_used {
                let cause = result
                    .flags
                    .llm_reject_reason
                    .clone()
                    .unwrap_or_else(|| "llm_used=false".to_string());
                job.progress = idx as f32 / total as f32;
                return Err(NormalizeError::LlmUnreachable(cause));
            }
            if result.flags.llm_rejected {
                let cause = result
                    .flags
                    .llm_reject_reason
                    .clone()
                    .unwrap_or_else(|| "rejected".to_string());
                job.progress = idx as f32 / total as f32;
                return Err(NormalizeError::LlmRejected(cause));
            }
            apply_normalization(
                conn,
                &result.requirement_id,
                &result.final_title,
                &result.final_description,
            )?;
        }

        run.summary.add(&result);
        run.requirements.push(result);

        job.progress = (idx + 1) as f32 / total as f32;
        job_store.update(job);
    }

    Ok(Some(run))
}

/// Preview: normalize the first `limit` requirements of a catalog (or one
/// module) without touching the store, for inspection before a full run.
pub fn preview_normalization(
    conn: &Connection,
    llm: &dyn LlmClient,
    model: &str,
    catalog_id: &Uuid,
    module_code: Option<&str>,
    limit: usize,
) -> Result<Vec<RequirementNormalization>, NormalizeError> {
    if get_catalog(conn, catalog_id)?.is_none() {
        return Err(NormalizeError::CatalogNotFound(*catalog_id));
    }

    let requirements = list_requirements_for_catalog(conn, catalog_id, module_code)?;
    Ok(requirements
        .iter()
        .take(limit)
        .map(|req| normalize_requirement(llm, model, req))
        .collect())
}
