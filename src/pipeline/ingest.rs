//! Catalog ingestion: PDF bytes → stored catalog with modules and
//! requirements.
//!
//! Extraction trouble never aborts an upload — the catalog row is always
//! created and carries the extraction status, so a broken PDF shows up as an
//! `error` catalog with zero modules instead of a lost request. All rows of
//! one ingestion are written in a single transaction.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_PDF_BYTES;
use crate::db::repository::{
    insert_catalog, insert_module, insert_requirement, next_catalog_version,
};
use crate::db::DatabaseError;
use crate::models::{Catalog, ExtractionStatus, Module, Requirement};
use crate::pipeline::extraction::{
    extract_pdf_text_with, PdfiumTextSource, PdfTextSource, SequentialTextSource,
};
use crate::pipeline::parser::parse_catalog;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to store source PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Outcome of one catalog upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub catalog_id: Uuid,
    pub version: i64,
    pub status: ExtractionStatus,
    pub reason: Option<String>,
    pub module_count: usize,
    pub requirement_count: usize,
}

/// Ingest one catalog PDF under a logical name.
pub fn ingest_catalog(
    conn: &mut Connection,
    storage_dir: &Path,
    name: &str,
    filename: &str,
    pdf_bytes: &[u8],
) -> Result<IngestReport, IngestError> {
    ingest_catalog_with(
        conn,
        &PdfiumTextSource,
        &SequentialTextSource,
        storage_dir,
        name,
        filename,
        pdf_bytes,
    )
}

/// Same as [`ingest_catalog`], with injectable extractors for testing.
pub fn ingest_catalog_with(
    conn: &mut Connection,
    primary: &dyn PdfTextSource,
    fallback: &dyn PdfTextSource,
    storage_dir: &Path,
    name: &str,
    filename: &str,
    pdf_bytes: &[u8],
) -> Result<IngestReport, IngestError> {
    if pdf_bytes.len() > MAX_PDF_BYTES {
        return Err(IngestError::TooLarge {
            size: pdf_bytes.len(),
            limit: MAX_PDF_BYTES,
        });
    }

    let catalog_id = Uuid::new_v4();
    let storage_path = store_source_pdf(storage_dir, &catalog_id, filename, pdf_bytes)?;

    let extracted = extract_pdf_text_with(primary, fallback, pdf_bytes);
    let mut status = extracted.status;
    let mut reason = extracted.reason.clone();

    let parsed = if status == ExtractionStatus::Error {
        None
    } else {
        let parsed = parse_catalog(&extracted.text);
        if parsed.module_count() == 0 && status == ExtractionStatus::Ok {
            status = ExtractionStatus::Partial;
            reason = Some("No modules recognized".to_string());
        } else if parsed.is_degraded() && status == ExtractionStatus::Ok {
            status = ExtractionStatus::Partial;
            reason = Some(format!(
                "{} requirement line(s) outside any module were discarded",
                parsed.orphan_lines
            ));
        }
        Some(parsed)
    };

    let now = Utc::now().naive_utc();
    let version = next_catalog_version(conn, name)?;
    let catalog = Catalog {
        id: catalog_id,
        name: name.to_string(),
        version,
        filename: filename.to_string(),
        storage_path: Some(storage_path.to_string_lossy().into_owned()),
        status,
        reason: reason.clone(),
        created_at: now,
    };

    let mut module_count = 0;
    let mut requirement_count = 0;

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    insert_catalog(&tx, &catalog)?;
    if let Some(parsed) = parsed {
        for parsed_module in &parsed.modules {
            let module = Module {
                id: Uuid::new_v4(),
                catalog_id,
                code: parsed_module.code.clone(),
                title: parsed_module.title.clone(),
                created_at: now,
            };
            insert_module(&tx, &module)?;
            module_count += 1;

            for parsed_req in &parsed_module.requirements {
                // Raw fields seed from the as-extracted text; the normalizer
                // never overwrites them once set.
                let requirement = Requirement {
                    id: Uuid::new_v4(),
                    module_id: module.id,
                    req_id: parsed_req.req_id.clone(),
                    code: parsed_req.code.clone(),
                    title: parsed_req.title.clone(),
                    raw_title: Some(parsed_req.title.clone()),
                    classification: parsed_req.classification,
                    is_obsolete: parsed_req.is_obsolete,
                    description: parsed_req.description.clone(),
                    raw_description: Some(parsed_req.description.clone()),
                    created_at: now,
                };
                insert_requirement(&tx, &requirement)?;
                requirement_count += 1;
            }
        }
    }
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        catalog = %catalog_id,
        name,
        version,
        status = status.as_str(),
        modules = module_count,
        requirements = requirement_count,
        "Catalog ingested"
    );

    Ok(IngestReport {
        catalog_id,
        version,
        status,
        reason,
        module_count,
        requirement_count,
    })
}

/// Persist the uploaded PDF under `{catalog_id}_{filename}`.
fn store_source_pdf(
    storage_dir: &Path,
    catalog_id: &Uuid,
    filename: &str,
    pdf_bytes: &[u8],
) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(storage_dir)?;
    let path = storage_dir.join(format!("{catalog_id}_{filename}"));
    std::fs::write(&path, pdf_bytes)?;
    Ok(path)
}
