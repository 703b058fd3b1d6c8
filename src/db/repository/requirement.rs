use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DATETIME_FORMAT;
use crate::db::DatabaseError;
use crate::models::{Classification, Requirement};

const REQUIREMENT_COLUMNS: &str = "id, module_id, req_id, code, title, raw_title, classification,
     is_obsolete, description, raw_description, created_at";

pub fn insert_requirement(conn: &Connection, req: &Requirement) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO requirements (id, module_id, req_id, code, title, raw_title, classification,
         is_obsolete, description, raw_description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            req.id.to_string(),
            req.module_id.to_string(),
            req.req_id,
            req.code,
            req.title,
            req.raw_title,
            req.classification.map(|c| c.as_str()),
            req.is_obsolete as i32,
            req.description,
            req.raw_description,
            req.created_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_requirement(conn: &Connection, id: &Uuid) -> Result<Option<Requirement>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUIREMENT_COLUMNS} FROM requirements WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id.to_string()], requirement_row);

    match result {
        Ok(req) => Ok(Some(req)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All requirements of a module, sorted by req_id.
pub fn list_requirements(
    conn: &Connection,
    module_id: &Uuid,
) -> Result<Vec<Requirement>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUIREMENT_COLUMNS} FROM requirements WHERE module_id = ?1 ORDER BY req_id"
    ))?;
    let rows = stmt.query_map(params![module_id.to_string()], requirement_row)?;

    let mut requirements = Vec::new();
    for row in rows {
        requirements.push(row?);
    }
    Ok(requirements)
}

/// All requirements of a catalog, optionally scoped to one module code.
/// Ordered by module code, then req_id — the order normalization jobs walk.
pub fn list_requirements_for_catalog(
    conn: &Connection,
    catalog_id: &Uuid,
    module_code: Option<&str>,
) -> Result<Vec<Requirement>, DatabaseError> {
    let sql = format!(
        "SELECT r.id, r.module_id, r.req_id, r.code, r.title, r.raw_title, r.classification,
         r.is_obsolete, r.description, r.raw_description, r.created_at
         FROM requirements r
         JOIN modules m ON m.id = r.module_id
         WHERE m.catalog_id = ?1 {}
         ORDER BY m.code, r.req_id",
        if module_code.is_some() {
            "AND m.code = ?2"
        } else {
            ""
        }
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut requirements = Vec::new();
    match module_code {
        Some(code) => {
            let rows = stmt.query_map(params![catalog_id.to_string(), code], requirement_row)?;
            for row in rows {
                requirements.push(row?);
            }
        }
        None => {
            let rows = stmt.query_map(params![catalog_id.to_string()], requirement_row)?;
            for row in rows {
                requirements.push(row?);
            }
        }
    }
    Ok(requirements)
}

pub fn count_requirements(conn: &Connection, catalog_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM requirements r
         JOIN modules m ON m.id = r.module_id
         WHERE m.catalog_id = ?1",
        params![catalog_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Persist a normalization result for one requirement.
///
/// Single statement, so the write is all-or-nothing: raw fields are filled
/// from the current text only where still NULL (write-once), then the
/// normalized text replaces title/description.
pub fn apply_normalization(
    conn: &Connection,
    id: &Uuid,
    final_title: &str,
    final_description: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE requirements SET
         raw_title = COALESCE(raw_title, title),
         raw_description = COALESCE(raw_description, description),
         title = ?2,
         description = ?3
         WHERE id = ?1",
        params![id.to_string(), final_title, final_description],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Requirement".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn requirement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Requirement> {
    let id: String = row.get(0)?;
    let module_id: String = row.get(1)?;
    let classification: Option<String> = row.get(6)?;
    let is_obsolete: i32 = row.get(7)?;
    let created_at: String = row.get(10)?;
    Ok(Requirement {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        module_id: Uuid::parse_str(&module_id).unwrap_or_default(),
        req_id: row.get(2)?,
        code: row.get(3)?,
        title: row.get(4)?,
        raw_title: row.get(5)?,
        classification: classification
            .as_deref()
            .and_then(|s| Classification::from_str(s).ok()),
        is_obsolete: is_obsolete != 0,
        description: row.get(8)?,
        raw_description: row.get(9)?,
        created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FORMAT)
            .unwrap_or_default(),
    })
}
