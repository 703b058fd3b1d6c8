use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DATETIME_FORMAT;
use crate::db::DatabaseError;
use crate::models::Module;

pub fn insert_module(conn: &Connection, module: &Module) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO modules (id, catalog_id, code, title, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            module.id.to_string(),
            module.catalog_id.to_string(),
            module.code,
            module.title,
            module.created_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_module(conn: &Connection, id: &Uuid) -> Result<Option<Module>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, catalog_id, code, title, created_at FROM modules WHERE id = ?1",
    )?;
    let result = stmt.query_row(params![id.to_string()], module_row);

    match result {
        Ok(module) => Ok(Some(module)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Look up a module inside a catalog by its hierarchical code.
pub fn get_module_by_code(
    conn: &Connection,
    catalog_id: &Uuid,
    code: &str,
) -> Result<Option<Module>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, catalog_id, code, title, created_at
         FROM modules WHERE catalog_id = ?1 AND code = ?2",
    )?;
    let result = stmt.query_row(params![catalog_id.to_string(), code], module_row);

    match result {
        Ok(module) => Ok(Some(module)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All modules of a catalog, sorted by code.
pub fn list_modules(conn: &Connection, catalog_id: &Uuid) -> Result<Vec<Module>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, catalog_id, code, title, created_at
         FROM modules WHERE catalog_id = ?1 ORDER BY code",
    )?;
    let rows = stmt.query_map(params![catalog_id.to_string()], module_row)?;

    let mut modules = Vec::new();
    for row in rows {
        modules.push(row?);
    }
    Ok(modules)
}

pub fn count_modules(conn: &Connection, catalog_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM modules WHERE catalog_id = ?1",
        params![catalog_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn module_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Module> {
    let id: String = row.get(0)?;
    let catalog_id: String = row.get(1)?;
    let created_at: String = row.get(4)?;
    Ok(Module {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        catalog_id: Uuid::parse_str(&catalog_id).unwrap_or_default(),
        code: row.get(2)?,
        title: row.get(3)?,
        created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FORMAT)
            .unwrap_or_default(),
    })
}
