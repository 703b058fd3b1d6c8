use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DATETIME_FORMAT;
use crate::db::DatabaseError;
use crate::models::{Catalog, ExtractionStatus};

pub fn insert_catalog(conn: &Connection, catalog: &Catalog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO catalogs (id, name, version, filename, storage_path, status, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            catalog.id.to_string(),
            catalog.name,
            catalog.version,
            catalog.filename,
            catalog.storage_path,
            catalog.status.as_str(),
            catalog.reason,
            catalog.created_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_catalog(conn: &Connection, id: &Uuid) -> Result<Option<Catalog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, version, filename, storage_path, status, reason, created_at
         FROM catalogs WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(CatalogRow {
            id: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            filename: row.get(3)?,
            storage_path: row.get(4)?,
            status: row.get(5)?,
            reason: row.get(6)?,
            created_at: row.get(7)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(catalog_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All catalogs, newest first.
pub fn list_catalogs(conn: &Connection) -> Result<Vec<Catalog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, version, filename, storage_path, status, reason, created_at
         FROM catalogs ORDER BY created_at DESC, version DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(CatalogRow {
            id: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            filename: row.get(3)?,
            storage_path: row.get(4)?,
            status: row.get(5)?,
            reason: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut catalogs = Vec::new();
    for row in rows {
        catalogs.push(catalog_from_row(row?)?);
    }
    Ok(catalogs)
}

/// Next version number for a logical catalog name (monotonic per name).
pub fn next_catalog_version(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(version) FROM catalogs WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

struct CatalogRow {
    id: String,
    name: String,
    version: i64,
    filename: String,
    storage_path: Option<String>,
    status: String,
    reason: Option<String>,
    created_at: String,
}

fn catalog_from_row(row: CatalogRow) -> Result<Catalog, DatabaseError> {
    Ok(Catalog {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        version: row.version,
        filename: row.filename,
        storage_path: row.storage_path,
        status: ExtractionStatus::from_str(&row.status)?,
        reason: row.reason,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, DATETIME_FORMAT)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::Utc;

    fn make_catalog(name: &str, version: i64) -> Catalog {
        Catalog {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version,
            filename: "katalog.pdf".to_string(),
            storage_path: None,
            status: ExtractionStatus::Ok,
            reason: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let catalog = make_catalog("edition-2023", 1);
        insert_catalog(&conn, &catalog).unwrap();

        let loaded = get_catalog(&conn, &catalog.id).unwrap().unwrap();
        assert_eq!(loaded.id, catalog.id);
        assert_eq!(loaded.name, "edition-2023");
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.status, ExtractionStatus::Ok);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_catalog(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn version_counter_scoped_to_name() {
        let conn = open_memory_database().unwrap();
        assert_eq!(next_catalog_version(&conn, "edition-2023").unwrap(), 1);

        insert_catalog(&conn, &make_catalog("edition-2023", 1)).unwrap();
        insert_catalog(&conn, &make_catalog("edition-2023", 2)).unwrap();
        insert_catalog(&conn, &make_catalog("edition-2022", 1)).unwrap();

        assert_eq!(next_catalog_version(&conn, "edition-2023").unwrap(), 3);
        assert_eq!(next_catalog_version(&conn, "edition-2022").unwrap(), 2);
        assert_eq!(next_catalog_version(&conn, "unknown").unwrap(), 1);
    }

    #[test]
    fn list_returns_all() {
        let conn = open_memory_database().unwrap();
        insert_catalog(&conn, &make_catalog("a", 1)).unwrap();
        insert_catalog(&conn, &make_catalog("b", 1)).unwrap();
        assert_eq!(list_catalogs(&conn).unwrap().len(), 2);
    }
}
