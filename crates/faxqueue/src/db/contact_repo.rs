//! Contact repository for the `contacts` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw contact row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ContactRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            number: row.get("number")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// All contacts, ordered by name (case-insensitive).
pub fn list(db: &Database) -> Result<Vec<ContactRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, number, note, created_at, updated_at
             FROM contacts ORDER BY name COLLATE NOCASE ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], ContactRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Finds a contact by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ContactRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, number, note, created_at, updated_at FROM contacts WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], ContactRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Inserts a new contact and returns its ID.
pub fn insert(
    db: &Database,
    name: &str,
    number: &str,
    note: &str,
    now: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO contacts (name, number, note, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, number, note, now],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Updates an existing contact. Returns false if no row had that ID.
pub fn update(
    db: &Database,
    id: i64,
    name: &str,
    number: &str,
    note: &str,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE contacts SET name=?2, number=?3, note=?4, updated_at=?5 WHERE id=?1",
            params![id, name, number, note, now],
        )?;
        Ok(changed > 0)
    })
}

/// Deletes a contact. Returns false if no row had that ID.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
