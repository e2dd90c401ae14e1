//! Schema migrations.
//!
//! Applied migrations are tracked in a `_migrations` table; pending ones are
//! applied in order, each at most once.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const CREATE_CONTACTS: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    number TEXT NOT NULL,
    note TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(name);
";

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create_contacts_table",
    sql: CREATE_CONTACTS,
}];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    let supported = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);
    if current_version > supported {
        return Err(DatabaseError::NewerSchema {
            found: current_version,
            supported,
        });
    }

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        conn.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (99, 'from_the_future')",
            [],
        )
        .unwrap();

        let err = run_all(&conn).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::NewerSchema {
                found: 99,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_contacts_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();

        conn.execute(
            "INSERT INTO contacts (name, number, created_at, updated_at) VALUES ('X', '49', 'now', 'now')",
            [],
        )
        .unwrap();
        let note: String = conn
            .query_row("SELECT note FROM contacts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(note, "");
    }
}
