//! Table definitions and the startup seed.

use rusqlite::{params, Connection};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Both tables. No migrations: `IF NOT EXISTS` is the whole story.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    image_path    TEXT,
    face_encoding TEXT,
    present       INTEGER NOT NULL DEFAULT 0 CHECK (present IN (0, 1))
);

CREATE TABLE IF NOT EXISTS teachers (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE,
    password TEXT
);
";

/// Per-connection settings. The daemon and the CLI may share a database file.
pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
}

pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Insert a teacher unless the username already exists. Returns whether a row was added.
pub fn seed_teacher(conn: &Connection, username: &str, password: &str) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO teachers (username, password) VALUES (?1, ?2)",
        params![username, password],
    )?;
    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('students', 'teachers')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_seed_teacher_once() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert!(seed_teacher(&conn, "teacher1", "1234").unwrap());
        assert!(!seed_teacher(&conn, "teacher1", "other").unwrap());

        let password: String = conn
            .query_row("SELECT password FROM teachers WHERE username = 'teacher1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(password, "1234");
    }

    #[test]
    fn test_present_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let err = conn.execute("INSERT INTO students (name, present) VALUES ('x', 2)", []);
        assert!(err.is_err());
    }
}
