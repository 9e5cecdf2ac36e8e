use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teacher {
    pub id: i64,
    pub username: String,
}

/// Look up a teacher by exact username and password.
pub fn find_by_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> rusqlite::Result<Option<Teacher>> {
    conn.query_row(
        "SELECT id, username FROM teachers WHERE username = ?1 AND password = ?2",
        params![username, password],
        |row| {
            Ok(Teacher {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        },
    )
    .optional()
}
