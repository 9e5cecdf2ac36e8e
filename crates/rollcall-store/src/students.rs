//! Student rows: registration, presence flags and stored encodings.

use rollcall_core::{AttendanceStatus, Encoding, FaceSource};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::path::PathBuf;

/// Input for [`insert`].
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub image_path: Option<PathBuf>,
    pub encoding: Option<Encoding>,
}

/// A student as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub status: AttendanceStatus,
}

/// A full student row.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: i64,
    pub name: String,
    pub image_path: Option<PathBuf>,
    pub encoding: Option<Encoding>,
    pub present: bool,
}

impl From<StudentRecord> for FaceSource {
    fn from(rec: StudentRecord) -> Self {
        FaceSource {
            student_id: rec.id,
            name: rec.name,
            image_path: rec.image_path,
            encoding: rec.encoding,
        }
    }
}

fn encoding_to_sql(encoding: &Encoding) -> rusqlite::Result<String> {
    encoding
        .to_json()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    let id: i64 = row.get(0)?;
    let raw_encoding: Option<String> = row.get(3)?;

    // A corrupt stored encoding is treated as missing so it can be recomputed.
    let encoding = match raw_encoding.as_deref().map(Encoding::from_json) {
        Some(Ok(enc)) => enc,
        Some(Err(e)) => {
            tracing::warn!(student_id = id, error = %e, "ignoring unparsable face encoding");
            None
        }
        None => None,
    };

    Ok(StudentRecord {
        id,
        name: row.get(1)?,
        image_path: row.get::<_, Option<String>>(2)?.map(PathBuf::from),
        encoding,
        present: row.get::<_, i64>(4)? == 1,
    })
}

/// Insert a student and return the new id. New students start absent.
pub fn insert(conn: &Connection, student: &NewStudent) -> rusqlite::Result<i64> {
    let image_path = student
        .image_path
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned());
    let encoding = student.encoding.as_ref().map(encoding_to_sql).transpose()?;

    conn.execute(
        "INSERT INTO students (name, image_path, face_encoding) VALUES (?1, ?2, ?3)",
        params![student.name, image_path, encoding],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Set one student's presence flag. Returns whether the id exists.
pub fn set_present(conn: &Connection, id: i64, present: bool) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET present = ?1 WHERE id = ?2",
        params![present as i64, id],
    )?;
    Ok(changed > 0)
}

/// Mark each id present with its own statement. Returns the number of rows updated.
pub fn mark_present(conn: &Connection, ids: &[i64]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare("UPDATE students SET present = 1 WHERE id = ?1")?;
    let mut updated = 0;
    for id in ids {
        updated += stmt.execute(params![id])?;
    }
    Ok(updated)
}

/// Set every student's presence flag. Returns the number of rows touched.
pub fn set_all_present(conn: &Connection, present: bool) -> rusqlite::Result<usize> {
    conn.execute("UPDATE students SET present = ?1", params![present as i64])
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<StudentSummary>> {
    let mut stmt = conn.prepare("SELECT id, name, present FROM students ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(StudentSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            status: AttendanceStatus::from_flag(row.get::<_, i64>(2)? == 1),
        })
    })?;
    rows.collect()
}

/// Full rows, for rebuilding the known-face registry.
pub fn load_all(conn: &Connection) -> rusqlite::Result<Vec<StudentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, image_path, face_encoding, present FROM students ORDER BY id",
    )?;
    let rows = stmt.query_map([], record_from_row)?;
    rows.collect()
}

/// Replace a student's stored encoding. Returns whether the id exists.
pub fn update_encoding(conn: &Connection, id: i64, encoding: &Encoding) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET face_encoding = ?1 WHERE id = ?2",
        params![encoding_to_sql(encoding)?, id],
    )?;
    Ok(changed > 0)
}
