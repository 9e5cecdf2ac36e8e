use crate::students::{self, NewStudent, StudentRecord, StudentSummary};
use crate::teachers::{self, Teacher};
use crate::{schema, StoreError};
use rollcall_core::Encoding;
use std::path::Path;

/// Clone-safe async handle to the database.
///
/// The underlying SQLite connection lives on its own thread; every method is
/// one scoped call on it, so writes are serialized and nothing leaks a
/// connection on error.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = tokio_rusqlite::Connection::open(path).await?;
        conn.call(|conn| Ok(schema::configure(conn)?)).await?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        Ok(Self { conn })
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| Ok(schema::ensure_schema(conn)?))
            .await?;
        Ok(())
    }

    pub async fn seed_teacher(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let (username, password) = (username.to_owned(), password.to_owned());
        Ok(self
            .conn
            .call(move |conn| Ok(schema::seed_teacher(conn, &username, &password)?))
            .await?)
    }

    pub async fn create_student(&self, student: NewStudent) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .call(move |conn| Ok(students::insert(conn, &student)?))
            .await?)
    }

    pub async fn find_teacher(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Teacher>, StoreError> {
        let (username, password) = (username.to_owned(), password.to_owned());
        Ok(self
            .conn
            .call(move |conn| Ok(teachers::find_by_credentials(conn, &username, &password)?))
            .await?)
    }

    pub async fn set_present(&self, id: i64, present: bool) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .call(move |conn| Ok(students::set_present(conn, id, present)?))
            .await?)
    }

    pub async fn mark_present(&self, ids: Vec<i64>) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        Ok(self
            .conn
            .call(move |conn| Ok(students::mark_present(conn, &ids)?))
            .await?)
    }

    pub async fn set_all_present(&self, present: bool) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .call(move |conn| Ok(students::set_all_present(conn, present)?))
            .await?)
    }

    pub async fn list_students(&self) -> Result<Vec<StudentSummary>, StoreError> {
        Ok(self.conn.call(|conn| Ok(students::list(conn)?)).await?)
    }

    pub async fn load_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.conn.call(|conn| Ok(students::load_all(conn)?)).await?)
    }

    pub async fn update_encoding(&self, id: i64, encoding: Encoding) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .call(move |conn| Ok(students::update_encoding(conn, id, &encoding)?))
            .await?)
    }
}
