//! Conversion job status table.
//!
//! One row per upload in a SQLite `files` table. The HTTP layer creates a row
//! when a conversion starts, then marks it `done` with the result path or
//! `failed`. Rows are never deleted.

use crate::error::ConvertError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id       TEXT NOT NULL UNIQUE,
    original_name TEXT NOT NULL,
    status        TEXT NOT NULL,
    result_path   TEXT,
    created_at    TEXT NOT NULL
)
"#;

/// Lifecycle of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ConvertError::Database(format!("unknown job status '{other}'"))),
        }
    }
}

/// One row of the `files` table.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionJob {
    pub id: i64,
    pub file_id: String,
    pub original_name: String,
    pub status: JobStatus,
    pub result_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Handle to the job table. Cheap to clone.
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> ConvertError {
    ConvertError::Database(e.to_string())
}

impl JobStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite:lecture-a11y.db`.
    pub async fn connect(url: &str) -> Result<Self, ConvertError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        info!("Job store ready at {}", url);
        Ok(store)
    }

    /// Private in-memory database; a single connection keeps every query on
    /// the same database.
    pub async fn in_memory() -> Result<Self, ConvertError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), ConvertError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Insert a new job in `processing` state with a fresh v4 identifier.
    pub async fn create(&self, original_name: &str) -> Result<ConversionJob, ConvertError> {
        let file_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO files (file_id, original_name, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&file_id)
        .bind(original_name)
        .bind(JobStatus::Processing.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        debug!("Created job {} for '{}'", file_id, original_name);
        self.get(&file_id).await
    }

    /// Mark a job `done` and record where its result was written.
    pub async fn complete(&self, file_id: &str, result_path: &str) -> Result<(), ConvertError> {
        self.set_status(file_id, JobStatus::Done, Some(result_path)).await
    }

    /// Mark a job `failed`.
    pub async fn fail(&self, file_id: &str) -> Result<(), ConvertError> {
        self.set_status(file_id, JobStatus::Failed, None).await
    }

    async fn set_status(
        &self,
        file_id: &str,
        status: JobStatus,
        result_path: Option<&str>,
    ) -> Result<(), ConvertError> {
        let affected = sqlx::query(
            r#"
            UPDATE files
            SET status = ?2,
                result_path = COALESCE(?3, result_path)
            WHERE file_id = ?1
            "#,
        )
        .bind(file_id)
        .bind(status.as_str())
        .bind(result_path)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .rows_affected();

        if affected == 0 {
            return Err(ConvertError::NotFound {
                file_id: file_id.to_string(),
            });
        }
        debug!("Job {} is now {}", file_id, status);
        Ok(())
    }

    /// Look up a job by its public identifier.
    pub async fn get(&self, file_id: &str) -> Result<ConversionJob, ConvertError> {
        let row = sqlx::query(
            r#"
            SELECT id, file_id, original_name, status, result_path, created_at
            FROM files
            WHERE file_id = ?1
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ConvertError::NotFound {
            file_id: file_id.to_string(),
        })?;

        map_job(row)
    }
}

fn map_job(row: SqliteRow) -> Result<ConversionJob, ConvertError> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| ConvertError::Database(format!("invalid timestamp {created_at}: {e}")))?;

    Ok(ConversionJob {
        id: row.try_get("id").map_err(db_err)?,
        file_id: row.try_get("file_id").map_err(db_err)?,
        original_name: row.try_get("original_name").map_err(db_err)?,
        status: status.parse()?,
        result_path: row.try_get("result_path").map_err(db_err)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trips() {
        for s in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Done,
            JobStatus::Failed,
        ] {
            assert_eq!(s.to_string().parse::<JobStatus>().unwrap(), s);
        }
        assert!("finished".parse::<JobStatus>().is_err());
    }

    #[tokio::test]
    async fn job_lifecycle() {
        let store = JobStore::in_memory().await.unwrap();
        let job = store.create("lecture.pptx").await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.original_name, "lecture.pptx");
        assert!(job.result_path.is_none());
        assert!(Uuid::parse_str(&job.file_id).is_ok());

        store.complete(&job.file_id, "static/lecture_vlm.docx").await.unwrap();
        let done = store.get(&job.file_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Done);
        assert_eq!(done.result_path.as_deref(), Some("static/lecture_vlm.docx"));
    }

    #[tokio::test]
    async fn failed_job_keeps_no_result() {
        let store = JobStore::in_memory().await.unwrap();
        let job = store.create("notes.docx").await.unwrap();
        store.fail(&job.file_id).await.unwrap();
        let failed = store.get(&job.file_id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.result_path.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = JobStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get("nope").await.unwrap_err(),
            ConvertError::NotFound { .. }
        ));
        assert!(matches!(
            store.fail("nope").await.unwrap_err(),
            ConvertError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn identifiers_are_unique() {
        let store = JobStore::in_memory().await.unwrap();
        let a = store.create("a.pdf").await.unwrap();
        let b = store.create("a.pdf").await.unwrap();
        assert_ne!(a.file_id, b.file_id);
        assert!(b.id > a.id);
    }
}
