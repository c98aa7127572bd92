use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use crate::application::ports::{FileRepository, RepositoryError, ScanCursor, ScanPage};
use crate::domain::entities::{FileRecord, NewFileRecord};
use crate::domain::value_objects::{DisplayName, FileId, FileState, OwnerId};

const FILE_SELECT: &str = r#"
    SELECT id, owner_id, display_name, storage_key, public_url, created_at, state
    FROM files
"#;

pub struct PostgresFileRepository {
    pool: PgPool,
}

impl PostgresFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PostgresFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO files (owner_id, display_name, storage_key, public_url, created_at, state)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING id
            "#,
        )
        .bind(record.owner_id.as_str())
        .bind(record.display_name.as_str())
        .bind(record.storage_key.as_str())
        .bind(&record.public_url)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("storage key already recorded: {}", db))
            }
            other => RepositoryError::Database(other),
        })?;

        tx.commit().await?;

        Ok(FileRecord::from_new(FileId::new(id), record))
    }

    async fn find_by_id(&self, id: FileId) -> Result<Option<FileRecord>, RepositoryError> {
        let sql = format!("{} WHERE id = $1", FILE_SELECT);
        let row = sqlx::query_as::<_, FileRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(FileRow::into_domain).transpose()
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<FileRecord>, RepositoryError> {
        let sql = format!(
            "{} WHERE owner_id = $1 AND state = 'active' ORDER BY id DESC",
            FILE_SELECT
        );
        let rows = sqlx::query_as::<_, FileRow>(&sql)
            .bind(owner_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(into_records(rows))
    }

    async fn search(&self, pattern: &str) -> Result<Vec<FileRecord>, RepositoryError> {
        let sql = format!(
            r#"{} WHERE state = 'active'
              AND (display_name ILIKE $1 ESCAPE '\' OR public_url ILIKE $1 ESCAPE '\')
            ORDER BY id DESC"#,
            FILE_SELECT
        );
        let rows = sqlx::query_as::<_, FileRow>(&sql)
            .bind(format!("%{}%", escape_like(pattern)))
            .fetch_all(&self.pool)
            .await?;

        Ok(into_records(rows))
    }

    async fn update_state(&self, id: FileId, state: FileState) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE files SET state = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(state.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn rename(&self, id: FileId, display_name: &DisplayName) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE files SET display_name = $2 WHERE id = $1 AND state = 'active'")
                .bind(id.as_i64())
                .bind(display_name.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: FileId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_older_than(
        &self,
        state: FileState,
        threshold: DateTime<Utc>,
        after: Option<ScanCursor>,
        limit: i64,
    ) -> Result<ScanPage, RepositoryError> {
        let sql = format!(
            r#"{} WHERE state = $1 AND created_at < $2
              AND ($3::timestamptz IS NULL OR (created_at, id) > ($3, $4))
            ORDER BY created_at ASC, id ASC
            LIMIT $5"#,
            FILE_SELECT
        );
        let rows = sqlx::query_as::<_, FileRow>(&sql)
            .bind(state.as_str())
            .bind(threshold)
            .bind(after.map(|cursor| cursor.created_at))
            .bind(after.map(|cursor| cursor.id.as_i64()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(into_page(rows, limit))
    }
}

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Map rows to records, logging and dropping rows that no longer validate
/// (e.g. names written before the current rules)
fn into_records(rows: Vec<FileRow>) -> Vec<FileRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match row.into_domain() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(file_id = id, error = %e, "Skipping unreadable file row");
                    None
                }
            }
        })
        .collect()
}

/// A full page means there may be more rows after the last one read
fn into_page(rows: Vec<FileRow>, limit: i64) -> ScanPage {
    let next = match rows.last() {
        Some(last) if rows.len() as i64 >= limit => Some(ScanCursor {
            created_at: last.created_at,
            id: FileId::new(last.id),
        }),
        _ => None,
    };

    ScanPage {
        records: into_records(rows),
        next,
    }
}

// Internal row mapping struct
#[derive(sqlx::FromRow)]
struct FileRow {
    id: i64,
    owner_id: String,
    display_name: String,
    storage_key: String,
    public_url: String,
    created_at: DateTime<Utc>,
    state: String,
}

impl FileRow {
    fn into_domain(self) -> Result<FileRecord, RepositoryError> {
        let owner_id = OwnerId::new(self.owner_id)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        let display_name = DisplayName::new(self.display_name)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        let state = self
            .state
            .parse::<FileState>()
            .map_err(RepositoryError::SerializationError)?;

        // storage_key stays raw; the sweeper decides what to do with bad keys
        Ok(FileRecord::reconstruct(
            FileId::new(self.id),
            owner_id,
            display_name,
            self.storage_key,
            self.public_url,
            self.created_at,
            state,
        ))
    }
}
