use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::application::ports::{FileRepository, RepositoryError, ScanCursor, ScanPage};
use crate::domain::entities::{FileRecord, NewFileRecord};
use crate::domain::value_objects::{DisplayName, FileId, FileState, OwnerId};

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, FileRecord>,
    last_id: i64,
}

/// Metadata store held in process memory, with the same ordering and
/// uniqueness rules as the Postgres repository.
#[derive(Default)]
pub struct InMemoryFileRepository {
    table: RwLock<Table>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, e.g. a legacy row with a malformed storage key
    pub fn seed(&self, record: FileRecord) {
        let mut table = self.table.write();
        let id = record.id().as_i64();
        table.last_id = table.last_id.max(id);
        table.rows.insert(id, record);
    }

    /// Row in any state
    pub fn get(&self, id: FileId) -> Option<FileRecord> {
        self.table.read().rows.get(&id.as_i64()).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().rows.is_empty()
    }

    fn active_newest_first(&self, filter: impl Fn(&FileRecord) -> bool) -> Vec<FileRecord> {
        self.table
            .read()
            .rows
            .values()
            .rev()
            .filter(|record| record.is_active() && filter(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, RepositoryError> {
        let mut table = self.table.write();

        if table
            .rows
            .values()
            .any(|existing| existing.storage_key() == record.storage_key.as_str())
        {
            return Err(RepositoryError::Conflict(format!(
                "storage key already recorded: {}",
                record.storage_key
            )));
        }

        table.last_id += 1;
        let id = table.last_id;
        let committed = FileRecord::from_new(FileId::new(id), record);
        table.rows.insert(id, committed.clone());
        Ok(committed)
    }

    async fn find_by_id(&self, id: FileId) -> Result<Option<FileRecord>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<FileRecord>, RepositoryError> {
        Ok(self.active_newest_first(|record| record.owner_id() == owner_id))
    }

    async fn search(&self, pattern: &str) -> Result<Vec<FileRecord>, RepositoryError> {
        let needle = pattern.to_lowercase();
        Ok(self.active_newest_first(|record| {
            record
                .display_name()
                .as_str()
                .to_lowercase()
                .contains(&needle)
                || record.public_url().to_lowercase().contains(&needle)
        }))
    }

    async fn update_state(&self, id: FileId, state: FileState) -> Result<(), RepositoryError> {
        let mut table = self.table.write();
        let record = table
            .rows
            .get_mut(&id.as_i64())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        *record = FileRecord::reconstruct(
            record.id(),
            record.owner_id().clone(),
            record.display_name().clone(),
            record.storage_key().to_string(),
            record.public_url().to_string(),
            record.created_at(),
            state,
        );
        Ok(())
    }

    async fn rename(&self, id: FileId, display_name: &DisplayName) -> Result<(), RepositoryError> {
        let mut table = self.table.write();
        let record = table
            .rows
            .get_mut(&id.as_i64())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        record
            .rename(display_name.clone())
            .map_err(|_| RepositoryError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: FileId) -> Result<(), RepositoryError> {
        self.table.write().rows.remove(&id.as_i64());
        Ok(())
    }

    async fn find_older_than(
        &self,
        state: FileState,
        threshold: DateTime<Utc>,
        after: Option<ScanCursor>,
        limit: i64,
    ) -> Result<ScanPage, RepositoryError> {
        let start = after.map(|cursor| (cursor.created_at, cursor.id));
        let mut matches: Vec<FileRecord> = self
            .table
            .read()
            .rows
            .values()
            .filter(|record| record.state() == state && record.is_older_than(threshold))
            .filter(|record| start.map_or(true, |start| (record.created_at(), record.id()) > start))
            .cloned()
            .collect();

        matches.sort_by_key(|record| (record.created_at(), record.id()));
        let limit = usize::try_from(limit).unwrap_or(0);
        matches.truncate(limit);

        let next = match matches.last() {
            Some(last) if matches.len() >= limit => Some(ScanCursor {
                created_at: last.created_at(),
                id: last.id(),
            }),
            _ => None,
        };

        Ok(ScanPage {
            records: matches,
            next,
        })
    }
}
