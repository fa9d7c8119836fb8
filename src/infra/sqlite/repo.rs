use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::domain::entities::dataset::Dataset;
use crate::domain::entities::feedback::{FeedbackOutcome, FeedbackRow};
use crate::domain::entities::sync::{SyncKind, SyncRun};
use crate::domain::entities::work_item::WorkItem;
use crate::infra::sqlite::queries::{
    apply_feedback, insert_sync_start, latest_completed_sync, load_work_items,
    mark_sync_completed, mark_sync_failed, recent_syncs, upsert_work_items,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{DatasetSource, FeedbackStore, RepoError, SyncLogStore};

/// Local work-item store backing the client delivery view.
#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub db_path: PathBuf,
}

impl SqliteRepo {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn init(&self) -> Result<(), RepoError> {
        init_db(&self.db_path).map_err(|err| RepoError::Message(err.to_string()))
    }

    pub fn upsert_work_items(&self, items: &[WorkItem]) -> Result<usize, RepoError> {
        upsert_work_items(&self.db_path, items).map_err(|err| RepoError::Message(err.to_string()))
    }

    pub fn work_items(&self) -> Result<Vec<WorkItem>, RepoError> {
        load_work_items(&self.db_path).map_err(|err| RepoError::Message(err.to_string()))
    }
}

impl DatasetSource for SqliteRepo {
    fn fetch(&self) -> Result<Dataset, RepoError> {
        let items = self.work_items()?;
        Ok(Dataset::new(items.iter().map(WorkItem::to_record).collect()))
    }
}

impl FeedbackStore for SqliteRepo {
    fn apply_feedback(&self, rows: &[FeedbackRow]) -> Result<FeedbackOutcome, RepoError> {
        apply_feedback(&self.db_path, rows).map_err(|err| RepoError::Message(err.to_string()))
    }
}

impl SyncLogStore for SqliteRepo {
    fn start_sync(
        &self,
        table_name: &str,
        kind: SyncKind,
        started_at: NaiveDateTime,
    ) -> Result<i64, RepoError> {
        insert_sync_start(&self.db_path, table_name, kind, started_at)
            .map_err(|err| RepoError::Message(err.to_string()))
    }

    fn complete_sync(
        &self,
        id: i64,
        completed_at: NaiveDateTime,
        records_synced: u64,
    ) -> Result<(), RepoError> {
        mark_sync_completed(&self.db_path, id, completed_at, records_synced)
            .map_err(|err| RepoError::Message(err.to_string()))
    }

    fn fail_sync(
        &self,
        id: i64,
        completed_at: NaiveDateTime,
        error_message: &str,
    ) -> Result<(), RepoError> {
        mark_sync_failed(&self.db_path, id, completed_at, error_message)
            .map_err(|err| RepoError::Message(err.to_string()))
    }

    fn latest_completed(&self, table_name: Option<&str>) -> Result<Option<SyncRun>, RepoError> {
        latest_completed_sync(&self.db_path, table_name)
            .map_err(|err| RepoError::Message(err.to_string()))
    }

    fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRun>, RepoError> {
        recent_syncs(&self.db_path, limit).map_err(|err| RepoError::Message(err.to_string()))
    }
}
