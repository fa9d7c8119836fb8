use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::entities::dataset::Dataset;
use crate::domain::entities::feedback::{FeedbackOutcome, FeedbackRow};
use crate::domain::entities::sync::{SyncKind, SyncRun};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("{0}")]
    Message(String),
}

/// Where a view gets its records from. Every call is a full refetch.
pub trait DatasetSource: Send + Sync {
    fn fetch(&self) -> Result<Dataset, RepoError>;
}

pub trait FeedbackStore: Send + Sync {
    /// Applies every row in one transaction.
    fn apply_feedback(&self, rows: &[FeedbackRow]) -> Result<FeedbackOutcome, RepoError>;
}

pub trait SyncLogStore: Send + Sync {
    fn start_sync(
        &self,
        table_name: &str,
        kind: SyncKind,
        started_at: NaiveDateTime,
    ) -> Result<i64, RepoError>;
    fn complete_sync(
        &self,
        id: i64,
        completed_at: NaiveDateTime,
        records_synced: u64,
    ) -> Result<(), RepoError>;
    fn fail_sync(
        &self,
        id: i64,
        completed_at: NaiveDateTime,
        error_message: &str,
    ) -> Result<(), RepoError>;
    fn latest_completed(&self, table_name: Option<&str>) -> Result<Option<SyncRun>, RepoError>;
    fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRun>, RepoError>;
}

/// One unit of external synchronisation, e.g. pulling work items from an
/// export into the local store. Returns how many records it wrote.
pub trait SyncJob: Send + Sync {
    fn table_name(&self) -> &str;
    fn run(&self) -> Result<u64, RepoError>;
}

/// A sheet read from an uploaded file: header row plus stringified cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
