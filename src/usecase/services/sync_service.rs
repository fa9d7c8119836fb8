use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use tracing::{info, warn};

use crate::domain::entities::sync::{RefreshSignal, SyncKind, SyncRun};
use crate::usecase::ports::events::RefreshBus;
use crate::usecase::ports::repo::{RepoError, SyncJob, SyncLogStore};

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct SyncService {
    log: Arc<dyn SyncLogStore>,
    bus: RefreshBus,
}

impl SyncService {
    pub fn new(log: Arc<dyn SyncLogStore>, bus: RefreshBus) -> Self {
        Self { log, bus }
    }

    /// Runs one job and records it in the sync log. Failures of the job are
    /// logged as a failed run and returned.
    pub fn run(&self, job: &dyn SyncJob, kind: SyncKind) -> Result<u64> {
        let table = job.table_name().to_string();
        let id = self
            .log
            .start_sync(&table, kind, now())
            .context("failed to record sync start")?;
        info!(table = %table, kind = kind.as_str(), "sync started");

        match job.run() {
            Ok(records) => {
                self.log
                    .complete_sync(id, now(), records)
                    .context("failed to record sync completion")?;
                info!(table = %table, records, "sync completed");
                self.bus.publish(RefreshSignal::ExternalSyncCompleted);
                Ok(records)
            }
            Err(err) => {
                warn!(table = %table, error = %err, "sync failed");
                self.log
                    .fail_sync(id, now(), &err.to_string())
                    .context("failed to record sync failure")?;
                Err(err).with_context(|| format!("sync of {table} failed"))
            }
        }
    }

    /// Completion time of the latest completed run of any table.
    pub fn last_sync_time(&self) -> Result<Option<NaiveDateTime>, RepoError> {
        Ok(self
            .log
            .latest_completed(None)?
            .and_then(|run| run.completed_at))
    }

    pub fn is_due(&self, at: NaiveDateTime, interval: Duration) -> Result<bool, RepoError> {
        Ok(match self.last_sync_time()? {
            Some(last) => at - last >= interval,
            None => true,
        })
    }

    pub fn history(&self, limit: usize) -> Result<Vec<SyncRun>, RepoError> {
        self.log.recent_runs(limit)
    }
}
