use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::config::DashboardConfig;
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::sync::SyncKind;
use crate::infra::import::json::{JsonFileSource, WorkItemFileJob};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::usecase::ports::events::RefreshBus;
use crate::usecase::ports::repo::DatasetSource;
use crate::usecase::services::feedback_service::FeedbackService;
use crate::usecase::services::sync_service::SyncService;
use crate::usecase::services::view_service::ViewSession;

/// Wiring shared by every open view: the local store, the refresh bus and
/// the services that publish on it.
#[derive(Clone)]
pub struct Dashboard {
    pub config: DashboardConfig,
    pub repo: SqliteRepo,
    pub bus: RefreshBus,
    pub feedback: Arc<FeedbackService>,
    pub sync: Arc<SyncService>,
}

impl Dashboard {
    pub fn open(config: DashboardConfig) -> Result<Self> {
        let db_path = config.resolved_db_path()?;
        let repo = SqliteRepo::new(db_path);
        repo.init()
            .with_context(|| format!("failed to initialize db: {}", repo.db_path.display()))?;

        let bus = RefreshBus::new();
        let feedback = Arc::new(FeedbackService::new(Arc::new(repo.clone()), bus.clone()));
        let sync = Arc::new(SyncService::new(Arc::new(repo.clone()), bus.clone()));
        info!(db = %repo.db_path.display(), "dashboard opened");

        Ok(Self {
            config,
            repo,
            bus,
            feedback,
            sync,
        })
    }

    /// The task-level view when a record export is configured, the client
    /// delivery view otherwise.
    pub fn default_view(&self) -> ViewSchema {
        let name = if self.config.dataset_path.is_some() {
            "task_level"
        } else {
            "client_delivery"
        };
        self.config
            .view(name)
            .unwrap_or_else(ViewSchema::client_delivery)
    }

    fn source_for(&self, schema: &ViewSchema) -> Arc<dyn DatasetSource> {
        match &self.config.dataset_path {
            Some(path) if schema.name != "client_delivery" => {
                Arc::new(JsonFileSource::new(path.clone()))
            }
            _ => Arc::new(self.repo.clone()),
        }
    }

    /// Opens a view subscribed to refresh signals. The first fetch is left to
    /// the caller so it can report a failure.
    pub fn open_session(&self, schema: ViewSchema) -> ViewSession {
        let source = self.source_for(&schema);
        ViewSession::new(
            schema,
            source,
            self.config.page_size(),
            self.config.max_page_size,
        )
        .subscribe(&self.bus)
    }

    pub fn sync_job(&self) -> Option<WorkItemFileJob> {
        self.config
            .work_items_path
            .as_ref()
            .map(|path| WorkItemFileJob {
                path: path.clone(),
                repo: self.repo.clone(),
            })
    }

    /// Runs the work-item sync when one is configured and the last completed
    /// run is older than the configured interval.
    pub fn sync_if_due(&self) -> Result<Option<u64>> {
        let Some(job) = self.sync_job() else {
            return Ok(None);
        };
        let now = Local::now().naive_local();
        if !self.sync.is_due(now, self.config.sync_interval())? {
            return Ok(None);
        }
        let kind = if self.sync.last_sync_time()?.is_none() {
            SyncKind::Initial
        } else {
            SyncKind::Scheduled
        };
        self.sync.run(&job, kind).map(Some)
    }

    pub fn sync_now(&self) -> Result<u64> {
        let job = self
            .sync_job()
            .context("no work item export configured (work_items_path)")?;
        self.sync.run(&job, SyncKind::Manual)
    }
}
