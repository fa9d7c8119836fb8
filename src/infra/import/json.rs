use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::entities::dataset::Dataset;
use crate::domain::entities::work_item::WorkItem;
use crate::infra::sqlite::repo::SqliteRepo;
use crate::usecase::ports::repo::{DatasetSource, RepoError, SyncJob};

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    Dataset::from_json_str(&text)
        .with_context(|| format!("failed to parse dataset json: {}", path.display()))
}

pub fn read_work_items(path: &Path) -> Result<Vec<WorkItem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read work items: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse work items json: {}", path.display()))
}

/// Task-level records exported by the reporting backend as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DatasetSource for JsonFileSource {
    fn fetch(&self) -> Result<Dataset, RepoError> {
        read_dataset(&self.path).map_err(|err| RepoError::Message(format!("{err:#}")))
    }
}

/// Pulls a work-item export into the local store.
#[derive(Debug, Clone)]
pub struct WorkItemFileJob {
    pub path: PathBuf,
    pub repo: SqliteRepo,
}

impl SyncJob for WorkItemFileJob {
    fn table_name(&self) -> &str {
        "work_item"
    }

    fn run(&self) -> Result<u64, RepoError> {
        let items =
            read_work_items(&self.path).map_err(|err| RepoError::Message(format!("{err:#}")))?;
        let written = self.repo.upsert_work_items(&items)?;
        Ok(written as u64)
    }
}
