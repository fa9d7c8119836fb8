use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::feedback::{feedback_rows, UploadSummary};
use crate::domain::entities::sync::RefreshSignal;
use crate::infra::import::csv::read_csv_table;
use crate::infra::import::xlsx::read_xlsx_table;
use crate::usecase::ports::events::RefreshBus;
use crate::usecase::ports::repo::{FeedbackStore, TabularData};

pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
    bus: RefreshBus,
}

fn read_upload(path: &Path) -> Result<TabularData> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => read_csv_table(path),
        "xlsx" | "xls" | "xlsm" => read_xlsx_table(path),
        _ => anyhow::bail!(
            "unsupported file format: {} (expected .csv or .xlsx)",
            path.display()
        ),
    }
}

impl FeedbackService {
    pub fn new(store: Arc<dyn FeedbackStore>, bus: RefreshBus) -> Self {
        Self { store, bus }
    }

    /// Reads a client feedback sheet, applies it to the work-item store and
    /// tells open views to refresh.
    pub fn process_upload(&self, path: &Path) -> Result<UploadSummary> {
        let table = read_upload(path)?;
        let rows = feedback_rows(&table.columns, &table.rows)
            .with_context(|| format!("invalid feedback sheet: {}", path.display()))?;
        let outcome = self
            .store
            .apply_feedback(&rows)
            .context("failed to apply client feedback")?;

        let summary = UploadSummary {
            total_rows: rows.len(),
            updated: outcome.updated,
            not_found: outcome.not_found,
        };
        info!(
            file = %path.display(),
            total_rows = summary.total_rows,
            updated = summary.updated,
            not_found = summary.not_found,
            "client feedback processed"
        );
        self.bus.publish(RefreshSignal::BulkFeedbackUploaded);
        Ok(summary)
    }
}
