use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::engine::columns::option_values;
use crate::domain::engine::coordinator::{group_summaries, recompute, ViewState};
use crate::domain::entities::field::{ColumnDescriptor, FieldId};
use crate::domain::entities::filter::{DateFilter, FilterPatch, Selection};
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::sync::RefreshSignal;
use crate::domain::entities::view::{GroupSummary, Pagination, ViewResult};
use crate::usecase::ports::events::RefreshBus;
use crate::usecase::ports::repo::{DatasetSource, RepoError};

/// One open dashboard view: its schema, where its data comes from and the
/// current state snapshot.
pub struct ViewSession {
    schema: ViewSchema,
    source: Arc<dyn DatasetSource>,
    state: Arc<ViewState>,
    refresh: Option<Receiver<RefreshSignal>>,
    /// Set while a requested refresh has not yet produced a successful fetch.
    refresh_pending: bool,
    max_page_size: usize,
}

impl ViewSession {
    pub fn new(
        schema: ViewSchema,
        source: Arc<dyn DatasetSource>,
        page_size: usize,
        max_page_size: usize,
    ) -> Self {
        let max_page_size = max_page_size.max(1);
        let pagination = Pagination::new(page_size.clamp(1, max_page_size));
        let state = ViewState::load(Default::default(), &schema, pagination);
        Self {
            schema,
            source,
            state: Arc::new(state),
            refresh: None,
            refresh_pending: false,
            max_page_size,
        }
    }

    pub fn subscribe(mut self, bus: &RefreshBus) -> Self {
        self.refresh = Some(bus.subscribe());
        self
    }

    pub fn schema(&self) -> &ViewSchema {
        &self.schema
    }

    pub fn state(&self) -> Arc<ViewState> {
        Arc::clone(&self.state)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.state.columns
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Refetches and rebuilds every filter from the new data. On failure the
    /// current snapshot stays in place.
    pub fn reload(&mut self) -> Result<(), RepoError> {
        let dataset = match self.source.fetch() {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(view = %self.schema.name, error = %err, "dataset fetch failed");
                return Err(err);
            }
        };
        let next = self.state.with_dataset(dataset, &self.schema);
        info!(
            view = %self.schema.name,
            records = next.dataset.len(),
            dimensions = next.dimensions.len(),
            "dataset loaded"
        );
        self.state = Arc::new(next);
        self.refresh_pending = false;
        Ok(())
    }

    /// Drains pending refresh signals. Any number of pending signals costs a
    /// single reload. A failed reload stays owed and is retried on the next
    /// poll. Returns whether a reload happened.
    pub fn poll_refresh(&mut self) -> Result<bool, RepoError> {
        let Some(refresh) = &self.refresh else {
            return Ok(false);
        };
        let pending: Vec<RefreshSignal> = refresh.try_iter().collect();
        if pending.is_empty() && !self.refresh_pending {
            return Ok(false);
        }
        debug!(
            view = %self.schema.name,
            signals = ?pending,
            retry = self.refresh_pending,
            "refresh requested"
        );
        self.refresh_pending = true;
        self.reload()?;
        Ok(true)
    }

    pub fn result(&self) -> ViewResult {
        recompute(&self.schema, &self.state)
    }

    pub fn groups(&self) -> Vec<GroupSummary> {
        group_summaries(&self.schema, &self.state)
    }

    pub fn options(&self, field: &FieldId) -> Vec<String> {
        option_values(&self.state.dataset, field)
    }

    fn transition(&mut self, next: ViewState) {
        self.state = Arc::new(next);
    }

    pub fn update_filter(&mut self, field: &FieldId, patch: FilterPatch) {
        let next = self.state.with_filter_update(field, patch);
        self.transition(next);
    }

    pub fn reset_filter(&mut self, field: &FieldId) {
        debug!(view = %self.schema.name, field = %field, "filter reset");
        let next = self.state.with_filter_reset(field);
        self.transition(next);
    }

    pub fn clear_filters(&mut self) {
        debug!(view = %self.schema.name, "all filters cleared");
        let next = self.state.with_filters_cleared();
        self.transition(next);
    }

    /// Applies a date window to the schema's date field. Views without one
    /// ignore the call.
    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        let Some(field) = self.schema.date_field_id() else {
            return;
        };
        let next = self
            .state
            .with_date_filter(Some(DateFilter::between(field, start, end)));
        self.transition(next);
    }

    pub fn set_selection(&mut self, field: FieldId, selected: BTreeSet<String>) {
        let next = self.state.with_selection(Selection::of(field, selected));
        self.transition(next);
    }

    pub fn toggle_sort(&mut self, field: &FieldId) {
        let next = self.state.toggle_sort(field);
        self.transition(next);
    }

    pub fn set_page(&mut self, page: usize) {
        let next = self.state.with_page(page);
        self.transition(next);
    }

    /// Page sizes are clamped into `[1, max_page_size]`.
    pub fn set_page_size(&mut self, page_size: usize) {
        let next = self
            .state
            .with_page_size(page_size.clamp(1, self.max_page_size));
        self.transition(next);
    }
}
