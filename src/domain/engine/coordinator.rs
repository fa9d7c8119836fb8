use crate::domain::engine::aggregator::{aggregate, summarize_groups, AggregateSpec};
use crate::domain::engine::columns::{dimension_columns, discover};
use crate::domain::engine::evaluator::apply;
use crate::domain::engine::filter_store::FilterStore;
use crate::domain::engine::paginator::{page_count, paginate};
use crate::domain::engine::sorter::sort;
use crate::domain::entities::dataset::{Cell, Dataset, RowRef, Value};
use crate::domain::entities::field::{ColumnDescriptor, FieldId};
use crate::domain::entities::filter::{DateFilter, FilterPatch, Selection};
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::view::{
    FlatRow, GroupSummary, Pagination, SortDirection, SortSpec, ViewResult,
};

/// Everything a view renders from. Snapshots are immutable: every transition
/// builds a new state and leaves the old one untouched for readers that still
/// hold it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub dataset: Dataset,
    pub dimensions: Vec<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub store: FilterStore,
    pub sort: Option<SortSpec>,
    pub date: Option<DateFilter>,
    pub selections: Vec<Selection>,
    pub pagination: Pagination,
}

impl ViewState {
    pub fn load(dataset: Dataset, schema: &ViewSchema, pagination: Pagination) -> Self {
        let dimensions = discover(dataset.records());
        let columns = schema.columns(&dimension_columns(&dimensions));
        let store = FilterStore::initialize(&dataset, schema, &dimensions);
        Self {
            dataset,
            dimensions,
            columns,
            store,
            sort: None,
            date: None,
            selections: Vec::new(),
            pagination: pagination.first_page(),
        }
    }

    /// Replaces the dataset wholesale. Filters are rebuilt from the new data;
    /// only the page size survives.
    pub fn with_dataset(&self, dataset: Dataset, schema: &ViewSchema) -> Self {
        Self::load(dataset, schema, self.pagination)
    }

    fn refiltered(&self, store: FilterStore) -> Self {
        Self {
            store,
            pagination: self.pagination.first_page(),
            ..self.clone()
        }
    }

    pub fn with_filter_update(&self, field: &FieldId, patch: FilterPatch) -> Self {
        self.refiltered(self.store.clone().update(field, patch))
    }

    pub fn with_filter_reset(&self, field: &FieldId) -> Self {
        self.refiltered(self.store.clone().reset(field))
    }

    /// "Clear all": every store filter back to its bounds and the standalone
    /// date and selection filters dropped.
    pub fn with_filters_cleared(&self) -> Self {
        Self {
            date: None,
            selections: Vec::new(),
            ..self.refiltered(self.store.clone().cleared())
        }
    }

    pub fn with_date_filter(&self, date: Option<DateFilter>) -> Self {
        Self {
            date: date.filter(|scoped| scoped.filter.is_active()),
            pagination: self.pagination.first_page(),
            ..self.clone()
        }
    }

    /// Replaces the selection on the same field; an empty selection removes
    /// it.
    pub fn with_selection(&self, selection: Selection) -> Self {
        let mut selections: Vec<Selection> = self
            .selections
            .iter()
            .filter(|existing| existing.field != selection.field)
            .cloned()
            .collect();
        if selection.filter.is_active() {
            selections.push(selection);
        }
        Self {
            selections,
            pagination: self.pagination.first_page(),
            ..self.clone()
        }
    }

    pub fn selection(&self, field: &FieldId) -> Option<&Selection> {
        self.selections.iter().find(|s| &s.field == field)
    }

    pub fn with_sort(&self, sort: Option<SortSpec>) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Header click cycle: ascending, then descending, then unsorted. A click
    /// on another column starts that column ascending.
    pub fn toggle_sort(&self, field: &FieldId) -> Self {
        let next = match &self.sort {
            Some(current) if &current.field == field => match current.direction {
                SortDirection::Asc => Some(SortSpec::desc(field.clone())),
                SortDirection::Desc => None,
            },
            _ => Some(SortSpec::asc(field.clone())),
        };
        self.with_sort(next)
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self {
            pagination: self.pagination.at_page(page),
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: usize) -> Self {
        Self {
            pagination: self.pagination.with_page_size(page_size),
            ..self.clone()
        }
    }

    pub fn active_filter_count(&self) -> usize {
        self.store.active_count() + usize::from(self.date.is_some()) + self.selections.len()
    }

    fn filtered(&self) -> Vec<RowRef<'_>> {
        apply(&self.dataset, &self.store, self.date.as_ref(), &self.selections)
    }
}

fn flatten(row: &RowRef<'_>, dimensions: &[String]) -> FlatRow {
    let mut cells = row.record.fields.clone();
    for name in dimensions {
        let field = FieldId::dimension(name);
        // Text-only verdicts ("Pass") are shown but never filtered or sorted on.
        let value = match row.lookup(&field) {
            Cell::Null => row
                .record
                .quality_dimensions
                .get(name)
                .and_then(|dim| dim.score_text.clone())
                .map(Value::Text)
                .unwrap_or(Value::Null),
            cell => cell.to_value(),
        };
        cells.insert(field.key(), value);
    }
    FlatRow {
        key: row.key,
        cells,
    }
}

/// Derives what the table and summary header show. Aggregates describe the
/// whole filtered set and are independent of sorting and paging.
pub fn recompute(schema: &ViewSchema, state: &ViewState) -> ViewResult {
    let filtered = state.filtered();
    let aggregates = aggregate(
        &filtered,
        &AggregateSpec::for_schema(schema, &state.dimensions),
    );
    let total_filtered_count = filtered.len();

    let ordered = match &state.sort {
        Some(spec) => sort(filtered, spec, schema),
        None => filtered,
    };
    let rows = paginate(&ordered, state.pagination)
        .iter()
        .map(|row| flatten(row, &state.dimensions))
        .collect();

    ViewResult {
        rows,
        total_filtered_count,
        page: state.pagination.page,
        page_count: page_count(total_filtered_count, state.pagination.page_size()),
        aggregates,
    }
}

/// Chart input: filtered rows aggregated per value of the schema's group
/// field. Empty when the schema declares none.
pub fn group_summaries(schema: &ViewSchema, state: &ViewState) -> Vec<GroupSummary> {
    let Some(group_field) = schema.group_field_id() else {
        return Vec::new();
    };
    let spec = AggregateSpec::for_schema(schema, &state.dimensions);
    summarize_groups(&state.filtered(), &group_field, &spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::dataset::{DimensionScore, Record, RowKey};
    use crate::domain::entities::filter::TextOperator;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn task_rows() -> Dataset {
        Dataset::new(vec![
            Record::new()
                .with_field("task_id", 11.0)
                .with_field("reviewer_name", "John")
                .with_field("task_score", 2.0)
                .with_field("domain", "Math")
                .with_field("updated_at", "2024-01-05T23:59:59")
                .with_dimension("A", 3.0)
                .with_dimension("B", 4.0),
            Record::new()
                .with_field("task_id", 12.0)
                .with_field("reviewer_name", "Joan")
                .with_field("task_score", 4.5)
                .with_field("domain", "Code")
                .with_field("updated_at", "2024-01-06T00:00:01")
                .with_dimension("B", 2.0)
                .with_dimension("C", 5.0),
            Record::new()
                .with_field("task_id", 13.0)
                .with_field("reviewer_name", "Amy")
                .with_field("task_score", None::<f64>)
                .with_field("domain", "Math")
                .with_field("updated_at", "2024-01-03"),
        ])
    }

    fn load() -> (ViewSchema, ViewState) {
        let schema = ViewSchema::task_level();
        let state = ViewState::load(task_rows(), &schema, Pagination::new(2));
        (schema, state)
    }

    fn row_keys(result: &ViewResult) -> Vec<usize> {
        result.rows.iter().map(|row| row.key.0).collect()
    }

    #[test]
    fn range_filter_scenario() {
        let (schema, state) = load();
        let score = FieldId::field("task_score");
        let state = state
            .with_page_size(10)
            .with_filter_update(&score, FilterPatch::Range(3.0, 5.0));
        let result = recompute(&schema, &state);
        assert_eq!(row_keys(&result), vec![1]);
        assert_eq!(result.aggregates.count, 1);
    }

    #[test]
    fn discovered_dimensions_become_flattened_cells() {
        let (schema, state) = load();
        assert_eq!(state.dimensions, vec!["A", "B", "C"]);
        let keys: Vec<String> = state.columns.iter().map(ColumnDescriptor::key).collect();
        assert!(keys.ends_with(&[
            "dim:A".to_string(),
            "dim:B".to_string(),
            "dim:C".to_string()
        ]));

        let result = recompute(&schema, &state);
        let first = &result.rows[0];
        assert_eq!(first.get(&FieldId::dimension("A")), &Value::Number(3.0));
        assert_eq!(first.get(&FieldId::dimension("C")), &Value::Null);
        assert!(first.cells.contains_key("dim:C"));
    }

    #[test]
    fn text_filter_scenario() {
        let (schema, state) = load();
        let name = FieldId::field("reviewer_name");
        let state = state
            .with_filter_update(&name, FilterPatch::Operator(TextOperator::StartsWith))
            .with_filter_update(&name, FilterPatch::Text("Jo".into()));
        assert_eq!(row_keys(&recompute(&schema, &state)), vec![0, 1]);
    }

    #[test]
    fn date_filter_scenario() {
        let (schema, state) = load();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5);
        let state = state.with_date_filter(Some(DateFilter::between(
            FieldId::field("updated_at"),
            None,
            end,
        )));
        assert_eq!(row_keys(&recompute(&schema, &state)), vec![0, 2]);
    }

    #[test]
    fn sort_changes_leave_aggregates_alone_and_keep_the_page() {
        let (schema, state) = load();
        let state = state.with_page(1);
        let before = recompute(&schema, &state);

        let score = FieldId::field("task_score");
        let sorted = state.toggle_sort(&score);
        assert_eq!(sorted.pagination.page, 1);
        let after = recompute(&schema, &sorted);
        assert_eq!(after.aggregates, before.aggregates);
        assert_eq!(after.total_filtered_count, 3);
        assert_eq!(after.page_count, 2);
        // descending page 0 is [4.5, 2.0]; the null score sorts last
        let desc = sorted.toggle_sort(&score);
        assert_eq!(row_keys(&recompute(&schema, &desc)), vec![2]);
        assert_eq!(desc.toggle_sort(&score).sort, None);
    }

    #[test]
    fn range_back_on_bounds_restores_the_count() {
        let (schema, state) = load();
        let score = FieldId::field("task_score");
        let narrowed = state.with_filter_update(&score, FilterPatch::Range(3.0, 4.5));
        assert_eq!(recompute(&schema, &narrowed).aggregates.count, 1);

        let widened = narrowed.with_filter_update(&score, FilterPatch::Range(2.0, 4.5));
        assert_eq!(widened.store.active_count(), 0);
        assert_eq!(recompute(&schema, &widened).aggregates.count, 3);
    }

    #[test]
    fn filter_changes_reset_the_page_but_sort_is_kept() {
        let (_, state) = load();
        let state = state
            .toggle_sort(&FieldId::field("task_id"))
            .with_page(1)
            .with_selection(Selection::of(FieldId::field("domain"), ["Math"]));
        assert_eq!(state.pagination.page, 0);
        assert!(state.sort.is_some());
        assert_eq!(state.active_filter_count(), 1);

        let state = state.with_page(1).with_filters_cleared();
        assert_eq!(state.pagination.page, 0);
        assert_eq!(state.active_filter_count(), 0);
    }

    #[test]
    fn page_size_change_returns_to_the_first_page_and_keeps_sort() {
        let (schema, state) = load();
        let state = state.toggle_sort(&FieldId::field("task_score")).with_page(1);
        assert_eq!(state.pagination.page, 1);

        let resized = state.with_page_size(50);
        assert_eq!(resized.pagination.page, 0);
        assert_eq!(resized.pagination.page_size(), 50);
        assert_eq!(resized.sort, state.sort);
        assert_eq!(recompute(&schema, &resized).page, 0);
    }

    #[test]
    fn text_only_dimensions_flatten_to_their_label() {
        let schema = ViewSchema::task_level();
        let verdict = DimensionScore {
            score: None,
            score_text: Some("Pass".to_string()),
        };
        let dataset = Dataset::new(vec![
            Record::new().with_dimension("Tone", verdict),
            Record::new().with_dimension("Tone", 4.0),
        ]);
        let state = ViewState::load(dataset, &schema, Pagination::new(10));
        let tone = FieldId::dimension("Tone");

        let result = recompute(&schema, &state);
        assert_eq!(result.rows[0].get(&tone), &Value::Text("Pass".to_string()));
        assert_eq!(result.rows[1].get(&tone), &Value::Number(4.0));
        assert_eq!(result.aggregates.average(&tone), Some(4.0));

        let sorted = recompute(&schema, &state.toggle_sort(&tone));
        assert_eq!(row_keys(&sorted), vec![1, 0]);
    }

    #[test]
    fn new_dataset_resets_everything_but_page_size() {
        let (schema, state) = load();
        let state = state
            .toggle_sort(&FieldId::field("task_id"))
            .with_selection(Selection::of(FieldId::field("domain"), ["Math"]))
            .with_page(1);
        let reloaded = state.with_dataset(
            Dataset::new(vec![Record::new().with_field("task_score", 1.0)]),
            &schema,
        );
        assert_eq!(reloaded.sort, None);
        assert!(reloaded.selections.is_empty());
        assert_eq!(reloaded.pagination, Pagination::new(2));
        assert!(reloaded.dimensions.is_empty());
        assert_eq!(recompute(&schema, &reloaded).rows[0].key, RowKey(0));
    }

    #[test]
    fn recompute_is_idempotent_and_empty_data_is_quiet() {
        let (schema, state) = load();
        assert_eq!(recompute(&schema, &state), recompute(&schema, &state));

        let empty = ViewState::load(Dataset::empty(), &schema, Pagination::default());
        let result = recompute(&schema, &empty);
        assert!(result.rows.is_empty());
        assert_eq!(result.total_filtered_count, 0);
        assert_eq!(result.page_count, 1);
        assert_eq!(result.aggregates.count, 0);
        assert!(empty.columns.iter().all(|column| !column.field.is_dimension()));
    }

    #[test]
    fn groups_follow_the_filtered_rows() {
        let (schema, state) = load();
        let groups = group_summaries(&schema, &state);
        let keys: Vec<Option<&str>> = groups.iter().map(|g| g.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("Code"), Some("Math")]);
        assert_eq!(groups[1].aggregates.count, 2);
    }
}
