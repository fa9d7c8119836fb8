//! Property tests for the view pipeline: filtering, sorting, aggregation and
//! dimension discovery over randomly generated task records.

use proptest::prelude::*;

use review_dashboard::domain::engine::columns::discover;
use review_dashboard::domain::engine::coordinator::{recompute, ViewState};
use review_dashboard::domain::engine::evaluator::apply;
use review_dashboard::domain::engine::filter_store::FilterStore;
use review_dashboard::domain::engine::sorter::sort;
use review_dashboard::domain::entities::dataset::{Dataset, Record};
use review_dashboard::domain::entities::field::FieldId;
use review_dashboard::domain::entities::filter::FilterPatch;
use review_dashboard::domain::entities::schema::ViewSchema;
use review_dashboard::domain::entities::view::{Pagination, SortSpec};

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        0u32..50,
        proptest::option::of(-100.0f64..100.0),
        proptest::option::of(prop::sample::select(vec!["Math", "Code", "Bio"])),
        proptest::collection::btree_map(
            prop::sample::select(vec!["Accuracy", "Clarity", "Tone"]),
            proptest::option::of(0.0f64..5.0),
            0..3,
        ),
    )
        .prop_map(|(task_id, score, domain, dimensions)| {
            let mut record = Record::new()
                .with_field("task_id", f64::from(task_id))
                .with_field("task_score", score)
                .with_field("domain", domain);
            for (name, score) in dimensions {
                record = record.with_dimension(name, score);
            }
            record
        })
}

fn dataset_strategy() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(record_strategy(), 0..40)
}

fn scores(rows: &[review_dashboard::domain::entities::dataset::RowRef<'_>]) -> Vec<Option<f64>> {
    let field = FieldId::field("task_score");
    rows.iter().map(|row| row.lookup(&field).as_number()).collect()
}

proptest! {
    #[test]
    fn filtering_never_adds_rows(records in dataset_strategy(), lo in -120.0f64..120.0, width in 0.0f64..100.0) {
        let schema = ViewSchema::task_level();
        let state = ViewState::load(Dataset::new(records), &schema, Pagination::new(25))
            .with_filter_update(&FieldId::field("task_score"), FilterPatch::Range(lo, lo + width));
        let matched = apply(&state.dataset, &state.store, state.date.as_ref(), &state.selections);
        prop_assert!(matched.len() <= state.dataset.len());
    }

    #[test]
    fn reset_store_keeps_every_row_in_fetch_order(records in dataset_strategy()) {
        let schema = ViewSchema::task_level();
        let dataset = Dataset::new(records);
        let dimensions = discover(dataset.records());
        let store = FilterStore::reset_all(&dataset, &schema, &dimensions);
        let matched = apply(&dataset, &store, None, &[]);
        let keys: Vec<usize> = matched.iter().map(|row| row.key.0).collect();
        prop_assert_eq!(keys, (0..dataset.len()).collect::<Vec<_>>());
    }

    #[test]
    fn descending_reverses_ascending_and_nulls_stay_last(records in dataset_strategy()) {
        let schema = ViewSchema::task_level();
        let dataset = Dataset::new(records);
        let field = FieldId::field("task_score");
        let asc = scores(&sort(dataset.rows().collect(), &SortSpec::asc(field.clone()), &schema));
        let desc = scores(&sort(dataset.rows().collect(), &SortSpec::desc(field), &schema));

        let present = asc.iter().filter(|score| score.is_some()).count();
        prop_assert!(asc[present..].iter().all(Option::is_none));
        prop_assert!(desc[present..].iter().all(Option::is_none));

        let mut reversed = asc[..present].to_vec();
        reversed.reverse();
        prop_assert_eq!(reversed, desc[..present].to_vec());
    }

    #[test]
    fn aggregate_count_matches_filtered_rows(records in dataset_strategy(), lo in -120.0f64..120.0) {
        let schema = ViewSchema::task_level();
        let state = ViewState::load(Dataset::new(records), &schema, Pagination::new(10))
            .with_filter_update(&FieldId::field("task_score"), FilterPatch::Range(lo, 120.0));
        let result = recompute(&schema, &state);
        let matched = apply(&state.dataset, &state.store, state.date.as_ref(), &state.selections);
        prop_assert_eq!(result.aggregates.count, result.total_filtered_count);
        prop_assert_eq!(result.total_filtered_count, matched.len());
        prop_assert!(result.rows.len() <= 10);
    }

    #[test]
    fn recompute_is_idempotent(records in dataset_strategy(), page in 0usize..5) {
        let schema = ViewSchema::task_level();
        let state = ViewState::load(Dataset::new(records), &schema, Pagination::new(7))
            .toggle_sort(&FieldId::field("task_id"))
            .with_page(page);
        prop_assert_eq!(recompute(&schema, &state), recompute(&schema, &state));
    }

    #[test]
    fn discovered_dimensions_ignore_record_order(records in dataset_strategy()) {
        let mut reversed = records.clone();
        reversed.reverse();
        prop_assert_eq!(discover(&records), discover(&reversed));
    }
}
