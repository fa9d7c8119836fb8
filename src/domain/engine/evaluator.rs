use chrono::{Days, NaiveDateTime, NaiveTime};

use crate::domain::engine::filter_store::FilterStore;
use crate::domain::engine::text::casefold;
use crate::domain::entities::dataset::{Cell, Dataset, RowRef};
use crate::domain::entities::field::FieldId;
use crate::domain::entities::filter::{
    DateFilter, DateRangeFilter, FilterSpec, MultiSelectFilter, NumericRangeFilter, Selection,
    TextFilter, TextOperator,
};

/// A filter resolved against the dataset it will run over. Needles are folded
/// once here instead of per record.
enum Predicate<'s> {
    Range(&'s NumericRangeFilter),
    Text {
        operator: TextOperator,
        needle: String,
    },
    Dates {
        from: Option<NaiveDateTime>,
        until: Option<NaiveDateTime>,
    },
    Select(&'s MultiSelectFilter),
}

impl<'s> Predicate<'s> {
    fn from_spec(spec: &'s FilterSpec) -> Self {
        match spec {
            FilterSpec::NumericRange(filter) => Predicate::Range(filter),
            FilterSpec::Text(filter) => Self::text(filter),
            FilterSpec::DateRange(filter) => Self::dates(filter),
            FilterSpec::MultiSelect(filter) => Predicate::Select(filter),
        }
    }

    fn text(filter: &TextFilter) -> Self {
        Predicate::Text {
            operator: filter.operator,
            needle: casefold(filter.value.trim()),
        }
    }

    /// The end bound is exclusive at the following midnight so the whole end
    /// day matches.
    fn dates(filter: &DateRangeFilter) -> Self {
        Predicate::Dates {
            from: filter.start.map(|date| date.and_time(NaiveTime::MIN)),
            until: filter
                .end
                .and_then(|date| date.checked_add_days(Days::new(1)))
                .map(|date| date.and_time(NaiveTime::MIN)),
        }
    }

    fn matches(&self, cell: Cell<'_>) -> bool {
        match self {
            Predicate::Range(filter) => cell.as_number().is_some_and(|v| filter.contains(v)),
            Predicate::Text { operator, needle } => {
                let Some(text) = cell.as_text() else {
                    return false;
                };
                let hay = casefold(&text);
                match operator {
                    TextOperator::Contains => hay.contains(needle.as_str()),
                    TextOperator::Equals => hay == *needle,
                    TextOperator::StartsWith => hay.starts_with(needle.as_str()),
                    TextOperator::EndsWith => hay.ends_with(needle.as_str()),
                }
            }
            Predicate::Dates { from, until } => {
                let Some(at) = cell.as_datetime() else {
                    return false;
                };
                from.map_or(true, |from| at >= from) && until.map_or(true, |until| at < until)
            }
            Predicate::Select(filter) => cell
                .as_text()
                .is_some_and(|text| filter.selected.contains(&*text)),
        }
    }
}

/// Rows of `dataset` that satisfy every active filter, in fetch order.
///
/// Filters on fields that no record carries are skipped, so a filter left
/// over from a previous dataset never empties the table.
pub fn apply<'d>(
    dataset: &'d Dataset,
    store: &FilterStore,
    date: Option<&DateFilter>,
    selections: &[Selection],
) -> Vec<RowRef<'d>> {
    let date_spec = date
        .filter(|scoped| scoped.filter.is_active())
        .map(|scoped| (&scoped.field, Predicate::dates(&scoped.filter)));
    let selection_specs = selections
        .iter()
        .filter(|scoped| scoped.filter.is_active())
        .map(|scoped| (&scoped.field, Predicate::Select(&scoped.filter)));

    let predicates: Vec<(&FieldId, Predicate<'_>)> = store
        .active()
        .map(|(field, spec)| (field, Predicate::from_spec(spec)))
        .chain(date_spec)
        .chain(selection_specs)
        .filter(|(field, _)| dataset.contains_field(field))
        .collect();

    dataset
        .rows()
        .filter(|row| {
            predicates
                .iter()
                .all(|(field, predicate)| predicate.matches(row.lookup(field)))
        })
        .collect()
}
