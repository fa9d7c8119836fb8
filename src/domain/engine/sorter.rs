use std::borrow::Cow;
use std::cmp::Ordering;

use crate::domain::engine::text::collate;
use crate::domain::entities::dataset::{Cell, RowRef};
use crate::domain::entities::field::FieldId;
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::view::{SortDirection, SortSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Identifier,
    Numeric,
    Mixed,
}

impl Comparison {
    fn for_field(schema: &ViewSchema, field: &FieldId) -> Self {
        if schema.is_identifier(field) {
            Comparison::Identifier
        } else if schema.is_numeric(field) {
            Comparison::Numeric
        } else {
            Comparison::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey<'a> {
    Number(f64),
    Text(Cow<'a, str>),
}

fn sort_key(cell: Cell<'_>, comparison: Comparison) -> Option<SortKey<'_>> {
    match comparison {
        Comparison::Identifier => cell.as_text().map(SortKey::Text),
        Comparison::Numeric => cell.as_number().map(SortKey::Number),
        Comparison::Mixed => match cell {
            Cell::Null => None,
            Cell::Number(_) => cell.as_number().map(SortKey::Number),
            Cell::Text(text) => Some(SortKey::Text(Cow::Borrowed(text))),
        },
    }
}

fn compare_present(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => collate(a, b),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    }
}

/// Missing keys sort last in both directions; descending only reverses the
/// comparison between present values.
fn compare_keys(
    a: Option<&SortKey<'_>>,
    b: Option<&SortKey<'_>>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_present(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Stable sort of filtered rows by one column.
pub fn sort<'d>(rows: Vec<RowRef<'d>>, spec: &SortSpec, schema: &ViewSchema) -> Vec<RowRef<'d>> {
    let comparison = Comparison::for_field(schema, &spec.field);
    let mut keyed: Vec<(Option<SortKey<'d>>, RowRef<'d>)> = rows
        .into_iter()
        .map(|row| (sort_key(row.lookup(&spec.field), comparison), row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), spec.direction));
    keyed.into_iter().map(|(_, row)| row).collect()
}
