use std::collections::BTreeSet;

use crate::domain::engine::text::collate;
use crate::domain::entities::dataset::{Dataset, Record};
use crate::domain::entities::field::{ColumnDescriptor, FieldId};

/// Sorted union of every quality-dimension name in `records`, including
/// dimensions whose score is null.
pub fn discover(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.quality_dimensions.keys())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn dimension_columns(names: &[String]) -> Vec<ColumnDescriptor> {
    names
        .iter()
        .map(|name| ColumnDescriptor::dimension(name))
        .collect()
}

/// Distinct non-null values of a field, stringified, in display order. Feeds
/// the choices of a multi-select filter.
pub fn option_values(dataset: &Dataset, field: &FieldId) -> Vec<String> {
    let mut values: Vec<String> = dataset
        .records()
        .iter()
        .filter_map(|record| record.lookup(field).as_text().map(|text| text.into_owned()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    values.sort_by(|a, b| collate(a, b));
    values
}
