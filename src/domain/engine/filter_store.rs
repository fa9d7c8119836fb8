use std::collections::BTreeMap;

use crate::domain::entities::dataset::Dataset;
use crate::domain::entities::field::FieldId;
use crate::domain::entities::filter::{FilterPatch, FilterSpec, NumericRangeFilter, TextFilter};
use crate::domain::entities::schema::ViewSchema;

#[derive(Debug, Clone, PartialEq)]
struct FilterEntry {
    initial: FilterSpec,
    current: FilterSpec,
}

/// Per-field filters of one view. Bounds are taken from the unfiltered
/// dataset when the store is built and never move afterwards; interaction only
/// touches the current value of each filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStore {
    entries: BTreeMap<FieldId, FilterEntry>,
}

/// Observed `[min, max]` over the parsable values of a field, or `None` when
/// no record has one.
pub fn numeric_bounds(dataset: &Dataset, field: &FieldId) -> Option<(f64, f64)> {
    dataset
        .records()
        .iter()
        .filter_map(|record| record.lookup(field).as_number())
        .fold(None, |bounds, value| match bounds {
            None => Some((value, value)),
            Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
        })
}

impl FilterStore {
    pub fn initialize(dataset: &Dataset, schema: &ViewSchema, dimensions: &[String]) -> Self {
        let mut entries = BTreeMap::new();

        let numeric_fields = schema
            .numeric_field_ids()
            .filter(|field| !schema.is_identifier(field))
            .chain(dimensions.iter().map(|name| FieldId::dimension(name)));
        for field in numeric_fields {
            if let Some((min, max)) = numeric_bounds(dataset, &field) {
                let spec = FilterSpec::NumericRange(NumericRangeFilter::new(min, max));
                entries.insert(
                    field,
                    FilterEntry {
                        initial: spec.clone(),
                        current: spec,
                    },
                );
            }
        }

        for field in schema.text_field_ids() {
            entries.entry(field).or_insert_with(|| FilterEntry {
                initial: FilterSpec::Text(TextFilter::default()),
                current: FilterSpec::Text(TextFilter::default()),
            });
        }

        Self { entries }
    }

    /// Rebuilds the store from scratch, rescanning bounds.
    pub fn reset_all(dataset: &Dataset, schema: &ViewSchema, dimensions: &[String]) -> Self {
        Self::initialize(dataset, schema, dimensions)
    }

    pub fn get(&self, field: &FieldId) -> Option<&FilterSpec> {
        self.entries.get(field).map(|entry| &entry.current)
    }

    pub fn initial(&self, field: &FieldId) -> Option<&FilterSpec> {
        self.entries.get(field).map(|entry| &entry.initial)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &FilterSpec)> + '_ {
        self.entries
            .iter()
            .map(|(field, entry)| (field, &entry.current))
    }

    pub fn active(&self) -> impl Iterator<Item = (&FieldId, &FilterSpec)> + '_ {
        self.iter().filter(|(_, spec)| spec.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies a patch to one filter. Unknown fields and patches that do not
    /// fit the filter kind leave the store as it was.
    pub fn update(mut self, field: &FieldId, patch: FilterPatch) -> Self {
        if let Some(entry) = self.entries.get_mut(field) {
            if let Some(next) = entry.current.patched(patch) {
                entry.current = next;
            }
        }
        self
    }

    pub fn reset(mut self, field: &FieldId) -> Self {
        if let Some(entry) = self.entries.get_mut(field) {
            entry.current = entry.initial.clone();
        }
        self
    }

    /// Restores every filter to its initial value without rescanning bounds.
    pub fn cleared(mut self) -> Self {
        for entry in self.entries.values_mut() {
            entry.current = entry.initial.clone();
        }
        self
    }
}
