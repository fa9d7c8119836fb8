use std::collections::BTreeMap;

use crate::domain::entities::dataset::{RowKey, Value};
use crate::domain::entities::field::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: FieldId,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: FieldId) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: FieldId) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    pub page: usize,
}

impl Pagination {
    /// A zero page size is bumped to one so slicing stays total.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn at_page(self, page: usize) -> Self {
        Self { page, ..self }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self::new(page_size)
    }

    pub fn first_page(self) -> Self {
        Self { page: 0, ..self }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

static NULL_VALUE: Value = Value::Null;

/// One rendered row: every static field plus one `dim:<name>` cell per
/// discovered dimension, absent dimensions included as null.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub key: RowKey,
    pub cells: BTreeMap<String, Value>,
}

impl FlatRow {
    pub fn get(&self, field: &FieldId) -> &Value {
        self.cells.get(&field.key()).unwrap_or(&NULL_VALUE)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregates {
    pub count: usize,
    pub sums: BTreeMap<String, f64>,
    pub non_null: BTreeMap<String, usize>,
    pub distinct: BTreeMap<String, usize>,
    pub derived: BTreeMap<String, f64>,
}

impl Aggregates {
    pub fn sum(&self, field: &FieldId) -> f64 {
        self.sums.get(&field.key()).copied().unwrap_or(0.0)
    }

    pub fn average(&self, field: &FieldId) -> Option<f64> {
        self.derived.get(&average_key(field)).copied()
    }

    pub fn distinct_count(&self, field: &FieldId) -> usize {
        self.distinct.get(&field.key()).copied().unwrap_or(0)
    }
}

pub fn average_key(field: &FieldId) -> String {
    format!("avg:{}", field.key())
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: Option<String>,
    pub aggregates: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewResult {
    pub rows: Vec<FlatRow>,
    pub total_filtered_count: usize,
    pub page: usize,
    pub page_count: usize,
    pub aggregates: Aggregates,
}
