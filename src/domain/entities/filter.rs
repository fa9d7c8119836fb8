use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::field::FieldId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRangeFilter {
    pub min: f64,
    pub max: f64,
    pub current: (f64, f64),
}

impl NumericRangeFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            current: (min, max),
        }
    }

    /// A range dragged back onto its original bounds is indistinguishable from
    /// an untouched one and filters nothing.
    pub fn is_active(&self) -> bool {
        self.current != (self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.current.0 <= value && value <= self.current.1
    }

    /// Orders and clamps a requested range into the observed bounds.
    pub fn with_range(self, lo: f64, hi: f64) -> Option<Self> {
        if lo.is_nan() || hi.is_nan() {
            return None;
        }
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Some(Self {
            current: (lo.clamp(self.min, self.max), hi.clamp(self.min, self.max)),
            ..self
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperator {
    #[default]
    Contains,
    Equals,
    StartsWith,
    EndsWith,
}

impl TextOperator {
    pub const ALL: [TextOperator; 4] = [
        TextOperator::Contains,
        TextOperator::Equals,
        TextOperator::StartsWith,
        TextOperator::EndsWith,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextOperator::Contains => "contains",
            TextOperator::Equals => "equals",
            TextOperator::StartsWith => "starts with",
            TextOperator::EndsWith => "ends with",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "contains" => Some(TextOperator::Contains),
            "equals" => Some(TextOperator::Equals),
            "startswith" | "starts_with" | "starts with" => Some(TextOperator::StartsWith),
            "endswith" | "ends_with" | "ends with" => Some(TextOperator::EndsWith),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextFilter {
    pub operator: TextOperator,
    pub value: String,
}

impl TextFilter {
    pub fn is_active(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRangeFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeFilter {
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiSelectFilter {
    pub selected: BTreeSet<String>,
}

impl MultiSelectFilter {
    pub fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    NumericRange(NumericRangeFilter),
    Text(TextFilter),
    DateRange(DateRangeFilter),
    MultiSelect(MultiSelectFilter),
}

impl FilterSpec {
    pub fn is_active(&self) -> bool {
        match self {
            FilterSpec::NumericRange(f) => f.is_active(),
            FilterSpec::Text(f) => f.is_active(),
            FilterSpec::DateRange(f) => f.is_active(),
            FilterSpec::MultiSelect(f) => f.is_active(),
        }
    }

    /// Applies the user-editable portion of a filter. Returns `None` when the
    /// patch does not fit this kind of filter.
    pub fn patched(&self, patch: FilterPatch) -> Option<FilterSpec> {
        match (self, patch) {
            (FilterSpec::NumericRange(f), FilterPatch::Range(lo, hi)) => {
                f.with_range(lo, hi).map(FilterSpec::NumericRange)
            }
            (FilterSpec::Text(f), FilterPatch::Text(value)) => Some(FilterSpec::Text(TextFilter {
                operator: f.operator,
                value,
            })),
            (FilterSpec::Text(f), FilterPatch::Operator(operator)) => {
                Some(FilterSpec::Text(TextFilter {
                    operator,
                    value: f.value.clone(),
                }))
            }
            (FilterSpec::DateRange(_), FilterPatch::Dates(start, end)) => {
                Some(FilterSpec::DateRange(DateRangeFilter { start, end }))
            }
            (FilterSpec::MultiSelect(_), FilterPatch::Selected(selected)) => {
                Some(FilterSpec::MultiSelect(MultiSelectFilter { selected }))
            }
            _ => None,
        }
    }
}

/// User interaction on one filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPatch {
    Range(f64, f64),
    Text(String),
    Operator(TextOperator),
    Dates(Option<NaiveDate>, Option<NaiveDate>),
    Selected(BTreeSet<String>),
}

/// A filter that is not keyed in the store and therefore names its field.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoped<F> {
    pub field: FieldId,
    pub filter: F,
}

impl<F> Scoped<F> {
    pub fn new(field: FieldId, filter: F) -> Self {
        Self { field, filter }
    }
}

pub type DateFilter = Scoped<DateRangeFilter>;
pub type Selection = Scoped<MultiSelectFilter>;

impl DateFilter {
    pub fn between(field: FieldId, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Scoped::new(field, DateRangeFilter { start, end })
    }
}

impl Selection {
    pub fn of<I, S>(field: FieldId, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scoped::new(
            field,
            MultiSelectFilter {
                selected: values.into_iter().map(Into::into).collect(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_patches_are_ordered_and_clamped() {
        let filter = NumericRangeFilter::new(2.0, 4.5);
        let patched = filter.with_range(5.0, 3.0).expect("valid range");
        assert_eq!(patched.current, (3.0, 4.5));
        assert!(patched.is_active());
        assert_eq!(filter.with_range(f64::NAN, 1.0), None);
    }

    #[test]
    fn range_on_original_bounds_is_inactive() {
        let filter = NumericRangeFilter::new(2.0, 4.5);
        let widened = filter.with_range(0.0, 10.0).expect("valid range");
        assert!(!widened.is_active());
    }

    #[test]
    fn mismatched_patch_is_rejected() {
        let spec = FilterSpec::Text(TextFilter::default());
        assert_eq!(spec.patched(FilterPatch::Range(1.0, 2.0)), None);
        let spec = spec
            .patched(FilterPatch::Text("  ".to_string()))
            .expect("text patch fits");
        assert!(!spec.is_active());
    }

    #[test]
    fn operator_names_parse_loosely() {
        assert_eq!(
            TextOperator::parse("startsWith"),
            Some(TextOperator::StartsWith)
        );
        assert_eq!(TextOperator::parse("ends with"), Some(TextOperator::EndsWith));
        assert_eq!(TextOperator::parse("regex"), None);
    }
}
