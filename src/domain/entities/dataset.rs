use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

use crate::domain::entities::field::FieldId;

pub const QUALITY_DIMENSIONS_KEY: &str = "quality_dimensions";

/// A single field value as delivered by the reporting backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_cell(&self) -> Cell<'_> {
        match self {
            Value::Null => Cell::Null,
            Value::Number(n) => Cell::Number(*n),
            Value::Text(s) => Cell::Text(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Table rendering: nulls are blank and numbers use [`format_number`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Text(b.to_string()),
            JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            JsonValue::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

/// Borrowed view of a field value. Lookups hand these out so sorting and
/// filtering never clone record text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Null,
    Number(f64),
    Text(&'a str),
}

impl<'a> Cell<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric reading of the cell. Numeric-looking text is parsed; NaN,
    /// infinities and unparsable text read as absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Number(n) => n.is_finite().then_some(*n),
            Cell::Text(s) => parse_number(s),
        }
    }

    pub fn as_text(&self) -> Option<Cow<'a, str>> {
        match self {
            Cell::Null => None,
            Cell::Number(n) => Some(Cow::Owned(format_number(*n))),
            Cell::Text(s) => Some(Cow::Borrowed(*s)),
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Number(n) => Value::Number(n),
            Cell::Text(s) => Value::Text(s.to_string()),
        }
    }
}

pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Renders a number the way the dashboard displays it: integral values lose
/// their fraction, other values keep up to six decimals without trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{value:.6}");
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
        text
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses record timestamps. Offsets are dropped and the wall-clock time as
/// written is kept; a bare date reads as midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Score recorded for one quality dimension of a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DimensionScore {
    pub score: Option<f64>,
    pub score_text: Option<String>,
}

impl DimensionScore {
    pub fn new(score: f64) -> Self {
        Self {
            score: score.is_finite().then_some(score),
            score_text: None,
        }
    }

    fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => Self {
                score: n.as_f64().filter(|n| n.is_finite()),
                score_text: None,
            },
            JsonValue::String(s) => match parse_number(s) {
                Some(score) => Self {
                    score: Some(score),
                    score_text: None,
                },
                None => Self {
                    score: None,
                    score_text: Some(s.clone()),
                },
            },
            // Grouped rows carry a per-group `average_score` instead of `score`.
            JsonValue::Object(map) => Self {
                score: map
                    .get("score")
                    .and_then(json_number)
                    .or_else(|| map.get("average_score").and_then(json_number)),
                score_text: map
                    .get("score_text")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            },
            _ => Self::default(),
        }
    }
}

fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        JsonValue::String(s) => parse_number(s),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
    pub quality_dimensions: BTreeMap<String, DimensionScore>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_dimension(mut self, name: &str, score: impl Into<DimensionScore>) -> Self {
        self.quality_dimensions
            .insert(name.to_string(), score.into());
        self
    }

    pub fn lookup(&self, field: &FieldId) -> Cell<'_> {
        match field {
            FieldId::Static(name) => self
                .fields
                .get(name)
                .map(Value::as_cell)
                .unwrap_or(Cell::Null),
            FieldId::Dimension(name) => self
                .quality_dimensions
                .get(name)
                .and_then(|dim| dim.score)
                .map(Cell::Number)
                .unwrap_or(Cell::Null),
        }
    }

    pub fn has_field(&self, field: &FieldId) -> bool {
        match field {
            FieldId::Static(name) => self.fields.contains_key(name),
            FieldId::Dimension(name) => self.quality_dimensions.contains_key(name),
        }
    }

    /// Builds a record from one JSON object of a fetch response. Anything other
    /// than an object yields an empty record.
    pub fn from_json(value: JsonValue) -> Self {
        let JsonValue::Object(map) = value else {
            return Self::default();
        };

        let mut record = Self::default();
        for (key, value) in map {
            if key == QUALITY_DIMENSIONS_KEY {
                record.quality_dimensions = dimensions_from_json(&value);
            } else {
                record.fields.insert(key, Value::from(value));
            }
        }
        record
    }
}

impl From<f64> for DimensionScore {
    fn from(value: f64) -> Self {
        DimensionScore::new(value)
    }
}

impl From<Option<f64>> for DimensionScore {
    fn from(value: Option<f64>) -> Self {
        value.map(DimensionScore::new).unwrap_or_default()
    }
}

fn dimensions_from_json(value: &JsonValue) -> BTreeMap<String, DimensionScore> {
    match value {
        JsonValue::Object(map) => map
            .iter()
            .map(|(name, score)| (name.clone(), DimensionScore::from_json(score)))
            .collect(),
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?.to_string();
                Some((name, DimensionScore::from_json(item)))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Position of a record in its fetch. Stable for the lifetime of a dataset and
/// used as the list key of rendered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(pub usize);

#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    pub key: RowKey,
    pub record: &'a Record,
}

impl<'a> RowRef<'a> {
    pub fn lookup(&self, field: &FieldId) -> Cell<'a> {
        self.record.lookup(field)
    }
}

/// Immutable snapshot of one fetch. Clones share the record buffer.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[Record]>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => Self::new(items.into_iter().map(Record::from_json).collect()),
            _ => Self::empty(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let value: JsonValue = serde_json::from_str(text)?;
        Ok(Self::from_json(value))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| RowRef {
                key: RowKey(idx),
                record,
            })
    }

    /// True when at least one record carries the field, null or not.
    pub fn contains_field(&self, field: &FieldId) -> bool {
        self.records.iter().any(|record| record.has_field(field))
    }

    pub fn static_field_names(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|record| record.fields.keys().map(String::as_str))
            .collect()
    }

    pub fn ptr_eq(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}
