use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix used for flattened quality-dimension columns, e.g. `dim:Accuracy`.
pub const DIMENSION_PREFIX: &str = "dim:";

/// Identifies a column of a view: either a fixed field of every record or one
/// of the quality dimensions discovered in the current dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldId {
    Static(String),
    Dimension(String),
}

impl FieldId {
    pub fn field(name: &str) -> Self {
        FieldId::Static(name.to_string())
    }

    pub fn dimension(name: &str) -> Self {
        FieldId::Dimension(name.to_string())
    }

    /// Inverse of [`FieldId::key`].
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix(DIMENSION_PREFIX) {
            Some(name) => FieldId::Dimension(name.to_string()),
            None => FieldId::Static(key.to_string()),
        }
    }

    /// Flattened column key used in rendered rows.
    pub fn key(&self) -> String {
        match self {
            FieldId::Static(name) => name.clone(),
            FieldId::Dimension(name) => format!("{DIMENSION_PREFIX}{name}"),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldId::Static(name) | FieldId::Dimension(name) => name,
        }
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self, FieldId::Dimension(_))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Static(name) => write!(f, "{name}"),
            FieldId::Dimension(name) => write!(f, "{DIMENSION_PREFIX}{name}"),
        }
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        FieldId::parse(&value)
    }
}

impl From<FieldId> for String {
    fn from(value: FieldId) -> Self {
        value.key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
}

/// One renderable column. Renderers and the engine share this list as the
/// single answer to "which columns exist right now".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    pub name: String,
    pub field: FieldId,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn dimension(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field: FieldId::dimension(name),
            kind: ColumnKind::Numeric,
        }
    }

    pub fn key(&self) -> String {
        self.field.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_parse() {
        let dim = FieldId::dimension("Accuracy");
        assert_eq!(dim.key(), "dim:Accuracy");
        assert_eq!(FieldId::parse("dim:Accuracy"), dim);
        assert_eq!(FieldId::parse("task_score"), FieldId::field("task_score"));
        assert_eq!(dim.to_string(), dim.key());
    }
}
