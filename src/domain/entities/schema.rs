use serde::{Deserialize, Serialize};

use crate::domain::entities::field::{ColumnDescriptor, ColumnKind, FieldId};

/// Percentage of filtered rows whose `field` equals one of `matches`
/// (case-insensitive), published as `derived[name]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSpec {
    pub name: String,
    pub field: String,
    pub matches: Vec<String>,
}

/// Static description of one dashboard view: which fields get which kind of
/// filter and which summaries the header shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSchema {
    pub name: String,
    /// Always compared as text when sorting, even when numeric-looking.
    pub identifier_fields: Vec<String>,
    pub numeric_fields: Vec<String>,
    pub text_fields: Vec<String>,
    pub date_field: Option<String>,
    pub multi_select_fields: Vec<String>,
    pub summed_fields: Vec<String>,
    pub distinct_fields: Vec<String>,
    pub shares: Vec<ShareSpec>,
    pub group_field: Option<String>,
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl ViewSchema {
    pub fn task_level() -> Self {
        Self {
            name: "task_level".to_string(),
            identifier_fields: names(&["task_id"]),
            numeric_fields: names(&["task_score", "rework_count", "week_number"]),
            text_fields: names(&["annotator_name", "reviewer_name", "domain"]),
            date_field: Some("updated_at".to_string()),
            multi_select_fields: names(&["domain"]),
            summed_fields: names(&["task_score", "rework_count"]),
            distinct_fields: names(&["annotator_id", "reviewer_id", "domain"]),
            shares: Vec::new(),
            group_field: Some("domain".to_string()),
        }
    }

    fn grouped(name: &str, group_field: &str, identifier: &str) -> Self {
        Self {
            name: name.to_string(),
            identifier_fields: names(&[identifier]),
            numeric_fields: names(&[
                "task_count",
                "average_task_score",
                "total_rework_count",
                "average_rework_count",
            ]),
            text_fields: names(&[group_field]),
            date_field: None,
            multi_select_fields: Vec::new(),
            summed_fields: names(&["task_count", "total_rework_count"]),
            distinct_fields: names(&[group_field]),
            shares: Vec::new(),
            group_field: Some(group_field.to_string()),
        }
    }

    pub fn by_domain() -> Self {
        Self::grouped("by_domain", "domain", "domain")
    }

    pub fn by_reviewer() -> Self {
        Self::grouped("by_reviewer", "reviewer_name", "reviewer_id")
    }

    pub fn by_trainer() -> Self {
        Self::grouped("by_trainer", "trainer_name", "trainer_id")
    }

    pub fn client_delivery() -> Self {
        Self {
            name: "client_delivery".to_string(),
            identifier_fields: names(&["work_item_id", "task_id"]),
            numeric_fields: names(&["annotator_id"]),
            text_fields: names(&[
                "work_item_id",
                "task_id",
                "task_level_feedback",
                "error_categories",
            ]),
            date_field: Some("delivery_date".to_string()),
            multi_select_fields: names(&["turing_status", "client_status"]),
            summed_fields: Vec::new(),
            distinct_fields: names(&["task_id", "json_filename", "annotator_id"]),
            shares: vec![
                ShareSpec {
                    name: "rework_pct".to_string(),
                    field: "turing_status".to_string(),
                    matches: names(&["Rework"]),
                },
                ShareSpec {
                    name: "approved_pct".to_string(),
                    field: "client_status".to_string(),
                    matches: names(&["APPROVED", "APPROVE"]),
                },
            ],
            group_field: Some("turing_status".to_string()),
        }
    }

    pub fn presets() -> Vec<ViewSchema> {
        vec![
            Self::task_level(),
            Self::by_domain(),
            Self::by_reviewer(),
            Self::by_trainer(),
            Self::client_delivery(),
        ]
    }

    pub fn is_identifier(&self, field: &FieldId) -> bool {
        match field {
            FieldId::Static(name) => self.identifier_fields.iter().any(|f| f == name),
            FieldId::Dimension(_) => false,
        }
    }

    /// Dimensions are always numeric.
    pub fn is_numeric(&self, field: &FieldId) -> bool {
        match field {
            FieldId::Static(name) => self.numeric_fields.iter().any(|f| f == name),
            FieldId::Dimension(_) => true,
        }
    }

    pub fn date_field_id(&self) -> Option<FieldId> {
        self.date_field.as_deref().map(FieldId::field)
    }

    pub fn group_field_id(&self) -> Option<FieldId> {
        self.group_field.as_deref().map(FieldId::field)
    }

    pub fn numeric_field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.numeric_fields.iter().map(|name| FieldId::field(name))
    }

    pub fn text_field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.text_fields.iter().map(|name| FieldId::field(name))
    }

    pub fn multi_select_field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.multi_select_fields.iter().map(|name| FieldId::field(name))
    }

    /// Static columns in declaration order followed by the discovered
    /// dimension columns.
    pub fn columns(&self, dimensions: &[ColumnDescriptor]) -> Vec<ColumnDescriptor> {
        let mut seen = std::collections::BTreeSet::new();
        let mut columns = Vec::new();
        let declared = self
            .identifier_fields
            .iter()
            .chain(&self.text_fields)
            .chain(&self.multi_select_fields)
            .chain(&self.numeric_fields)
            .chain(self.date_field.iter());
        for name in declared {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let kind = if self.numeric_fields.contains(name) {
                ColumnKind::Numeric
            } else if self.date_field.as_ref() == Some(name) {
                ColumnKind::Date
            } else {
                ColumnKind::Text
            };
            columns.push(ColumnDescriptor {
                name: name.clone(),
                field: FieldId::field(name),
                kind,
            });
        }
        columns.extend(dimensions.iter().cloned());
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_not_numeric_even_when_declared_elsewhere() {
        let schema = ViewSchema::task_level();
        assert!(schema.is_identifier(&FieldId::field("task_id")));
        assert!(!schema.is_numeric(&FieldId::field("task_id")));
        assert!(schema.is_numeric(&FieldId::dimension("Accuracy")));
    }

    #[test]
    fn columns_list_static_fields_once_then_dimensions() {
        let schema = ViewSchema::task_level();
        let columns = schema.columns(&[ColumnDescriptor::dimension("Accuracy")]);
        let keys: Vec<String> = columns.iter().map(ColumnDescriptor::key).collect();
        assert_eq!(keys.iter().filter(|k| *k == "domain").count(), 1);
        assert_eq!(keys.last().map(String::as_str), Some("dim:Accuracy"));
        assert_eq!(keys.first().map(String::as_str), Some("task_id"));
    }

    #[test]
    fn schemas_deserialize_from_toml_with_defaults() {
        let schema: ViewSchema = toml::from_str(
            r#"
            name = "custom"
            numeric_fields = ["score"]
            date_field = "created_at"
            "#,
        )
        .expect("schema should parse");
        assert_eq!(schema.name, "custom");
        assert!(schema.text_fields.is_empty());
        assert_eq!(schema.date_field_id(), Some(FieldId::field("created_at")));
    }
}
