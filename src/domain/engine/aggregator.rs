use std::collections::{BTreeMap, BTreeSet};

use crate::domain::engine::text::{casefold, collate};
use crate::domain::entities::dataset::RowRef;
use crate::domain::entities::field::FieldId;
use crate::domain::entities::schema::{ShareSpec, ViewSchema};
use crate::domain::entities::view::{average_key, Aggregates, GroupSummary};

/// What the summary header of a view computes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateSpec {
    pub summed: Vec<FieldId>,
    pub distinct: Vec<FieldId>,
    pub shares: Vec<ShareSpec>,
}

impl AggregateSpec {
    /// Summed fields are the declared ones plus every discovered dimension.
    pub fn for_schema(schema: &ViewSchema, dimensions: &[String]) -> Self {
        Self {
            summed: schema
                .summed_fields
                .iter()
                .map(|name| FieldId::field(name))
                .chain(dimensions.iter().map(|name| FieldId::dimension(name)))
                .collect(),
            distinct: schema
                .distinct_fields
                .iter()
                .map(|name| FieldId::field(name))
                .collect(),
            shares: schema.shares.clone(),
        }
    }
}

pub fn aggregate(rows: &[RowRef<'_>], spec: &AggregateSpec) -> Aggregates {
    let mut aggregates = Aggregates {
        count: rows.len(),
        ..Aggregates::default()
    };

    for field in &spec.summed {
        let (sum, contributing) = rows
            .iter()
            .filter_map(|row| row.lookup(field).as_number())
            .fold((0.0, 0usize), |(sum, n), value| (sum + value, n + 1));
        let key = field.key();
        if contributing > 0 {
            aggregates
                .derived
                .insert(average_key(field), sum / contributing as f64);
        }
        aggregates.sums.insert(key.clone(), sum);
        aggregates.non_null.insert(key, contributing);
    }

    for field in &spec.distinct {
        let distinct: BTreeSet<String> = rows
            .iter()
            .filter_map(|row| row.lookup(field).as_text().map(|text| text.into_owned()))
            .collect();
        aggregates.distinct.insert(field.key(), distinct.len());
    }

    for share in &spec.shares {
        aggregates
            .derived
            .insert(share.name.clone(), share_percentage(rows, share));
    }

    aggregates
}

fn share_percentage(rows: &[RowRef<'_>], share: &ShareSpec) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let field = FieldId::field(&share.field);
    let wanted: BTreeSet<String> = share.matches.iter().map(|m| casefold(m.trim())).collect();
    let hits = rows
        .iter()
        .filter(|row| {
            row.lookup(&field)
                .as_text()
                .is_some_and(|text| wanted.contains(&casefold(text.trim())))
        })
        .count();
    hits as f64 * 100.0 / rows.len() as f64
}

/// Per-group aggregates keyed by the stringified group value, in display
/// order with the group of rows lacking a value last.
pub fn summarize_groups(
    rows: &[RowRef<'_>],
    group_field: &FieldId,
    spec: &AggregateSpec,
) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<String, Vec<RowRef<'_>>> = BTreeMap::new();
    let mut ungrouped = Vec::new();
    for row in rows {
        match row.lookup(group_field).as_text() {
            Some(key) => groups.entry(key.into_owned()).or_default().push(*row),
            None => ungrouped.push(*row),
        }
    }

    let mut keyed: Vec<(String, Vec<RowRef<'_>>)> = groups.into_iter().collect();
    keyed.sort_by(|(a, _), (b, _)| collate(a, b));

    let mut summaries: Vec<GroupSummary> = keyed
        .into_iter()
        .map(|(key, members)| GroupSummary {
            key: Some(key),
            aggregates: aggregate(&members, spec),
        })
        .collect();
    if !ungrouped.is_empty() {
        summaries.push(GroupSummary {
            key: None,
            aggregates: aggregate(&ungrouped, spec),
        });
    }
    summaries
}
