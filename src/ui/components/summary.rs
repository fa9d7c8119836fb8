use dioxus::prelude::*;

use crate::domain::entities::dataset::format_number;
use crate::domain::entities::field::FieldId;
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::view::{Aggregates, GroupSummary};

const CHIP_STYLE: &str =
    "border: 1px solid #ccc; border-radius: 12px; padding: 2px 10px; background: #fafafa;";

fn chips(schema: &ViewSchema, aggregates: &Aggregates) -> Vec<String> {
    let mut chips = vec![format!("Rows: {}", aggregates.count)];
    for name in &schema.summed_fields {
        let field = FieldId::field(name);
        let average = aggregates
            .average(&field)
            .map(format_number)
            .unwrap_or_else(|| "-".to_string());
        chips.push(format!(
            "{name}: total {} / avg {average}",
            format_number(aggregates.sum(&field))
        ));
    }
    for name in &schema.distinct_fields {
        chips.push(format!(
            "Distinct {name}: {}",
            aggregates.distinct_count(&FieldId::field(name))
        ));
    }
    for share in &schema.shares {
        let pct = aggregates.derived.get(&share.name).copied().unwrap_or(0.0);
        chips.push(format!("{}: {pct:.1}%", share.name));
    }
    chips
}

#[component]
pub fn SummaryBar(schema: ViewSchema, aggregates: Aggregates) -> Element {
    let items = chips(&schema, &aggregates);

    rsx! {
        div { style: "display: flex; gap: 8px; flex-wrap: wrap; padding: 8px 0;",
            for item in items {
                span { style: "{CHIP_STYLE}", "{item}" }
            }
        }
    }
}

/// Per-group counts, the input of the dashboard's bar charts.
#[component]
pub fn GroupBreakdown(title: String, groups: Vec<GroupSummary>) -> Element {
    let widest = groups
        .iter()
        .map(|group| group.aggregates.count)
        .max()
        .unwrap_or(0)
        .max(1);
    let bars: Vec<(String, usize, usize)> = groups
        .iter()
        .map(|group| {
            let label = group.key.clone().unwrap_or_else(|| "(none)".to_string());
            let width = group.aggregates.count * 100 / widest;
            (label, group.aggregates.count, width)
        })
        .collect();

    rsx! {
        div { style: "padding: 8px 0;",
            strong { "By {title}" }
            for (label, count, width) in bars {
                div { style: "display: flex; gap: 6px; align-items: center;",
                    span { style: "width: 160px;", "{label}" }
                    div { style: "background: #3367d6; height: 10px; width: {width}%;" }
                    span { "{count}" }
                }
            }
        }
    }
}
