use std::collections::BTreeSet;

use chrono::NaiveDate;
use dioxus::prelude::*;

use crate::domain::entities::dataset::{format_number, parse_number};
use crate::domain::entities::field::FieldId;
use crate::domain::entities::filter::{
    FilterPatch, FilterSpec, NumericRangeFilter, TextFilter, TextOperator,
};
use crate::ui::state::app_state::AppState;

const ROW_STYLE: &str = "display: flex; gap: 6px; align-items: center; padding: 2px 0;";
const INPUT_STYLE: &str = "width: 90px;";

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[component]
pub fn FilterPanel(state: AppState) -> Element {
    let session = state.session.read();
    let schema = session.schema().clone();
    let snapshot = session.state();
    let columns = session.columns().to_vec();
    let selections: Vec<(FieldId, Vec<String>, BTreeSet<String>)> = schema
        .multi_select_field_ids()
        .map(|field| {
            let options = session.options(&field);
            let selected = snapshot
                .selection(&field)
                .map(|s| s.filter.selected.clone())
                .unwrap_or_default();
            (field, options, selected)
        })
        .collect();
    drop(session);

    let label_for = move |field: &FieldId| {
        columns
            .iter()
            .find(|column| &column.field == field)
            .map(|column| column.name.clone())
            .unwrap_or_else(|| field.name().to_string())
    };
    let ranges: Vec<(FieldId, String, NumericRangeFilter)> = snapshot
        .store
        .iter()
        .filter_map(|(field, spec)| match spec {
            FilterSpec::NumericRange(filter) => Some((field.clone(), label_for(field), *filter)),
            _ => None,
        })
        .collect();
    let texts: Vec<(FieldId, String, TextFilter)> = snapshot
        .store
        .iter()
        .filter_map(|(field, spec)| match spec {
            FilterSpec::Text(filter) => Some((field.clone(), label_for(field), filter.clone())),
            _ => None,
        })
        .collect();
    let (start, end) = snapshot
        .date
        .as_ref()
        .map(|d| (d.filter.start, d.filter.end))
        .unwrap_or((None, None));
    let active = snapshot.active_filter_count();

    rsx! {
        div { style: "border: 1px solid #bbb; padding: 8px; min-width: 280px;",
            div { style: "{ROW_STYLE}",
                strong { "Filters" }
                if active > 0 {
                    span { style: "background: #3367d6; color: white; border-radius: 8px; padding: 0 6px;",
                        "{active}"
                    }
                }
                button {
                    disabled: active == 0,
                    onclick: move |_| {
                        state.update(|session| session.clear_filters());
                        state.set_status("Filters cleared");
                    },
                    "Clear All"
                }
            }

            if schema.date_field.is_some() {
                DateFilterRow { state, start, end }
            }
            for (field, label, filter) in ranges {
                RangeFilterRow { key: "{field}", state, field: field.clone(), label, filter }
            }
            for (field, label, filter) in texts {
                TextFilterRow { key: "{field}", state, field: field.clone(), label, filter }
            }
            for (field, options, selected) in selections {
                SelectionFilter { key: "{field}", state, field: field.clone(), options, selected }
            }
        }
    }
}

#[component]
fn RangeFilterRow(
    state: AppState,
    field: FieldId,
    label: String,
    filter: NumericRangeFilter,
) -> Element {
    let (lo, hi) = filter.current;
    let lo_text = format_number(lo);
    let hi_text = format_number(hi);
    let bounds = format!("{} to {}", format_number(filter.min), format_number(filter.max));
    let field_lo = field.clone();
    let field_hi = field.clone();

    rsx! {
        div { style: "{ROW_STYLE}",
            span { style: "width: 140px;", title: "{bounds}", "{label}" }
            input {
                style: "{INPUT_STYLE}",
                r#type: "number",
                value: "{lo_text}",
                onchange: move |event| {
                    if let Some(value) = parse_number(&event.value()) {
                        state.update(|session| session.update_filter(&field_lo, FilterPatch::Range(value, hi)));
                    }
                },
            }
            input {
                style: "{INPUT_STYLE}",
                r#type: "number",
                value: "{hi_text}",
                onchange: move |event| {
                    if let Some(value) = parse_number(&event.value()) {
                        state.update(|session| session.update_filter(&field_hi, FilterPatch::Range(lo, value)));
                    }
                },
            }
            button {
                disabled: !filter.is_active(),
                onclick: move |_| state.update(|session| session.reset_filter(&field)),
                "Reset"
            }
        }
    }
}

#[component]
fn TextFilterRow(state: AppState, field: FieldId, label: String, filter: TextFilter) -> Element {
    let field_op = field.clone();
    let current_op = filter.operator.label();
    let needle = filter.value.clone();

    rsx! {
        div { style: "{ROW_STYLE}",
            span { style: "width: 140px;", "{label}" }
            select {
                value: "{current_op}",
                onchange: move |event| {
                    if let Some(operator) = TextOperator::parse(&event.value()) {
                        state.update(|session| session.update_filter(&field_op, FilterPatch::Operator(operator)));
                    }
                },
                for operator in TextOperator::ALL {
                    option { value: operator.label(), {operator.label()} }
                }
            }
            input {
                value: "{needle}",
                placeholder: "filter…",
                oninput: move |event| {
                    state.update(|session| session.update_filter(&field, FilterPatch::Text(event.value())));
                },
            }
        }
    }
}

#[component]
fn DateFilterRow(state: AppState, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Element {
    let start_text = date_text(start);
    let end_text = date_text(end);

    rsx! {
        div { style: "{ROW_STYLE}",
            span { style: "width: 140px;", "Date" }
            input {
                r#type: "date",
                value: "{start_text}",
                onchange: move |event| {
                    let start = parse_date(&event.value());
                    state.update(|session| session.set_date_range(start, end));
                },
            }
            input {
                r#type: "date",
                value: "{end_text}",
                onchange: move |event| {
                    let end = parse_date(&event.value());
                    state.update(|session| session.set_date_range(start, end));
                },
            }
        }
    }
}

#[component]
fn SelectionFilter(
    state: AppState,
    field: FieldId,
    options: Vec<String>,
    selected: BTreeSet<String>,
) -> Element {
    let title = field.name().to_string();

    rsx! {
        div { style: "padding: 2px 0;",
            span { "{title}" }
            div { style: "display: flex; flex-wrap: wrap; gap: 8px;",
                for option in options {
                    label {
                        key: "{option}",
                        input {
                            r#type: "checkbox",
                            checked: selected.contains(&option),
                            onchange: {
                                let field = field.clone();
                                let option = option.clone();
                                let mut next = selected.clone();
                                move |_| {
                                    if !next.remove(&option) {
                                        next.insert(option.clone());
                                    }
                                    let chosen = next.clone();
                                    state.update(|session| session.set_selection(field.clone(), chosen));
                                }
                            },
                        }
                        "{option}"
                    }
                }
            }
        }
    }
}
