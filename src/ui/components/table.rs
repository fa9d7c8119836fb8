use dioxus::prelude::*;

use crate::domain::entities::field::{ColumnKind, FieldId};
use crate::domain::entities::view::{SortDirection, ViewResult};
use crate::ui::state::app_state::AppState;

const PAGE_SIZE_CHOICES: [usize; 6] = [25, 50, 100, 250, 500, 1000];
const CELL_STYLE: &str = "border: 1px solid #bbb; padding: 6px;";

fn column_alignment(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Numeric => "text-align: right;",
        ColumnKind::Text | ColumnKind::Date => "text-align: left;",
    }
}

#[derive(Clone, PartialEq)]
struct Header {
    key: String,
    title: String,
    field: FieldId,
}

#[component]
pub fn DataTable(state: AppState, result: ViewResult) -> Element {
    let session = state.session.read();
    let columns = session.columns().to_vec();
    let sort = session.state().sort.clone();
    drop(session);

    let headers: Vec<Header> = columns
        .iter()
        .map(|column| {
            let marker = match &sort {
                Some(spec) if spec.field == column.field => match spec.direction {
                    SortDirection::Asc => " ▲",
                    SortDirection::Desc => " ▼",
                },
                _ => "",
            };
            Header {
                key: column.key(),
                title: format!("{}{marker}", column.name),
                field: column.field.clone(),
            }
        })
        .collect();
    let body: Vec<(usize, Vec<(String, String)>)> = result
        .rows
        .iter()
        .map(|row| {
            let cells = columns
                .iter()
                .map(|column| {
                    let style = format!("{CELL_STYLE} {}", column_alignment(column.kind));
                    (style, row.get(&column.field).to_string())
                })
                .collect();
            (row.key.0, cells)
        })
        .collect();
    let span = columns.len().max(1);

    rsx! {
        table { style: "border-collapse: collapse; width: 100%; border: 1px solid #bbb;",
            thead {
                tr {
                    for header in headers {
                        th {
                            key: "{header.key}",
                            style: "{CELL_STYLE} background: #f2f2f2; cursor: pointer;",
                            onclick: move |_| state.update(|session| session.toggle_sort(&header.field)),
                            "{header.title}"
                        }
                    }
                }
            }
            tbody {
                if body.is_empty() {
                    tr {
                        td { style: "{CELL_STYLE}", colspan: span, "No data" }
                    }
                } else {
                    for (row_key, cells) in body {
                        tr { key: "{row_key}",
                            for (style, text) in cells {
                                td { style: "{style}", "{text}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn Pager(
    state: AppState,
    page: usize,
    page_count: usize,
    page_size: usize,
    max_page_size: usize,
) -> Element {
    let choices: Vec<usize> = PAGE_SIZE_CHOICES
        .iter()
        .copied()
        .filter(|size| *size <= max_page_size)
        .collect();
    let shown_page = page + 1;

    rsx! {
        div { style: "display: flex; gap: 8px; align-items: center; padding: 8px 0;",
            button {
                disabled: page == 0,
                onclick: move |_| state.update(|session| session.set_page(page.saturating_sub(1))),
                "Previous"
            }
            span { "Page {shown_page} of {page_count}" }
            button {
                disabled: shown_page >= page_count,
                onclick: move |_| state.update(|session| session.set_page(page + 1)),
                "Next"
            }
            span { "Rows per page" }
            select {
                value: "{page_size}",
                onchange: move |event| {
                    if let Ok(size) = event.value().parse::<usize>() {
                        state.update(|session| session.set_page_size(size));
                    }
                },
                for size in choices {
                    option { value: "{size}", "{size}" }
                }
            }
        }
    }
}
