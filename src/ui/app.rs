use dioxus::prelude::*;
use rfd::{FileDialog, MessageDialog, MessageLevel};
use tracing::{info, warn};

use crate::app::Dashboard;
use crate::config::DashboardConfig;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::components::filters::FilterPanel;
use crate::ui::components::summary::{GroupBreakdown, SummaryBar};
use crate::ui::components::table::{DataTable, Pager};
use crate::ui::state::app_state::AppState;

#[component]
pub fn App() -> Element {
    let config = use_context::<DashboardConfig>();
    let opened = use_hook(move || Dashboard::open(config).map_err(|err| format!("{err:#}")));
    let dashboard = match opened {
        Ok(dashboard) => dashboard,
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to open the dashboard store: {err}" }
                }
            };
        }
    };

    use_hook({
        let dashboard = dashboard.clone();
        move || match run_blocking("startup sync", || dashboard.sync_if_due()) {
            Ok(Some(records)) => info!(records, "startup sync finished"),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "startup sync failed"),
        }
    });

    let state = AppState::new(&dashboard);
    let mut busy = state.busy;

    let session = state.session.read();
    let schema = session.schema().clone();
    let result = session.result();
    let groups = session.groups();
    let page_size = session.state().pagination.page_size();
    let max_page_size = session.max_page_size();
    drop(session);

    let view_names: Vec<String> = dashboard
        .config
        .view_schemas()
        .into_iter()
        .map(|view| view.name)
        .collect();
    let current_view = schema.name.clone();
    let group_title = schema.group_field.clone().unwrap_or_default();
    let status_text = state.status.read().clone();
    let last_sync_text = state
        .last_sync
        .read()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    let can_sync = dashboard.config.work_items_path.is_some();

    let upload_dashboard = dashboard.clone();
    let sync_dashboard = dashboard.clone();
    let view_dashboard = dashboard.clone();

    rsx! {
        div { style: "font-family: sans-serif; padding: 8px;",
            nav { style: "display: flex; gap: 12px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
                select {
                    value: "{current_view}",
                    onchange: move |event| {
                        let Some(schema) = view_dashboard.config.view(&event.value()) else {
                            return;
                        };
                        let mut next = view_dashboard.open_session(schema);
                        let loaded = run_blocking("view switch", || next.reload());
                        state.replace_session(next);
                        match loaded {
                            Ok(()) => state.set_status("View loaded"),
                            Err(err) => state.set_status(format!("Failed to load data: {err}")),
                        }
                    },
                    for name in view_names {
                        option { value: "{name}", "{name}" }
                    }
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        if busy() {
                            return;
                        }
                        let Some(path) = FileDialog::new()
                            .add_filter("Feedback", &["csv", "xlsx"])
                            .pick_file() else {
                            state.set_status("Upload cancelled");
                            return;
                        };

                        *busy.write() = true;
                        state.set_status(format!("Uploading {}", path.display()));
                        match run_blocking("feedback upload", || upload_dashboard.feedback.process_upload(&path)) {
                            Ok(summary) => {
                                state.set_status(format!(
                                    "Feedback applied: {} of {} rows updated, {} not found",
                                    summary.updated, summary.total_rows, summary.not_found
                                ));
                                state.pick_up_refresh();
                            }
                            Err(err) => {
                                state.set_status(format!("Upload failed: {err}"));
                                MessageDialog::new()
                                    .set_level(MessageLevel::Error)
                                    .set_title("Upload failed")
                                    .set_description(format!("{err:#}"))
                                    .show();
                            }
                        }
                        *busy.write() = false;
                    },
                    "Upload feedback"
                }
                button {
                    disabled: busy() || !can_sync,
                    onclick: move |_| {
                        *busy.write() = true;
                        match run_blocking("manual sync", || sync_dashboard.sync_now()) {
                            Ok(records) => {
                                state.set_status(format!("Synced {records} work items"));
                                state.set_last_sync(sync_dashboard.sync.last_sync_time().ok().flatten());
                                state.pick_up_refresh();
                            }
                            Err(err) => state.set_status(format!("Sync failed: {err}")),
                        }
                        *busy.write() = false;
                    },
                    "Sync now"
                }
                span { "Last sync: {last_sync_text}" }
                span { style: "color: #555;", "{status_text}" }
            }

            SummaryBar { schema: schema.clone(), aggregates: result.aggregates.clone() }

            div { style: "display: flex; gap: 12px; align-items: flex-start;",
                div { style: "display: flex; flex-direction: column; gap: 8px;",
                    FilterPanel { state }
                    if !groups.is_empty() {
                        GroupBreakdown { title: group_title, groups }
                    }
                }
                div { style: "flex: 1; overflow: auto;",
                    DataTable { state, result: result.clone() }
                    Pager {
                        state,
                        page: result.page,
                        page_count: result.page_count,
                        page_size,
                        max_page_size,
                    }
                }
            }
        }
    }
}
