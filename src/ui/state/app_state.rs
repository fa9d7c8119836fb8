use chrono::NaiveDateTime;
use dioxus::prelude::*;

use crate::app::Dashboard;
use crate::usecase::services::view_service::ViewSession;

/// Signals shared by the dashboard components. Copyable so every component
/// and event handler can hold its own handle.
#[derive(Clone, Copy, PartialEq)]
pub struct AppState {
    pub session: Signal<ViewSession>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
    pub last_sync: Signal<Option<NaiveDateTime>>,
}

impl AppState {
    pub fn new(dashboard: &Dashboard) -> Self {
        let mut status_text = "Ready".to_string();
        let session = use_signal(|| {
            let mut session = dashboard.open_session(dashboard.default_view());
            if let Err(err) = session.reload() {
                status_text = format!("Failed to load data: {err}");
            }
            session
        });

        Self {
            session,
            busy: use_signal(|| false),
            status: use_signal(|| status_text),
            last_sync: use_signal(|| dashboard.sync.last_sync_time().ok().flatten()),
        }
    }

    /// Runs a session transition and re-renders every reader.
    pub fn update(mut self, f: impl FnOnce(&mut ViewSession)) {
        let mut session = self.session.write();
        f(&mut session);
    }

    /// Swaps in a freshly opened view.
    pub fn replace_session(mut self, next: ViewSession) {
        self.session.set(next);
    }

    pub fn set_last_sync(mut self, at: Option<NaiveDateTime>) {
        self.last_sync.set(at);
    }

    pub fn set_status(mut self, text: impl Into<String>) {
        *self.status.write() = text.into();
    }

    /// Reloads once if a refresh signal is pending.
    pub fn pick_up_refresh(mut self) {
        let refreshed = self.session.write().poll_refresh();
        if let Err(err) = refreshed {
            self.set_status(format!("Refresh failed: {err}"));
        }
    }
}
