use review_dashboard::config::{default_webview_data_dir, DashboardConfig};
use review_dashboard::telemetry::init_tracing;
use review_dashboard::ui::app::App;

fn main() {
    let config = DashboardConfig::load().unwrap_or_else(|err| {
        eprintln!("failed to load config, using defaults: {err:#}");
        DashboardConfig::default()
    });
    init_tracing(&config.log_filter);

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Review Dashboard"))
                .with_data_directory(webview_data_dir),
        )
        .with_context(config)
        .launch(App);
}
