use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::view::DEFAULT_PAGE_SIZE;

pub const CONFIG_FILE_NAME: &str = "dashboard.toml";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "review-dashboard", "review-dashboard")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join("work_items.sqlite"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    let webview_data_dir = project_dirs()?.data_local_dir().join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Work-item database; the platform data directory when unset.
    pub db_path: Option<PathBuf>,
    /// JSON export of task-level records. Without one the client delivery
    /// view is shown.
    pub dataset_path: Option<PathBuf>,
    /// JSON export of work items pulled in by the sync job.
    pub work_items_path: Option<PathBuf>,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub sync_interval_minutes: i64,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Additional views on top of the built-in presets.
    pub views: Vec<ViewSchema>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            dataset_path: None,
            work_items_path: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 1000,
            sync_interval_minutes: 60,
            log_filter: "info".to_string(),
            views: Vec::new(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse dashboard config")
    }

    /// Reads `path` when it exists; otherwise returns the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path()?)
    }

    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.default_page_size.clamp(1, self.max_page_size.max(1))
    }

    pub fn sync_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.sync_interval_minutes.max(1))
    }

    /// Built-in presets followed by configured views. A configured view
    /// replaces the preset of the same name.
    pub fn view_schemas(&self) -> Vec<ViewSchema> {
        let mut schemas: Vec<ViewSchema> = ViewSchema::presets()
            .into_iter()
            .filter(|preset| !self.views.iter().any(|view| view.name == preset.name))
            .collect();
        schemas.extend(self.views.iter().cloned());
        schemas
    }

    pub fn view(&self, name: &str) -> Option<ViewSchema> {
        self.view_schemas()
            .into_iter()
            .find(|schema| schema.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            max_page_size = 250

            [[views]]
            name = "by_domain"
            numeric_fields = ["task_count"]
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.max_page_size, 250);
        assert_eq!(config.log_filter, "info");
        let by_domain = config.view("by_domain").expect("view should exist");
        assert_eq!(by_domain.numeric_fields, vec!["task_count".to_string()]);
        assert_eq!(
            config.view_schemas().len(),
            ViewSchema::presets().len(),
            "a configured view should replace its preset"
        );
    }

    #[test]
    fn page_size_is_clamped_to_the_maximum() {
        let config = DashboardConfig {
            default_page_size: 5000,
            ..DashboardConfig::default()
        };
        assert_eq!(config.page_size(), 1000);
    }

    #[test]
    fn default_db_path_uses_app_directory() {
        let db_path = default_db_path().expect("default db path should resolve");
        assert_eq!(
            db_path.file_name().and_then(|name| name.to_str()),
            Some("work_items.sqlite")
        );
    }
}
