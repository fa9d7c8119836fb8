use serde::{Deserialize, Serialize};

use crate::domain::entities::dataset::Record;
use crate::domain::entities::feedback::{STATUS_DELIVERED, STATUS_PENDING};

fn delivered() -> String {
    STATUS_DELIVERED.to_string()
}

fn pending() -> String {
    STATUS_PENDING.to_string()
}

/// A delivered unit of work as stored locally for the client delivery view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub work_item_id: String,
    pub task_id: String,
    #[serde(default)]
    pub annotator_id: Option<i64>,
    #[serde(default)]
    pub colab_link: Option<String>,
    #[serde(default)]
    pub json_filename: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default = "delivered")]
    pub turing_status: String,
    #[serde(default = "pending")]
    pub client_status: String,
    #[serde(default)]
    pub task_level_feedback: Option<String>,
    #[serde(default)]
    pub error_categories: Option<String>,
}

impl WorkItem {
    pub fn new(work_item_id: &str, task_id: &str) -> Self {
        Self {
            work_item_id: work_item_id.to_string(),
            task_id: task_id.to_string(),
            annotator_id: None,
            colab_link: None,
            json_filename: None,
            delivery_date: None,
            turing_status: delivered(),
            client_status: pending(),
            task_level_feedback: None,
            error_categories: None,
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new()
            .with_field("work_item_id", self.work_item_id.as_str())
            .with_field("task_id", self.task_id.as_str())
            .with_field("annotator_id", self.annotator_id.map(|id| id as f64))
            .with_field("colab_link", self.colab_link.clone())
            .with_field("json_filename", self.json_filename.clone())
            .with_field("delivery_date", self.delivery_date.clone())
            .with_field("turing_status", self.turing_status.as_str())
            .with_field("client_status", self.client_status.as_str())
            .with_field("task_level_feedback", self.task_level_feedback.clone())
            .with_field("error_categories", self.error_categories.clone())
    }
}
