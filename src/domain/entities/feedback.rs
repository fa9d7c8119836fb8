use std::collections::HashMap;

use thiserror::Error;

pub const STATUS_REWORK: &str = "Rework";
pub const STATUS_DELIVERED: &str = "Delivered";
pub const STATUS_PENDING: &str = "Pending";

/// One correction row of a client feedback upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRow {
    pub work_item_id: String,
    pub verdict: String,
    pub task_level_feedback: Option<String>,
    pub error_categories: Option<String>,
}

impl FeedbackRow {
    /// Delivery status implied by the client's verdict, if any.
    pub fn turing_status(&self) -> Option<&'static str> {
        match self.verdict.trim().to_ascii_uppercase().as_str() {
            "REJECTED" => Some(STATUS_REWORK),
            "APPROVED" | "APPROVE" => Some(STATUS_DELIVERED),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("required column not found: {column} (looking for normalized: {normalized})")]
    MissingColumn {
        column: &'static str,
        normalized: &'static str,
    },
    #[error("upload has no header row")]
    MissingHeader,
}

/// Lowercases a header and drops everything that is not `[a-z0-9]`, so that
/// "Work Item Id", "work_item_id" and "WorkItemID" all match.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

const WORK_ITEM_ID: (&str, &str) = ("work_item_id", "workitemid");
const VERDICT: (&str, &str) = ("verdict", "verdict");
const TASK_LEVEL_FEEDBACK: &str = "tasklevelfeedback";
const ERROR_CATEGORIES: &str = "errorcategories";

/// Maps an uploaded sheet (header + string rows) to feedback rows. Rows with
/// an empty work item id or verdict are dropped; other columns are ignored.
pub fn feedback_rows(
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<FeedbackRow>, FeedbackError> {
    if headers.is_empty() {
        return Err(FeedbackError::MissingHeader);
    }

    let positions: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (normalize_header(header), idx))
        .collect();

    let required = |(column, normalized): (&'static str, &'static str)| {
        positions
            .get(normalized)
            .copied()
            .ok_or(FeedbackError::MissingColumn { column, normalized })
    };
    let id_idx = required(WORK_ITEM_ID)?;
    let verdict_idx = required(VERDICT)?;
    let feedback_idx = positions.get(TASK_LEVEL_FEEDBACK).copied();
    let categories_idx = positions.get(ERROR_CATEGORIES).copied();

    let cell = |row: &[String], idx: usize| -> String {
        row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default()
    };
    let optional = |row: &[String], idx: Option<usize>| -> Option<String> {
        idx.map(|idx| cell(row, idx))
            .filter(|value| !value.is_empty() && value != "None" && value != "nan")
    };

    Ok(rows
        .iter()
        .filter_map(|row| {
            let work_item_id = cell(row, id_idx);
            let verdict = cell(row, verdict_idx);
            if work_item_id.is_empty() || verdict.is_empty() {
                return None;
            }
            Some(FeedbackRow {
                work_item_id,
                verdict,
                task_level_feedback: optional(row, feedback_idx),
                error_categories: optional(row, categories_idx),
            })
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackOutcome {
    pub updated: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub total_rows: usize,
    pub updated: usize,
    pub not_found: usize,
}
