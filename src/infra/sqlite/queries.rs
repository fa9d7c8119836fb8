use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::entities::dataset::parse_datetime;
use crate::domain::entities::feedback::{FeedbackOutcome, FeedbackRow};
use crate::domain::entities::sync::{SyncKind, SyncRun, SyncStatus};
use crate::domain::entities::work_item::WorkItem;
use crate::infra::sqlite::schema::open_connection;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    parse_datetime(text).ok_or_else(|| anyhow!("invalid timestamp in sync log: {text}"))
}

/// Inserts new work items and refreshes the source columns of existing ones.
/// Statuses and client feedback already stored locally are kept.
pub fn upsert_work_items(db_path: &Path, items: &[WorkItem]) -> Result<usize> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start work item transaction")?;

    let mut upsert = tx
        .prepare(
            "INSERT INTO work_item(
                work_item_id, task_id, annotator_id, colab_link, json_filename,
                delivery_date, turing_status, client_status, task_level_feedback,
                error_categories
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(work_item_id) DO UPDATE SET
                task_id = excluded.task_id,
                annotator_id = excluded.annotator_id,
                colab_link = excluded.colab_link,
                json_filename = excluded.json_filename,
                delivery_date = excluded.delivery_date",
        )
        .context("failed to prepare work item upsert")?;

    for item in items {
        upsert
            .execute(params![
                item.work_item_id,
                item.task_id,
                item.annotator_id,
                item.colab_link,
                item.json_filename,
                item.delivery_date,
                item.turing_status,
                item.client_status,
                item.task_level_feedback,
                item.error_categories,
            ])
            .with_context(|| format!("failed to upsert work item: {}", item.work_item_id))?;
    }
    drop(upsert);

    tx.commit().context("failed to commit work item upsert")?;
    Ok(items.len())
}

fn work_item_from_row(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    Ok(WorkItem {
        work_item_id: row.get(0)?,
        task_id: row.get(1)?,
        annotator_id: row.get(2)?,
        colab_link: row.get(3)?,
        json_filename: row.get(4)?,
        delivery_date: row.get(5)?,
        turing_status: row.get(6)?,
        client_status: row.get(7)?,
        task_level_feedback: row.get(8)?,
        error_categories: row.get(9)?,
    })
}

pub fn load_work_items(db_path: &Path) -> Result<Vec<WorkItem>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT work_item_id, task_id, annotator_id, colab_link, json_filename,
                    delivery_date, turing_status, client_status, task_level_feedback,
                    error_categories
             FROM work_item
             ORDER BY work_item_id ASC",
        )
        .context("failed to prepare work item query")?;

    let items = stmt
        .query_map([], work_item_from_row)
        .context("failed to query work items")?;

    let mut loaded = Vec::new();
    for item in items {
        loaded.push(item.context("failed to read work item row")?);
    }
    Ok(loaded)
}

/// Applies client verdicts. Feedback columns are only overwritten when the
/// upload provides a value.
pub fn apply_feedback(db_path: &Path, rows: &[FeedbackRow]) -> Result<FeedbackOutcome> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start feedback transaction")?;

    let mut update = tx
        .prepare(
            "UPDATE work_item SET
                client_status = ?2,
                task_level_feedback = COALESCE(?3, task_level_feedback),
                error_categories = COALESCE(?4, error_categories),
                turing_status = COALESCE(?5, turing_status)
             WHERE work_item_id = ?1",
        )
        .context("failed to prepare feedback update")?;

    let mut outcome = FeedbackOutcome::default();
    for row in rows {
        let changed = update
            .execute(params![
                row.work_item_id,
                row.verdict,
                row.task_level_feedback,
                row.error_categories,
                row.turing_status(),
            ])
            .with_context(|| format!("failed to apply feedback for: {}", row.work_item_id))?;
        if changed == 0 {
            outcome.not_found += 1;
        } else {
            outcome.updated += 1;
        }
    }
    drop(update);

    tx.commit().context("failed to commit feedback updates")?;
    Ok(outcome)
}

pub fn insert_sync_start(
    db_path: &Path,
    table_name: &str,
    kind: SyncKind,
    started_at: NaiveDateTime,
) -> Result<i64> {
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO data_sync_log(table_name, started_at, status, sync_type)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            table_name,
            format_timestamp(started_at),
            SyncStatus::Started.as_str(),
            kind.as_str()
        ],
    )
    .context("failed to insert sync log entry")?;
    Ok(conn.last_insert_rowid())
}

pub fn mark_sync_completed(
    db_path: &Path,
    id: i64,
    completed_at: NaiveDateTime,
    records_synced: u64,
) -> Result<()> {
    let conn = open_connection(db_path)?;
    let records = i64::try_from(records_synced).unwrap_or(i64::MAX);
    let changed = conn
        .execute(
            "UPDATE data_sync_log
             SET status = ?2, completed_at = ?3, records_synced = ?4
             WHERE id = ?1",
            params![
                id,
                SyncStatus::Completed.as_str(),
                format_timestamp(completed_at),
                records
            ],
        )
        .context("failed to mark sync completed")?;
    if changed == 0 {
        anyhow::bail!("sync log entry not found: {id}");
    }
    Ok(())
}

pub fn mark_sync_failed(
    db_path: &Path,
    id: i64,
    completed_at: NaiveDateTime,
    error_message: &str,
) -> Result<()> {
    let conn = open_connection(db_path)?;
    let changed = conn
        .execute(
            "UPDATE data_sync_log
             SET status = ?2, completed_at = ?3, error_message = ?4
             WHERE id = ?1",
            params![
                id,
                SyncStatus::Failed.as_str(),
                format_timestamp(completed_at),
                error_message
            ],
        )
        .context("failed to mark sync failed")?;
    if changed == 0 {
        anyhow::bail!("sync log entry not found: {id}");
    }
    Ok(())
}

type RawSyncRun = (
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
);

const SYNC_RUN_COLUMNS: &str = "id, table_name, sync_type, status, started_at, completed_at,
                                records_synced, error_message";

fn raw_sync_run(row: &Row<'_>) -> rusqlite::Result<RawSyncRun> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn sync_run_from_raw(raw: RawSyncRun) -> Result<SyncRun> {
    let (id, table_name, kind, status, started_at, completed_at, records_synced, error_message) =
        raw;
    Ok(SyncRun {
        id,
        table_name,
        kind: SyncKind::parse(&kind).ok_or_else(|| anyhow!("unknown sync type: {kind}"))?,
        status: SyncStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown sync status: {status}"))?,
        started_at: parse_timestamp(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        records_synced: records_synced.and_then(|n| u64::try_from(n).ok()),
        error_message,
    })
}

/// Latest completed run, optionally restricted to one table.
pub fn latest_completed_sync(db_path: &Path, table_name: Option<&str>) -> Result<Option<SyncRun>> {
    let conn = open_connection(db_path)?;
    let sql = format!(
        "SELECT {SYNC_RUN_COLUMNS}
         FROM data_sync_log
         WHERE status = 'completed' AND (?1 IS NULL OR table_name = ?1)
         ORDER BY completed_at DESC, id DESC
         LIMIT 1"
    );
    let raw = conn
        .query_row(&sql, params![table_name], raw_sync_run)
        .optional()
        .context("failed to query latest completed sync")?;
    raw.map(sync_run_from_raw).transpose()
}

pub fn recent_syncs(db_path: &Path, limit: usize) -> Result<Vec<SyncRun>> {
    let conn = open_connection(db_path)?;
    let sql = format!(
        "SELECT {SYNC_RUN_COLUMNS}
         FROM data_sync_log
         ORDER BY started_at DESC, id DESC
         LIMIT ?1"
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare sync log query")?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let runs = stmt
        .query_map([limit], raw_sync_run)
        .context("failed to query sync log")?;

    let mut loaded = Vec::new();
    for run in runs {
        loaded.push(sync_run_from_raw(
            run.context("failed to read sync log row")?,
        )?);
    }
    Ok(loaded)
}
