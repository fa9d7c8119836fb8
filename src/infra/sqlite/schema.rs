use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS work_item (
            work_item_id        TEXT PRIMARY KEY,
            task_id             TEXT NOT NULL,
            annotator_id        INTEGER,
            colab_link          TEXT,
            json_filename       TEXT,
            delivery_date       TEXT,
            turing_status       TEXT NOT NULL DEFAULT 'Delivered',
            client_status       TEXT NOT NULL DEFAULT 'Pending',
            task_level_feedback TEXT,
            error_categories    TEXT
        );

        CREATE TABLE IF NOT EXISTS data_sync_log (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            table_name     TEXT NOT NULL,
            started_at     TEXT NOT NULL,
            completed_at   TEXT,
            records_synced INTEGER,
            status         TEXT NOT NULL
                CHECK (status IN ('started', 'completed', 'failed')),
            error_message  TEXT,
            sync_type      TEXT NOT NULL
                CHECK (sync_type IN ('initial', 'scheduled', 'manual'))
        );

        CREATE INDEX IF NOT EXISTS idx_work_item_task
            ON work_item(task_id);

        CREATE INDEX IF NOT EXISTS idx_sync_log_table_status
            ON data_sync_log(table_name, status, completed_at);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
