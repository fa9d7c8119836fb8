use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Local};
use pretty_assertions::assert_eq;
use rusqlite::Connection;

use crate::domain::entities::feedback::{STATUS_DELIVERED, STATUS_PENDING, STATUS_REWORK};
use crate::domain::entities::field::FieldId;
use crate::domain::entities::schema::ViewSchema;
use crate::domain::entities::sync::{RefreshSignal, SyncKind, SyncStatus};
use crate::domain::entities::work_item::WorkItem;
use crate::infra::import::json::{JsonFileSource, WorkItemFileJob};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::events::RefreshBus;
use crate::usecase::ports::repo::{RepoError, SyncJob};
use crate::usecase::services::feedback_service::FeedbackService;
use crate::usecase::services::sync_service::SyncService;
use crate::usecase::services::view_service::ViewSession;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("review-dashboard-{prefix}-{nanos}"))
}

fn initialized_repo(temp_dir: &Path) -> SqliteRepo {
    fs::create_dir_all(temp_dir).expect("should create temp dir");
    let repo = SqliteRepo::new(temp_dir.join("app.sqlite"));
    repo.init().expect("init should succeed");
    repo
}

fn item(work_item_id: &str, task_id: &str, annotator_id: i64) -> WorkItem {
    WorkItem {
        annotator_id: Some(annotator_id),
        delivery_date: Some("2024-03-10".to_string()),
        ..WorkItem::new(work_item_id, task_id)
    }
}

struct FailingJob;

impl SyncJob for FailingJob {
    fn table_name(&self) -> &str {
        "work_item"
    }

    fn run(&self) -> Result<u64, RepoError> {
        Err(RepoError::Message("export unavailable".to_string()))
    }
}

#[test]
fn init_db_creates_required_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('work_item','data_sync_log')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 2, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn upsert_keeps_local_statuses_and_feedback() {
    let temp_dir = unique_test_dir("upsert");
    let repo = initialized_repo(&temp_dir);

    repo.upsert_work_items(&[item("w1", "t1", 7), item("w2", "t2", 8)])
        .expect("first upsert should succeed");
    let service = FeedbackService::new(Arc::new(repo.clone()), RefreshBus::new());
    let upload = temp_dir.join("feedback.csv");
    fs::write(
        &upload,
        "Work Item ID,Verdict,Task Level Feedback\nw1,REJECTED,missing citations\n",
    )
    .expect("should write upload");
    service
        .process_upload(&upload)
        .expect("upload should succeed");

    let mut refreshed = item("w1", "t1-renamed", 7);
    refreshed.turing_status = STATUS_DELIVERED.to_string();
    repo.upsert_work_items(&[refreshed, item("w3", "t3", 9)])
        .expect("second upsert should succeed");

    let items = repo.work_items().expect("work items should load");
    let ids: Vec<&str> = items.iter().map(|i| i.work_item_id.as_str()).collect();
    assert_eq!(ids, vec!["w1", "w2", "w3"]);
    assert_eq!(items[0].task_id, "t1-renamed");
    assert_eq!(items[0].turing_status, STATUS_REWORK);
    assert_eq!(items[0].client_status, "REJECTED");
    assert_eq!(
        items[0].task_level_feedback.as_deref(),
        Some("missing citations")
    );
    assert_eq!(items[2].client_status, STATUS_PENDING);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn feedback_upload_updates_statuses_and_counts_unknown_ids() {
    let temp_dir = unique_test_dir("feedback");
    let repo = initialized_repo(&temp_dir);
    repo.upsert_work_items(&[item("w1", "t1", 7), item("w2", "t2", 8)])
        .expect("upsert should succeed");

    let bus = RefreshBus::new();
    let refresh = bus.subscribe();
    let service = FeedbackService::new(Arc::new(repo.clone()), bus);
    let upload = temp_dir.join("feedback.csv");
    fs::write(
        &upload,
        "work_item_id,verdict,error_categories\nw1,REJECTED,format\nw2,APPROVED,\nw9,REJECTED,\n,APPROVED,\n",
    )
    .expect("should write upload");

    let summary = service
        .process_upload(&upload)
        .expect("upload should succeed");

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.not_found, 1);
    assert_eq!(
        refresh.try_recv().ok(),
        Some(RefreshSignal::BulkFeedbackUploaded)
    );

    let items = repo.work_items().expect("work items should load");
    assert_eq!(items[0].turing_status, STATUS_REWORK);
    assert_eq!(items[0].error_categories.as_deref(), Some("format"));
    assert_eq!(items[1].turing_status, STATUS_DELIVERED);
    assert_eq!(items[1].client_status, "APPROVED");
    assert_eq!(items[1].error_categories, None);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn feedback_upload_rejects_unsupported_files() {
    let temp_dir = unique_test_dir("feedback-ext");
    let repo = initialized_repo(&temp_dir);
    let bus = RefreshBus::new();
    let refresh = bus.subscribe();
    let service = FeedbackService::new(Arc::new(repo), bus);
    let upload = temp_dir.join("feedback.txt");
    fs::write(&upload, "work_item_id,verdict\nw1,REJECTED\n").expect("should write upload");

    let result = service.process_upload(&upload);

    assert!(result.is_err(), "txt uploads should be rejected");
    assert!(refresh.try_recv().is_err(), "nothing should be published");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn feedback_upload_requires_the_key_columns() {
    let temp_dir = unique_test_dir("feedback-header");
    let repo = initialized_repo(&temp_dir);
    let service = FeedbackService::new(Arc::new(repo), RefreshBus::new());
    let upload = temp_dir.join("feedback.csv");
    fs::write(&upload, "task_id,verdict\nt1,REJECTED\n").expect("should write upload");

    let err = service
        .process_upload(&upload)
        .expect_err("missing work item column should fail");

    assert!(format!("{err:#}").contains("work_item_id"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sync_runs_are_logged_with_their_outcome() {
    let temp_dir = unique_test_dir("sync-log");
    let repo = initialized_repo(&temp_dir);
    let export = temp_dir.join("work_items.json");
    fs::write(
        &export,
        r#"[
            {"work_item_id": "w1", "task_id": "t1", "annotator_id": 7},
            {"work_item_id": "w2", "task_id": "t2", "turing_status": "Rework"}
        ]"#,
    )
    .expect("should write export");

    let bus = RefreshBus::new();
    let refresh = bus.subscribe();
    let service = SyncService::new(Arc::new(repo.clone()), bus);
    assert_eq!(service.last_sync_time(), Ok(None));
    let now = Local::now().naive_local();
    assert_eq!(service.is_due(now, Duration::minutes(60)), Ok(true));

    let job = WorkItemFileJob {
        path: export,
        repo: repo.clone(),
    };
    let records = service
        .run(&job, SyncKind::Initial)
        .expect("sync should succeed");
    assert_eq!(records, 2);
    assert_eq!(
        refresh.try_recv().ok(),
        Some(RefreshSignal::ExternalSyncCompleted)
    );

    let failed = service.run(&FailingJob, SyncKind::Manual);
    assert!(failed.is_err(), "failing job should surface its error");

    let history = service.history(10).expect("history should load");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, SyncStatus::Failed);
    assert_eq!(history[0].kind, SyncKind::Manual);
    assert_eq!(
        history[0].error_message.as_deref(),
        Some("export unavailable")
    );
    assert_eq!(history[1].status, SyncStatus::Completed);
    assert_eq!(history[1].records_synced, Some(2));

    let last = service
        .last_sync_time()
        .expect("last sync should load")
        .expect("a completed run should exist");
    assert_eq!(history[1].completed_at, Some(last));
    assert_eq!(service.is_due(last, Duration::minutes(60)), Ok(false));
    assert_eq!(
        service.is_due(last + Duration::minutes(61), Duration::minutes(60)),
        Ok(true)
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn client_delivery_view_reads_the_local_store() {
    let temp_dir = unique_test_dir("client-view");
    let repo = initialized_repo(&temp_dir);
    let mut rework = item("w2", "t1", 8);
    rework.turing_status = STATUS_REWORK.to_string();
    repo.upsert_work_items(&[item("w1", "t1", 7), rework, item("w3", "t2", 7)])
        .expect("upsert should succeed");

    let bus = RefreshBus::new();
    let mut session =
        ViewSession::new(ViewSchema::client_delivery(), Arc::new(repo.clone()), 100, 1000)
            .subscribe(&bus);
    session.reload().expect("store fetch should succeed");

    let result = session.result();
    assert_eq!(result.total_filtered_count, 3);
    assert_eq!(result.aggregates.distinct_count(&FieldId::field("task_id")), 2);
    let rework_pct = result.aggregates.derived["rework_pct"];
    assert!((rework_pct - 100.0 / 3.0).abs() < 1e-9);

    session.set_selection(
        FieldId::field("turing_status"),
        [STATUS_REWORK.to_string()].into_iter().collect(),
    );
    assert_eq!(session.result().total_filtered_count, 1);

    repo.upsert_work_items(&[item("w4", "t3", 9)])
        .expect("upsert should succeed");
    bus.publish(RefreshSignal::ExternalSyncCompleted);
    assert_eq!(session.poll_refresh(), Ok(true));
    assert_eq!(session.result().total_filtered_count, 4);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn json_export_feeds_the_task_level_view() {
    let temp_dir = unique_test_dir("json-source");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let export = temp_dir.join("tasks.json");
    fs::write(
        &export,
        r#"[
            {"task_id": 10, "task_score": 4.0, "domain": "Math",
             "quality_dimensions": {"Accuracy": 5}},
            {"task_id": 9, "task_score": 2.0, "domain": "Code",
             "quality_dimensions": {"Accuracy": 3}},
            {"task_id": 11, "task_score": null, "domain": "Math"}
        ]"#,
    )
    .expect("should write export");

    let source = Arc::new(JsonFileSource::new(export));
    let mut session = ViewSession::new(ViewSchema::task_level(), source, 100, 1000);
    session.reload().expect("json fetch should succeed");

    let columns: Vec<String> = session.columns().iter().map(|c| c.key()).collect();
    assert!(columns.contains(&"dim:Accuracy".to_string()));

    session.toggle_sort(&FieldId::field("task_id"));
    let result = session.result();
    let ids: Vec<String> = result
        .rows
        .iter()
        .map(|row| row.get(&FieldId::field("task_id")).to_string())
        .collect();
    assert_eq!(ids, vec!["10", "11", "9"]);
    assert_eq!(result.aggregates.sum(&FieldId::field("task_score")), 6.0);
    assert_eq!(result.aggregates.average(&FieldId::field("task_score")), Some(3.0));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn missing_json_export_is_reported_as_a_fetch_error() {
    let temp_dir = unique_test_dir("json-missing");
    let source = Arc::new(JsonFileSource::new(temp_dir.join("absent.json")));
    let mut session = ViewSession::new(ViewSchema::task_level(), source, 100, 1000);

    let err = session.reload().expect_err("missing export should fail");

    assert!(err.to_string().contains("failed to read dataset"));
}
