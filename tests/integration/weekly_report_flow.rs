// End-to-end: submit, override and aggregate against a real SQLite file.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use effort_tracker_lib::db::migrations::get_migration_history;
use effort_tracker_lib::db::DbPool;
use effort_tracker_lib::error::{AppError, AppResult};
use effort_tracker_lib::models::score::{ScorePair, ScoreRequest};
use effort_tracker_lib::models::task::TaskSubmitInput;
use effort_tracker_lib::services::credential_service::CredentialManager;
use effort_tracker_lib::services::scoring_service::{ScoreProvider, ScoringConfig, ScoringService};
use effort_tracker_lib::services::task_service::TaskService;
use effort_tracker_lib::AppState;
use serde_json::json;
use tempfile::TempDir;

/// Hands out queued pairs in order, then the fallback.
struct QueuedProvider(Mutex<VecDeque<ScorePair>>);

#[async_trait::async_trait]
impl ScoreProvider for QueuedProvider {
    async fn score(&self, _request: &ScoreRequest) -> AppResult<ScorePair> {
        self.0
            .lock()
            .expect("queue lock")
            .pop_front()
            .ok_or_else(|| AppError::other("queue exhausted"))
    }
}

fn setup(scores: &[(u32, u32)]) -> (TempDir, DbPool, TaskService) {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("tasks.sqlite")).expect("db pool");
    let queue: VecDeque<ScorePair> = scores
        .iter()
        .map(|&(effort, ability)| ScorePair::clamped(effort, ability))
        .collect();
    let scoring = ScoringService::with_provider(Arc::new(QueuedProvider(Mutex::new(queue))));
    let service = TaskService::new(pool.clone(), Arc::new(scoring));
    (dir, pool, service)
}

fn input(task_type: &str) -> TaskSubmitInput {
    TaskSubmitInput {
        task_type: Some(task_type.to_string()),
        effort_description: Some("专注了一下午".to_string()),
        ability_description: Some("基本独立完成".to_string()),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn absent_credential_stores_fallback_scores() {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("tasks.sqlite")).expect("db pool");
    let state = AppState::new(pool, CredentialManager::absent(), &ScoringConfig::default())
        .expect("app state");
    assert!(!state.credential().is_valid());

    let tasks = state.task_service();
    let submission = tasks
        .submit_task_on(input("阅读"), date(2025, 3, 12))
        .await
        .expect("submit");

    assert_eq!((submission.effort_score, submission.ability_score), (5, 5));

    let stored = tasks.get_task(submission.task_id).expect("stored task");
    assert_eq!(stored.task_type, "阅读");
    assert_eq!(stored.effort_score, 5);
    assert_eq!(stored.ability_score, 5);
    assert_eq!(stored.user_adjusted_score, None);
    assert_eq!(stored.date, date(2025, 3, 12));
}

#[tokio::test]
async fn missing_fields_are_rejected_before_scoring() {
    let (_dir, _pool, service) = setup(&[(9, 9)]);

    let result = service
        .submit_task_on(
            TaskSubmitInput {
                effort_description: None,
                ..input("运动")
            },
            date(2025, 3, 12),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation { .. })));

    // The queued score is still unused.
    let submission = service
        .submit_task_on(input("运动"), date(2025, 3, 12))
        .await
        .expect("submit");
    assert_eq!(submission.effort_score, 9);
}

#[tokio::test]
async fn adjust_score_validates_range_and_existence() {
    let (_dir, _pool, service) = setup(&[(4, 6)]);
    let submission = service
        .submit_task_on(input("写作"), date(2025, 3, 12))
        .await
        .expect("submit");

    for bad in [0, 11, -3] {
        let err = service
            .adjust_score(submission.task_id, bad)
            .expect_err("out of range");
        assert_eq!(err.to_string(), "验证失败: 调整分数必须在1-10之间");
    }

    let err = service.adjust_score(9_999, 5).expect_err("unknown task");
    assert!(matches!(err, AppError::NotFound));

    service.adjust_score(submission.task_id, 10).expect("adjust");
    let stored = service.get_task(submission.task_id).expect("stored");
    assert_eq!(stored.user_adjusted_score, Some(10));
    assert_eq!(stored.effective_score(), 10);
    assert_eq!(stored.effort_score, 4);
}

#[tokio::test]
async fn weekly_report_reconciles_scores_and_overrides() {
    let (_dir, _pool, service) = setup(&[(6, 5), (8, 5), (3, 7), (10, 10), (2, 2)]);
    let monday = date(2025, 3, 10);
    let wednesday = date(2025, 3, 12);

    service.submit_task_on(input("编程"), monday).await.expect("submit");
    service.submit_task_on(input("复盘"), monday).await.expect("submit");
    let overridden = service
        .submit_task_on(input("学习"), wednesday)
        .await
        .expect("submit");
    // Previous and next week; both outside the report.
    service
        .submit_task_on(input("旧任务"), date(2025, 3, 9))
        .await
        .expect("submit");
    service
        .submit_task_on(input("新任务"), date(2025, 3, 17))
        .await
        .expect("submit");

    service.adjust_score(overridden.task_id, 9).expect("adjust");

    let report = service.weekly_report(date(2025, 3, 14)).expect("report");

    let scores: Vec<u32> = report.daily_scores.iter().map(|entry| entry.score).collect();
    assert_eq!(scores, vec![7, 0, 9, 0, 0, 0, 0]);
    assert_eq!(report.total_score, 16);
    assert_eq!(report.max_possible, 70);
    assert_eq!(report.daily_scores[0].date, monday);
    assert_eq!(report.daily_scores[6].date, date(2025, 3, 16));

    let again = service.weekly_report(date(2025, 3, 14)).expect("report");
    assert_eq!(report, again);
}

#[tokio::test]
async fn weekly_report_serializes_to_presentation_shape() {
    let (_dir, _pool, service) = setup(&[(7, 7)]);
    service
        .submit_task_on(input("冥想"), date(2025, 3, 10))
        .await
        .expect("submit");

    let report = service.weekly_report(date(2025, 3, 10)).expect("report");
    let value = serde_json::to_value(&report).expect("serialize");

    assert_eq!(
        value["daily_scores"][0],
        json!({"day": "周一", "date": "2025-03-10", "score": 7})
    );
    assert_eq!(
        value["daily_scores"][6],
        json!({"day": "周日", "date": "2025-03-16", "score": 0})
    );
    assert_eq!(value["total_score"], 7);
    assert_eq!(value["max_possible"], 70);
}

#[test]
fn empty_store_gives_empty_week() {
    let (_dir, _pool, service) = setup(&[]);

    let report = service.weekly_report(date(2025, 3, 12)).expect("report");

    assert_eq!(report.daily_scores.len(), 7);
    assert_eq!(report.total_score, 0);
}

#[test]
fn migrations_are_recorded_once() {
    let (_dir, pool, _service) = setup(&[]);

    // Opening more connections must not re-run migrations.
    pool.get_connection().expect("second connection");
    let history = pool
        .with_connection(|conn| get_migration_history(conn))
        .expect("history");

    let versions: Vec<i32> = history.iter().map(|info| info.version).collect();
    assert_eq!(versions, vec![1, 2]);
}
