use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::db::repositories::task_repository::{NewTaskRow, TaskRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::score::{ScoreRequest, MAX_SCORE, MIN_SCORE};
use crate::models::task::{TaskRecord, TaskSubmission, TaskSubmitInput};
use crate::models::weekly_report::WeeklyReport;
use crate::services::scoring_service::ScoringService;
use crate::services::weekly_report_service::{aggregate, week_bounds};

#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
    scoring: Arc<ScoringService>,
}

impl TaskService {
    pub fn new(db: DbPool, scoring: Arc<ScoringService>) -> Self {
        Self { db, scoring }
    }

    /// Score and store a task dated today (local time).
    pub async fn submit_task(&self, input: TaskSubmitInput) -> AppResult<TaskSubmission> {
        self.submit_task_on(input, Local::now().date_naive()).await
    }

    pub async fn submit_task_on(
        &self,
        input: TaskSubmitInput,
        date: NaiveDate,
    ) -> AppResult<TaskSubmission> {
        let request = validate_submission(input)?;

        // No connection is open while the provider call is in flight.
        let scores = self.scoring.score(&request).await;

        let row = NewTaskRow::new(
            request.task_type,
            request.effort_description,
            request.ability_description,
            i64::from(scores.effort_score()),
            i64::from(scores.ability_score()),
            date,
        );
        let task_id = self
            .db
            .with_connection(|conn| TaskRepository::insert(conn, &row))?;

        info!(
            target: "app::task",
            task_id,
            effort_score = scores.effort_score(),
            ability_score = scores.ability_score(),
            "task submitted"
        );

        Ok(TaskSubmission {
            task_id,
            effort_score: scores.effort_score(),
            ability_score: scores.ability_score(),
        })
    }

    /// Record the user's own score for a task; it replaces the AI effort score
    /// in weekly reports.
    pub fn adjust_score(&self, task_id: i64, adjusted_score: i64) -> AppResult<()> {
        if !(i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&adjusted_score) {
            return Err(AppError::validation("调整分数必须在1-10之间"));
        }

        let affected = self.db.with_connection(|conn| {
            TaskRepository::update_user_adjusted_score(conn, task_id, adjusted_score)
        })?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        info!(target: "app::task", task_id, adjusted_score, "score adjusted");
        Ok(())
    }

    pub fn get_task(&self, task_id: i64) -> AppResult<TaskRecord> {
        let row = self
            .db
            .with_connection(|conn| TaskRepository::find_by_id(conn, task_id))?
            .ok_or_else(AppError::not_found)?;
        row.into_record()
    }

    pub fn weekly_report(&self, reference_date: NaiveDate) -> AppResult<WeeklyReport> {
        let (start, end) = week_bounds(reference_date);
        let rows = self
            .db
            .with_connection(|conn| TaskRepository::list_between(conn, &start, &end))?;
        let records = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        debug!(
            target: "app::weekly",
            start = %start,
            end = %end,
            count = records.len(),
            "building weekly report"
        );

        Ok(aggregate(&records, reference_date))
    }

    pub fn current_week_report(&self) -> AppResult<WeeklyReport> {
        self.weekly_report(Local::now().date_naive())
    }
}

fn validate_submission(input: TaskSubmitInput) -> AppResult<ScoreRequest> {
    let required = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

    match (
        required(input.task_type),
        required(input.effort_description),
        required(input.ability_description),
    ) {
        (Some(task_type), Some(effort), Some(ability)) => {
            Ok(ScoreRequest::new(task_type, effort, ability))
        }
        _ => Err(AppError::validation("缺少必要字段")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(task_type: &str, effort: &str, ability: &str) -> TaskSubmitInput {
        TaskSubmitInput {
            task_type: Some(task_type.to_string()),
            effort_description: Some(effort.to_string()),
            ability_description: Some(ability.to_string()),
        }
    }

    #[test]
    fn submission_requires_all_fields() {
        assert!(validate_submission(input("编程", "写了三个模块", "熟练")).is_ok());

        for bad in [
            input("", "写了三个模块", "熟练"),
            input("编程", "   ", "熟练"),
            TaskSubmitInput {
                ability_description: None,
                ..input("编程", "写了三个模块", "熟练")
            },
        ] {
            let err = validate_submission(bad).unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
            assert_eq!(err.to_string(), "验证失败: 缺少必要字段");
        }
    }

    #[test]
    fn submission_keeps_fields_verbatim() {
        let request = validate_submission(input(" 编程 ", "写代码\n", "熟练")).unwrap();
        assert_eq!(request, ScoreRequest::new(" 编程 ", "写代码\n", "熟练"));
    }
}
