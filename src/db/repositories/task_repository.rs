use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::task::TaskRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

const BASE_SELECT: &str = r#"
    SELECT
        id,
        task_type,
        effort_description,
        ability_description,
        effort_score,
        ability_score,
        user_adjusted_score,
        date
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct NewTaskRow {
    pub task_type: String,
    pub effort_description: String,
    pub ability_description: String,
    pub effort_score: i64,
    pub ability_score: i64,
    pub date: String,
}

impl NewTaskRow {
    pub fn new(
        task_type: String,
        effort_description: String,
        ability_description: String,
        effort_score: i64,
        ability_score: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            task_type,
            effort_description,
            ability_description,
            effort_score,
            ability_score,
            date: date.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: i64,
    pub task_type: String,
    pub effort_description: String,
    pub ability_description: String,
    pub effort_score: i64,
    pub ability_score: i64,
    pub user_adjusted_score: Option<i64>,
    pub date: String,
}

impl TaskRow {
    pub fn into_record(self) -> AppResult<TaskRecord> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|err| {
            AppError::database(format!("任务 {} 的日期格式无效 ({}): {err}", self.id, self.date))
        })?;

        Ok(TaskRecord {
            id: self.id,
            task_type: self.task_type,
            effort_description: self.effort_description,
            ability_description: self.ability_description,
            effort_score: self.effort_score,
            ability_score: self.ability_score,
            user_adjusted_score: self.user_adjusted_score,
            date,
        })
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TaskRow {
            id: row.get("id")?,
            task_type: row.get("task_type")?,
            effort_description: row.get("effort_description")?,
            ability_description: row.get("ability_description")?,
            effort_score: row.get("effort_score")?,
            ability_score: row.get("ability_score")?,
            user_adjusted_score: row.get("user_adjusted_score")?,
            date: row.get("date")?,
        })
    }
}

pub struct TaskRepository;

impl TaskRepository {
    /// Returns the new row id.
    pub fn insert(conn: &Connection, row: &NewTaskRow) -> AppResult<i64> {
        conn.execute(
            r#"
                INSERT INTO tasks (
                    task_type,
                    effort_description,
                    ability_description,
                    effort_score,
                    ability_score,
                    date
                ) VALUES (
                    :task_type,
                    :effort_description,
                    :ability_description,
                    :effort_score,
                    :ability_score,
                    :date
                )
            "#,
            named_params! {
                ":task_type": &row.task_type,
                ":effort_description": &row.effort_description,
                ":ability_description": &row.ability_description,
                ":effort_score": &row.effort_score,
                ":ability_score": &row.ability_score,
                ":date": &row.date,
            },
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<TaskRow>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| TaskRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Rows dated within `start..=end`, ordered by date then id.
    pub fn list_between(
        conn: &Connection,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> AppResult<Vec<TaskRow>> {
        let sql = format!(
            "{BASE_SELECT} WHERE date BETWEEN :start AND :end ORDER BY date ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":start": start.format(DATE_FORMAT).to_string(),
                    ":end": end.format(DATE_FORMAT).to_string(),
                },
                |row| TaskRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Returns the number of affected rows; zero means no such task.
    pub fn update_user_adjusted_score(conn: &Connection, id: i64, score: i64) -> AppResult<usize> {
        let affected = conn.execute(
            r#"
                UPDATE tasks
                SET user_adjusted_score = :score
                WHERE id = :id
            "#,
            named_params! {
                ":score": score,
                ":id": id,
            },
        )?;

        Ok(affected)
    }
}
