use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A stored task as read back from the task store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: i64,
    pub task_type: String,
    pub effort_description: String,
    pub ability_description: String,
    pub effort_score: i64,
    pub ability_score: i64,
    pub user_adjusted_score: Option<i64>,
    pub date: NaiveDate,
}

impl TaskRecord {
    /// The user override when one exists, otherwise the AI effort score.
    pub fn effective_score(&self) -> i64 {
        self.user_adjusted_score.unwrap_or(self.effort_score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TaskSubmitInput {
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub effort_description: Option<String>,
    #[serde(default)]
    pub ability_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSubmission {
    pub task_id: i64,
    pub effort_score: u8,
    pub ability_score: u8,
}
