pub mod credential;
pub mod score;
pub mod task;
pub mod weekly_report;
