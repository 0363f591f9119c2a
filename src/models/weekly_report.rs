use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Seven days at the top score of 10.
pub const MAX_POSSIBLE_SCORE: u32 = 70;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyScore {
    pub day: String,
    pub date: NaiveDate,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyReport {
    pub daily_scores: Vec<DailyScore>,
    pub total_score: u32,
    pub max_possible: u32,
}

impl WeeklyReport {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.daily_scores.first().map(|entry| entry.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.daily_scores.last().map(|entry| entry.date)
    }
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}
