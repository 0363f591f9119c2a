use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::score::{MAX_SCORE, MIN_SCORE};
use crate::models::task::TaskRecord;
use crate::models::weekly_report::{weekday_label, DailyScore, WeeklyReport, MAX_POSSIBLE_SCORE};

/// Monday and Sunday of the week containing `reference_date`.
pub fn week_bounds(reference_date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(reference_date.weekday().num_days_from_monday());
    let start = reference_date - Duration::days(offset);
    (start, start + Duration::days(6))
}

/// Build the Monday-aligned weekly report for the week containing
/// `reference_date`. Pure: records outside the week are ignored, days without
/// records score 0.
pub fn aggregate(records: &[TaskRecord], reference_date: NaiveDate) -> WeeklyReport {
    let (start_of_week, end_of_week) = week_bounds(reference_date);

    let mut totals: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for record in records {
        if record.date < start_of_week || record.date > end_of_week {
            continue;
        }

        let score = record.effective_score();
        if score < i64::from(MIN_SCORE) || score > i64::from(MAX_SCORE) {
            debug!(
                target: "app::weekly",
                task_id = record.id,
                score,
                "skipping record with out-of-range effective score"
            );
            continue;
        }

        let entry = totals.entry(record.date).or_insert((0, 0));
        entry.0 += score as u64;
        entry.1 += 1;
    }

    let daily_scores: Vec<DailyScore> = start_of_week
        .iter_days()
        .take(7)
        .map(|date| {
            let score = totals
                .get(&date)
                .map(|&(sum, count)| round_half_even(sum, count))
                .unwrap_or(0);
            DailyScore {
                day: weekday_label(date.weekday()).to_string(),
                date,
                score,
            }
        })
        .collect();

    let total_score = daily_scores.iter().map(|entry| entry.score).sum();

    WeeklyReport {
        daily_scores,
        total_score,
        max_possible: MAX_POSSIBLE_SCORE,
    }
}

/// `sum / count` rounded to the nearest integer, ties to even.
fn round_half_even(sum: u64, count: u64) -> u32 {
    let quotient = sum / count;
    let twice_remainder = (sum % count) * 2;
    let rounded = if twice_remainder > count || (twice_remainder == count && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded as u32
}
