//! Daily trend series.
//!
//! Every series covers a fixed number of UTC calendar days ending today,
//! oldest first, and has a point for every day even when nothing happened.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use folderlens_core::{ActivityItem, CreationTrendPoint, LearningTrendPoint, UsageTrendPoint};

/// The `days` calendar days ending at `today`, oldest first.
pub fn day_window(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}

/// Activities created per day.
pub fn creation_trend(
    activities: &[ActivityItem],
    today: NaiveDate,
    days: u32,
) -> Vec<CreationTrendPoint> {
    let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
    for activity in activities {
        *counts.entry(activity.created_at.date_naive()).or_default() += 1;
    }

    day_window(today, days)
        .into_iter()
        .map(|date| CreationTrendPoint {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Views and edits per day.
///
/// The model only carries cumulative counters, so this is an approximation:
/// an activity's views land on the day it was last accessed and its edits on
/// the day it was last updated.
pub fn usage_trend(activities: &[ActivityItem], today: NaiveDate, days: u32) -> Vec<UsageTrendPoint> {
    let mut views: HashMap<NaiveDate, u64> = HashMap::new();
    let mut edits: HashMap<NaiveDate, u64> = HashMap::new();

    for activity in activities {
        let Some(usage) = &activity.usage_stats else {
            continue;
        };
        if let Some(accessed) = activity.last_accessed_at {
            let day = views.entry(accessed.date_naive()).or_default();
            *day = day.saturating_add(usage.view_count);
        }
        let day = edits.entry(activity.updated_at.date_naive()).or_default();
        *day = day.saturating_add(usage.edit_count);
    }

    day_window(today, days)
        .into_iter()
        .map(|date| UsageTrendPoint {
            date,
            views: views.get(&date).copied().unwrap_or(0),
            edits: edits.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

#[derive(Default)]
struct LearningAccumulator {
    score: f64,
    completion: f64,
    samples: u64,
}

/// Mean score and completion rate of the activities last studied on each day.
pub fn learning_trend(
    activities: &[ActivityItem],
    today: NaiveDate,
    days: u32,
) -> Vec<LearningTrendPoint> {
    let mut by_day: HashMap<NaiveDate, LearningAccumulator> = HashMap::new();

    for data in activities.iter().filter_map(|a| a.learning_data.as_ref()) {
        let Some(studied) = data.last_studied_at else {
            continue;
        };
        let acc = by_day.entry(studied.date_naive()).or_default();
        acc.score += data.average_score;
        acc.completion += data.completion_rate;
        acc.samples += 1;
    }

    day_window(today, days)
        .into_iter()
        .map(|date| match by_day.get(&date) {
            Some(acc) if acc.samples > 0 => LearningTrendPoint {
                date,
                average_score: acc.score / acc.samples as f64,
                completion_rate: acc.completion / acc.samples as f64,
                samples: acc.samples,
            },
            _ => LearningTrendPoint {
                date,
                average_score: 0.0,
                completion_rate: 0.0,
                samples: 0,
            },
        })
        .collect()
}
