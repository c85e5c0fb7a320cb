//! Composite folder health score.

use chrono::{DateTime, TimeDelta, Utc};

use folderlens_core::{ActivityItem, HealthMetrics, LearningStatistics, UsageStatistics};

/// Weight applied to shares per activity. One share per activity yields 50.
pub const SHARE_WEIGHT: f64 = 50.0;

/// Compute the four health sub-scores and their unweighted mean.
///
/// Every sub-score is 0 for a folder with no activities.
pub fn health_metrics(
    activities: &[ActivityItem],
    learning: &LearningStatistics,
    usage: &UsageStatistics,
    now: DateTime<Utc>,
    freshness_window: TimeDelta,
) -> HealthMetrics {
    if activities.is_empty() {
        return HealthMetrics::default();
    }
    let total = activities.len() as f64;

    let cutoff = now - freshness_window;
    let recently_updated = activities.iter().filter(|a| a.updated_at >= cutoff).count() as f64;
    let activity_freshness = recently_updated / total * 100.0;

    let learning_engagement = (learning.recent_activity as f64 / total * 100.0).min(100.0);

    let collaboration_health = (usage.total_shares as f64 / total * SHARE_WEIGHT).min(100.0);

    let content_quality = (learning.average_score + learning.average_completion_rate * 100.0) / 2.0;

    HealthMetrics::from_scores(
        activity_freshness,
        learning_engagement,
        collaboration_health,
        content_quality,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_folder_scores_zero() {
        let health = health_metrics(
            &[],
            &LearningStatistics::default(),
            &UsageStatistics::default(),
            now(),
            TimeDelta::days(30),
        );
        assert_eq!(health, HealthMetrics::default());
    }

    #[test]
    fn test_scores() {
        let activities = vec![
            ActivityItem::new("a", "A", "quiz", 1, now() - TimeDelta::days(1)),
            ActivityItem::new("b", "B", "quiz", 1, now() - TimeDelta::days(60)),
        ];
        let learning = LearningStatistics {
            average_score: 80.0,
            average_completion_rate: 0.6,
            recent_activity: 1,
            ..LearningStatistics::default()
        };
        let usage = UsageStatistics {
            total_shares: 3,
            ..UsageStatistics::default()
        };

        let health = health_metrics(&activities, &learning, &usage, now(), TimeDelta::days(30));
        assert_eq!(health.activity_freshness, 50.0);
        assert_eq!(health.learning_engagement, 50.0);
        assert_eq!(health.collaboration_health, 75.0);
        assert_eq!(health.content_quality, 70.0);
        assert_eq!(health.overall_health, (50.0 + 50.0 + 75.0 + 70.0) / 4.0);
    }

    #[test]
    fn test_collaboration_capped() {
        let activities = vec![ActivityItem::new("a", "A", "quiz", 1, now())];
        let usage = UsageStatistics {
            total_shares: 10,
            ..UsageStatistics::default()
        };
        let health = health_metrics(
            &activities,
            &LearningStatistics::default(),
            &usage,
            now(),
            TimeDelta::days(30),
        );
        assert_eq!(health.collaboration_health, 100.0);
        assert_eq!(health.activity_freshness, 100.0);
    }
}
