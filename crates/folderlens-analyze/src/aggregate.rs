//! Aggregation stage: turns filtered activities and subfolders into a
//! [`FolderStatistics`] report.
//!
//! Optional data blocks (learning, usage, collaboration) mean "no data" when
//! absent. Each roll-up only looks at the activities that carry its block, and
//! every mean over an empty subset is 0.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use folderlens_core::{
    ActivityItem, ActivityRef, AnalyticsConfig, AnalyticsFilter, BasicStatistics,
    CollaborationStatistics, Distributions, FolderItem, FolderStatistics, LearningStatistics,
    ShareType, TagCount, TagStatistics, TimeStatistics, TrendData, TrendSource, UsageStatistics,
};

use crate::filter::{apply_filter, apply_folder_filter};
use crate::health::health_metrics;
use crate::trends::{creation_trend, learning_trend, usage_trend};

/// Builds statistics reports.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCalculator {
    config: AnalyticsConfig,
}

impl StatisticsCalculator {
    /// Create a new calculator with default config.
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
        }
    }

    /// Create a new calculator with custom config.
    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// The config in use.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run the filter stage and then the aggregation stage.
    pub fn analyze(
        &self,
        activities: &[ActivityItem],
        subfolders: &[FolderItem],
        filter: &AnalyticsFilter,
        now: DateTime<Utc>,
    ) -> FolderStatistics {
        let activities = apply_filter(activities, filter);
        let subfolders = apply_folder_filter(subfolders, filter);
        self.calculate(&activities, &subfolders, filter, now)
    }

    /// Compute a report over already-filtered inputs.
    pub fn calculate(
        &self,
        activities: &[ActivityItem],
        subfolders: &[FolderItem],
        filter: &AnalyticsFilter,
        now: DateTime<Utc>,
    ) -> FolderStatistics {
        let recent_cutoff = now - self.config.recent_window();
        let today = now.date_naive();

        let learning = learning_statistics(activities, recent_cutoff);
        let usage = usage_statistics(activities);
        let health = health_metrics(
            activities,
            &learning,
            &usage,
            now,
            self.config.freshness_window(),
        );

        let report = FolderStatistics {
            generated_at: now,
            applied_filter: filter.clone(),
            basic: basic_statistics(activities, subfolders),
            time: time_statistics(activities),
            distributions: distributions(activities),
            learning,
            usage,
            collaboration: collaboration_statistics(activities, recent_cutoff),
            tags: tag_statistics(activities, self.config.top_tags),
            trends: TrendData {
                activity_creation: creation_trend(activities, today, self.config.creation_trend_days),
                usage: usage_trend(activities, today, self.config.usage_trend_days),
                usage_source: TrendSource::Approximated,
                learning_progress: learning_trend(
                    activities,
                    today,
                    self.config.learning_trend_days,
                ),
            },
            health,
        };

        debug!(
            activities = report.basic.total_activities,
            subfolders = report.basic.total_subfolders,
            overall_health = report.health.overall_health,
            "Computed folder statistics"
        );

        report
    }
}

/// Arithmetic mean, 0 for an empty input.
fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u64), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// First activity with the strictly greatest value, in input order.
fn arg_max<'a, I>(items: I) -> Option<ActivityRef>
where
    I: IntoIterator<Item = (&'a ActivityItem, u64)>,
{
    let mut best: Option<(&ActivityItem, u64)> = None;
    for (activity, value) in items {
        if best.is_none_or(|(_, v)| value > v) {
            best = Some((activity, value));
        }
    }
    best.map(|(activity, value)| ActivityRef::new(activity, value))
}

/// Sum of counters, clamped at `u64::MAX`.
pub(crate) fn saturating_sum(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// Counts and sizes.
pub fn basic_statistics(activities: &[ActivityItem], subfolders: &[FolderItem]) -> BasicStatistics {
    let total_activities = activities.len() as u64;
    let total_size = saturating_sum(activities.iter().map(|a| a.size));
    let average_activity_size = if total_activities > 0 {
        total_size as f64 / total_activities as f64
    } else {
        0.0
    };

    BasicStatistics {
        total_activities,
        total_subfolders: subfolders.len() as u64,
        total_size,
        average_activity_size,
    }
}

/// Earliest and latest timestamps.
pub fn time_statistics(activities: &[ActivityItem]) -> TimeStatistics {
    let mut time = TimeStatistics::default();
    for activity in activities {
        time.record(activity);
    }
    time
}

/// Type and GEPT level distributions, in one pass.
pub fn distributions(activities: &[ActivityItem]) -> Distributions {
    let mut dist = Distributions::default();
    for activity in activities {
        *dist
            .by_type
            .entry(activity.activity_type.clone())
            .or_default() += 1;
        dist.by_gept_level.record(activity.gept_level);
    }
    dist
}

/// Roll-up over activities with learning data.
pub fn learning_statistics(
    activities: &[ActivityItem],
    recent_cutoff: DateTime<Utc>,
) -> LearningStatistics {
    let with_data: Vec<_> = activities
        .iter()
        .filter_map(|a| a.learning_data.as_ref().map(|d| (a, d)))
        .collect();

    LearningStatistics {
        average_completion_rate: mean(with_data.iter().map(|(_, d)| d.completion_rate)),
        average_score: mean(with_data.iter().map(|(_, d)| d.average_score)),
        total_attempts: saturating_sum(with_data.iter().map(|(_, d)| d.total_attempts)),
        total_time_spent: saturating_sum(with_data.iter().map(|(_, d)| d.time_spent)),
        average_retention_rate: mean(with_data.iter().map(|(_, d)| d.retention_rate)),
        average_difficulty_level: mean(with_data.iter().map(|(_, d)| d.difficulty_level)),
        activities_with_learning_data: with_data.iter().map(|(a, _)| &a.id).unique().count() as u64,
        recent_activity: with_data
            .iter()
            .filter(|(_, d)| d.last_studied_at.is_some_and(|t| t >= recent_cutoff))
            .count() as u64,
    }
}

/// Roll-up over activities with usage counters.
pub fn usage_statistics(activities: &[ActivityItem]) -> UsageStatistics {
    let with_usage: Vec<_> = activities
        .iter()
        .filter_map(|a| a.usage_stats.as_ref().map(|u| (a, u)))
        .collect();

    let total_views = saturating_sum(with_usage.iter().map(|(_, u)| u.view_count));
    let average_views_per_activity = if with_usage.is_empty() {
        0.0
    } else {
        total_views as f64 / with_usage.len() as f64
    };

    UsageStatistics {
        total_views,
        total_edits: saturating_sum(with_usage.iter().map(|(_, u)| u.edit_count)),
        total_shares: saturating_sum(with_usage.iter().map(|(_, u)| u.share_count)),
        total_downloads: saturating_sum(with_usage.iter().map(|(_, u)| u.download_count)),
        total_favorites: saturating_sum(with_usage.iter().map(|(_, u)| u.favorite_count)),
        total_comments: saturating_sum(with_usage.iter().map(|(_, u)| u.comment_count)),
        average_views_per_activity,
        most_viewed: arg_max(with_usage.iter().map(|(a, u)| (*a, u.view_count))),
        most_edited: arg_max(with_usage.iter().map(|(a, u)| (*a, u.edit_count))),
    }
}

/// Roll-up over activities with collaboration data.
pub fn collaboration_statistics(
    activities: &[ActivityItem],
    recent_cutoff: DateTime<Utc>,
) -> CollaborationStatistics {
    let mut stats = CollaborationStatistics::default();

    for (activity, data) in activities
        .iter()
        .filter_map(|a| a.collaboration_data.as_ref().map(|c| (a, c)))
    {
        stats.total_collaborators = stats
            .total_collaborators
            .saturating_add(data.collaborator_count);
        if data.collaborator_count > 0 {
            stats.activities_with_collaborators += 1;
        }
        if data.is_shared {
            stats.shared_activities += 1;
        }
        match data.share_type {
            ShareType::Public => stats.public_activities += 1,
            ShareType::Private => stats.private_activities += 1,
            ShareType::Class => stats.class_activities += 1,
        }
        if data.last_collaborated_at.is_some_and(|t| t >= recent_cutoff) {
            stats.recent_collaborations += 1;
        }
        if stats
            .most_collaborative
            .as_ref()
            .is_none_or(|best| data.collaborator_count > best.value)
        {
            stats.most_collaborative = Some(ActivityRef::new(activity, data.collaborator_count));
        }
    }

    stats
}

/// Tag frequencies and the top-`top_n` ranking.
pub fn tag_statistics(activities: &[ActivityItem], top_n: usize) -> TagStatistics {
    let mut distribution: IndexMap<CompactString, u64> = IndexMap::new();
    for tag in activities.iter().flat_map(|a| &a.tags) {
        *distribution.entry(tag.clone()).or_default() += 1;
    }

    let total_occurrences: u64 = distribution.values().sum();
    let percentage = |count: u64| {
        if total_occurrences == 0 {
            0.0
        } else {
            count as f64 / total_occurrences as f64 * 100.0
        }
    };

    // Stable sort keeps first-seen order among equal counts.
    let most_used_tags = distribution
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1))
        .take(top_n)
        .map(|(tag, &count)| TagCount {
            tag: tag.clone(),
            count,
            percentage: percentage(count),
        })
        .collect();

    TagStatistics {
        total_tags: distribution.len() as u64,
        total_occurrences,
        most_used_tags,
        tag_distribution: distribution,
    }
}
