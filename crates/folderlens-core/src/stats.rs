//! Folder statistics report types.

use chrono::{DateTime, NaiveDate, Utc};
use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::AnalyticsFilter;
use crate::item::{ActivityId, ActivityItem, GeptLevel};

/// Counts and sizes over the analyzed level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub total_activities: u64,
    pub total_subfolders: u64,
    /// Total size in bytes.
    pub total_size: u64,
    /// Mean activity size in bytes (0 without activities).
    pub average_activity_size: f64,
}

/// Time extremes across activities. `None` when no activity supplies the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeStatistics {
    /// Earliest `created_at`.
    pub oldest_activity: Option<DateTime<Utc>>,
    /// Latest `created_at`.
    pub newest_activity: Option<DateTime<Utc>>,
    /// Latest `updated_at`.
    pub last_modified: Option<DateTime<Utc>>,
    /// Latest `last_accessed_at`.
    pub last_accessed: Option<DateTime<Utc>>,
}

impl TimeStatistics {
    /// Fold one activity into the extremes.
    pub fn record(&mut self, activity: &ActivityItem) {
        let created = activity.created_at;
        if self.oldest_activity.is_none_or(|t| created < t) {
            self.oldest_activity = Some(created);
        }
        if self.newest_activity.is_none_or(|t| created > t) {
            self.newest_activity = Some(created);
        }
        if self.last_modified.is_none_or(|t| activity.updated_at > t) {
            self.last_modified = Some(activity.updated_at);
        }
        if let Some(accessed) = activity.last_accessed_at {
            if self.last_accessed.is_none_or(|t| accessed > t) {
                self.last_accessed = Some(accessed);
            }
        }
    }
}

/// Activity counts per GEPT level. Every activity lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeptDistribution {
    pub elementary: u64,
    pub intermediate: u64,
    #[serde(rename = "high-intermediate")]
    pub high_intermediate: u64,
    pub unspecified: u64,
}

impl GeptDistribution {
    /// Count one activity with the given level.
    pub fn record(&mut self, level: Option<GeptLevel>) {
        match level {
            Some(GeptLevel::Elementary) => self.elementary += 1,
            Some(GeptLevel::Intermediate) => self.intermediate += 1,
            Some(GeptLevel::HighIntermediate) => self.high_intermediate += 1,
            None => self.unspecified += 1,
        }
    }

    /// Count for a level (`None` = unspecified).
    pub fn get(&self, level: Option<GeptLevel>) -> u64 {
        match level {
            Some(GeptLevel::Elementary) => self.elementary,
            Some(GeptLevel::Intermediate) => self.intermediate,
            Some(GeptLevel::HighIntermediate) => self.high_intermediate,
            None => self.unspecified,
        }
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.elementary + self.intermediate + self.high_intermediate + self.unspecified
    }
}

/// Categorical distributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    /// Activity count per type, in first-seen order. Only non-zero keys appear.
    pub by_type: IndexMap<CompactString, u64>,
    pub by_gept_level: GeptDistribution,
}

/// Roll-up over activities carrying learning data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStatistics {
    pub average_completion_rate: f64,
    pub average_score: f64,
    pub total_attempts: u64,
    /// Minutes.
    pub total_time_spent: u64,
    pub average_retention_rate: f64,
    pub average_difficulty_level: f64,
    /// Number of distinct activities with learning data (not distinct learners).
    pub activities_with_learning_data: u64,
    /// Activities studied within the recent window.
    pub recent_activity: u64,
}

/// Reference to a single activity selected by an arg-max.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRef {
    pub id: ActivityId,
    pub name: CompactString,
    /// The value that won the comparison.
    pub value: u64,
}

impl ActivityRef {
    /// Reference an activity with the given winning value.
    pub fn new(activity: &ActivityItem, value: u64) -> Self {
        Self {
            id: activity.id.clone(),
            name: activity.name.clone(),
            value,
        }
    }
}

/// Roll-up over activities carrying usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub total_views: u64,
    pub total_edits: u64,
    pub total_shares: u64,
    pub total_downloads: u64,
    pub total_favorites: u64,
    pub total_comments: u64,
    pub average_views_per_activity: f64,
    pub most_viewed: Option<ActivityRef>,
    pub most_edited: Option<ActivityRef>,
}

/// Roll-up over activities carrying collaboration data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationStatistics {
    /// Sum of `collaborator_count`. Collaborators shared between activities count once per activity.
    pub total_collaborators: u64,
    /// Activities with at least one collaborator.
    pub activities_with_collaborators: u64,
    pub shared_activities: u64,
    pub public_activities: u64,
    pub private_activities: u64,
    pub class_activities: u64,
    /// Activities collaborated on within the recent window.
    pub recent_collaborations: u64,
    pub most_collaborative: Option<ActivityRef>,
}

/// Frequency of one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: CompactString,
    pub count: u64,
    /// Share of all tag occurrences, in percent.
    pub percentage: f64,
}

/// Tag frequency statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStatistics {
    /// Number of distinct tags.
    pub total_tags: u64,
    /// Number of tag occurrences across all activities.
    pub total_occurrences: u64,
    /// Highest-frequency tags, descending; ties keep first-seen order.
    pub most_used_tags: Vec<TagCount>,
    /// Occurrences per tag, in first-seen order.
    pub tag_distribution: IndexMap<CompactString, u64>,
}

/// Activities created on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationTrendPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Views and edits attributed to one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTrendPoint {
    pub date: NaiveDate,
    pub views: u64,
    pub edits: u64,
}

/// Learning outcomes of activities last studied on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningTrendPoint {
    pub date: NaiveDate,
    pub average_score: f64,
    pub completion_rate: f64,
    /// Number of activities contributing to this day.
    pub samples: u64,
}

/// Where a trend series comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendSource {
    /// Built from per-day history.
    Recorded,
    /// Derived from cumulative counters and last-seen timestamps.
    #[default]
    Approximated,
}

/// Fixed-width daily series, oldest day first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub activity_creation: Vec<CreationTrendPoint>,
    pub usage: Vec<UsageTrendPoint>,
    pub usage_source: TrendSource,
    pub learning_progress: Vec<LearningTrendPoint>,
}

/// Health sub-scores on [0, 100] and their mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub activity_freshness: f64,
    pub learning_engagement: f64,
    pub collaboration_health: f64,
    pub content_quality: f64,
    pub overall_health: f64,
}

impl HealthMetrics {
    /// Combine sub-scores, clamping each to [0, 100]. Non-finite inputs count as 0.
    pub fn from_scores(
        activity_freshness: f64,
        learning_engagement: f64,
        collaboration_health: f64,
        content_quality: f64,
    ) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        let activity_freshness = clamp(activity_freshness);
        let learning_engagement = clamp(learning_engagement);
        let collaboration_health = clamp(collaboration_health);
        let content_quality = clamp(content_quality);
        Self {
            activity_freshness,
            learning_engagement,
            collaboration_health,
            content_quality,
            overall_health: (activity_freshness
                + learning_engagement
                + collaboration_health
                + content_quality)
                / 4.0,
        }
    }

    /// The four sub-scores followed by the overall score.
    pub fn all_scores(&self) -> [f64; 5] {
        [
            self.activity_freshness,
            self.learning_engagement,
            self.collaboration_health,
            self.content_quality,
            self.overall_health,
        ]
    }
}

/// Complete statistics report for one folder level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderStatistics {
    /// When this report was computed.
    pub generated_at: DateTime<Utc>,
    /// Filter the inputs were narrowed with.
    pub applied_filter: AnalyticsFilter,
    pub basic: BasicStatistics,
    pub time: TimeStatistics,
    pub distributions: Distributions,
    pub learning: LearningStatistics,
    pub usage: UsageStatistics,
    pub collaboration: CollaborationStatistics,
    pub tags: TagStatistics,
    pub trends: TrendData,
    pub health: HealthMetrics,
}

impl FolderStatistics {
    /// Check if the report covers no activities and no subfolders.
    pub fn is_empty(&self) -> bool {
        self.basic.total_activities == 0 && self.basic.total_subfolders == 0
    }

    /// Most used tag, if any.
    pub fn top_tag(&self) -> Option<&TagCount> {
        self.tags.most_used_tags.first()
    }
}
