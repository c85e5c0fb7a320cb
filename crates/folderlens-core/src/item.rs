//! Activity item types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{ValidationError, ViolationKind, check_range};

/// Unique identifier for an activity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub CompactString);

impl ActivityId {
    /// Create a new ActivityId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// GEPT English-proficiency tier, ordered from lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GeptLevel {
    Elementary,
    Intermediate,
    HighIntermediate,
}

/// Visibility of a shared activity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ShareType {
    Public,
    Private,
    Class,
}

/// Learning outcomes recorded for an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningData {
    /// Fraction of learners completing the activity, in [0, 1].
    pub completion_rate: f64,
    /// Mean score, in [0, 100].
    pub average_score: f64,
    pub total_attempts: u64,
    /// Never exceeds `total_attempts`.
    pub successful_attempts: u64,
    /// Minutes spent.
    pub time_spent: u64,
    /// Fraction retained, in [0, 1].
    pub retention_rate: f64,
    /// Difficulty, in [1, 10].
    pub difficulty_level: f64,
    #[serde(default)]
    pub last_studied_at: Option<DateTime<Utc>>,
}

/// Usage counters for an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    pub view_count: u64,
    pub edit_count: u64,
    pub share_count: u64,
    pub download_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

/// Sharing and collaboration state of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationData {
    pub collaborator_count: u64,
    #[serde(default)]
    pub last_collaborated_at: Option<DateTime<Utc>>,
    pub is_shared: bool,
    pub share_type: ShareType,
    /// Opaque identities granted access.
    #[serde(default)]
    pub permissions: BTreeSet<CompactString>,
}

/// A leaf content unit inside a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    /// Unique identifier.
    pub id: ActivityId,

    /// Display name.
    pub name: CompactString,

    /// Content template kind (open set, e.g. `quiz`, `match-up`).
    #[serde(rename = "type")]
    pub activity_type: CompactString,

    /// Proficiency tier, if tagged.
    #[serde(default)]
    pub gept_level: Option<GeptLevel>,

    /// Free-form tags. Duplicates collapse; first-seen order is kept.
    #[serde(default)]
    pub tags: IndexSet<CompactString>,

    /// Size in bytes.
    pub size: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub learning_data: Option<LearningData>,
    #[serde(default)]
    pub usage_stats: Option<UsageStats>,
    #[serde(default)]
    pub collaboration_data: Option<CollaborationData>,
}

impl ActivityItem {
    /// Create a new activity with no optional data blocks.
    ///
    /// `updated_at` starts equal to `created_at`.
    pub fn new(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        activity_type: impl Into<CompactString>,
        size: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new(id),
            name: name.into(),
            activity_type: activity_type.into(),
            gept_level: None,
            tags: IndexSet::new(),
            size,
            created_at,
            updated_at: created_at,
            last_accessed_at: None,
            learning_data: None,
            usage_stats: None,
            collaboration_data: None,
        }
    }

    /// Set the GEPT level.
    pub fn with_gept_level(mut self, level: GeptLevel) -> Self {
        self.gept_level = Some(level);
        self
    }

    /// Replace the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the last update time.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Set the last access time.
    pub fn with_last_accessed_at(mut self, accessed_at: DateTime<Utc>) -> Self {
        self.last_accessed_at = Some(accessed_at);
        self
    }

    /// Attach learning data.
    pub fn with_learning_data(mut self, data: LearningData) -> Self {
        self.learning_data = Some(data);
        self
    }

    /// Attach usage statistics.
    pub fn with_usage_stats(mut self, stats: UsageStats) -> Self {
        self.usage_stats = Some(stats);
        self
    }

    /// Attach collaboration data.
    pub fn with_collaboration_data(mut self, data: CollaborationData) -> Self {
        self.collaboration_data = Some(data);
        self
    }

    /// Check whether the activity carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Number of views, or 0 without usage data.
    pub fn view_count(&self) -> u64 {
        self.usage_stats.as_ref().map_or(0, |u| u.view_count)
    }

    /// Check the domain invariants of this activity.
    ///
    /// Returns every violation found, or an empty list for a valid item.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let id = self.id.as_str();

        if self.updated_at < self.created_at {
            errors.push(ValidationError::new(
                id,
                "updated_at",
                format!("{} is earlier than created_at {}", self.updated_at, self.created_at),
                ViolationKind::TimestampsOutOfOrder,
            ));
        }

        if let Some(learning) = &self.learning_data {
            check_range(&mut errors, id, "completion_rate", learning.completion_rate, 0.0, 1.0);
            check_range(&mut errors, id, "average_score", learning.average_score, 0.0, 100.0);
            check_range(&mut errors, id, "retention_rate", learning.retention_rate, 0.0, 1.0);
            check_range(&mut errors, id, "difficulty_level", learning.difficulty_level, 1.0, 10.0);

            if learning.successful_attempts > learning.total_attempts {
                errors.push(ValidationError::new(
                    id,
                    "successful_attempts",
                    format!(
                        "{} exceeds total_attempts {}",
                        learning.successful_attempts, learning.total_attempts
                    ),
                    ViolationKind::AttemptsExceeded,
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn learning() -> LearningData {
        LearningData {
            completion_rate: 0.5,
            average_score: 80.0,
            total_attempts: 10,
            successful_attempts: 6,
            time_spent: 45,
            retention_rate: 0.7,
            difficulty_level: 4.0,
            last_studied_at: None,
        }
    }

    #[test]
    fn test_gept_level_strings() {
        assert_eq!(GeptLevel::HighIntermediate.to_string(), "high-intermediate");
        assert_eq!("elementary".parse::<GeptLevel>().unwrap(), GeptLevel::Elementary);
        assert!(GeptLevel::Elementary < GeptLevel::HighIntermediate);
    }

    #[test]
    fn test_activity_defaults() {
        let item = ActivityItem::new("a1", "Verbs", "quiz", 1000, ts(1));
        assert_eq!(item.updated_at, item.created_at);
        assert!(item.gept_level.is_none());
        assert!(item.learning_data.is_none());
        assert_eq!(item.view_count(), 0);
    }

    #[test]
    fn test_valid_activity() {
        let item = ActivityItem::new("a1", "Verbs", "quiz", 1000, ts(1))
            .with_updated_at(ts(2))
            .with_learning_data(learning());
        assert!(item.validate().is_empty());
    }

    #[test]
    fn test_invalid_activity() {
        let mut data = learning();
        data.successful_attempts = 11;
        data.completion_rate = 1.2;
        let item = ActivityItem::new("a1", "Verbs", "quiz", 1000, ts(2))
            .with_updated_at(ts(1))
            .with_learning_data(data);

        let errors = item.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.kind == ViolationKind::AttemptsExceeded));
        assert!(errors.iter().any(|e| e.kind == ViolationKind::TimestampsOutOfOrder));
        assert!(errors.iter().any(|e| e.field == "completion_rate"));
    }

    #[test]
    fn test_activity_json_shape() {
        let item = ActivityItem::new("a1", "Verbs", "quiz", 10, ts(1))
            .with_gept_level(GeptLevel::HighIntermediate)
            .with_tags(["math"]);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "quiz");
        assert_eq!(json["gept_level"], "high-intermediate");
        assert_eq!(json["id"], "a1");
    }
}
