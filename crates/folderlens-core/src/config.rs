//! Analytics configuration types.

use chrono::TimeDelta;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Tunables for aggregation, trends and caching.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct AnalyticsConfig {
    /// How long a cached report stays fresh, in seconds.
    #[builder(default = "300")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached reports before the oldest are evicted.
    #[builder(default = "1024")]
    pub max_cache_entries: usize,

    /// Trailing window for "recent" study and collaboration, in days.
    #[builder(default = "7")]
    pub recent_window_days: u32,

    /// Trailing window for activity freshness, in days.
    #[builder(default = "30")]
    pub freshness_window_days: u32,

    /// Length of the activity creation trend, in days.
    #[builder(default = "30")]
    pub creation_trend_days: u32,

    /// Length of the usage trend, in days.
    #[builder(default = "7")]
    pub usage_trend_days: u32,

    /// Length of the learning progress trend, in days.
    #[builder(default = "7")]
    pub learning_trend_days: u32,

    /// Number of tags reported in the most-used ranking.
    #[builder(default = "10")]
    pub top_tags: usize,
}

impl AnalyticsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let checks = [
            ("cache_ttl_secs", self.cache_ttl_secs),
            ("max_cache_entries", self.max_cache_entries.map(|v| v as u64)),
            ("recent_window_days", self.recent_window_days.map(u64::from)),
            ("freshness_window_days", self.freshness_window_days.map(u64::from)),
            ("creation_trend_days", self.creation_trend_days.map(u64::from)),
            ("usage_trend_days", self.usage_trend_days.map(u64::from)),
            ("learning_trend_days", self.learning_trend_days.map(u64::from)),
            ("top_tags", self.top_tags.map(|v| v as u64)),
        ];
        for (name, value) in checks {
            if value == Some(0) {
                return Err(format!("{name} must be greater than zero"));
            }
        }
        Ok(())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            max_cache_entries: 1024,
            recent_window_days: 7,
            freshness_window_days: 30,
            creation_trend_days: 30,
            usage_trend_days: 7,
            learning_trend_days: 7,
            top_tags: 10,
        }
    }
}

impl AnalyticsConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::default()
    }

    /// Freshness window of cached reports.
    pub fn cache_ttl(&self) -> TimeDelta {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Window used for recent study and collaboration counts.
    pub fn recent_window(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.recent_window_days))
    }

    /// Window used for the activity freshness score.
    pub fn freshness_window(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.freshness_window_days))
    }

    /// Check a config that did not come through the builder (e.g. a file).
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let zero = [
            ("cache_ttl_secs", self.cache_ttl_secs == 0),
            ("max_cache_entries", self.max_cache_entries == 0),
            ("recent_window_days", self.recent_window_days == 0),
            ("freshness_window_days", self.freshness_window_days == 0),
            ("creation_trend_days", self.creation_trend_days == 0),
            ("usage_trend_days", self.usage_trend_days == 0),
            ("learning_trend_days", self.learning_trend_days == 0),
            ("top_tags", self.top_tags == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((name, _)) => Err(AnalyticsError::InvalidConfig {
                message: format!("{name} must be greater than zero"),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AnalyticsConfig::builder()
            .cache_ttl_secs(60u64)
            .top_tags(5usize)
            .build()
            .unwrap();

        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.top_tags, 5);
        assert_eq!(config.recent_window_days, 7);
        assert_eq!(config.cache_ttl(), TimeDelta::seconds(60));
    }

    #[test]
    fn test_config_builder_rejects_zero() {
        assert!(AnalyticsConfig::builder().top_tags(0usize).build().is_err());
        assert!(AnalyticsConfig::builder().usage_trend_days(0u32).build().is_err());
    }

    #[test]
    fn test_default_matches_builder() {
        let built = AnalyticsConfig::builder().build().unwrap();
        assert_eq!(built, AnalyticsConfig::default());
        assert_eq!(built.cache_ttl(), TimeDelta::minutes(5));
        assert_eq!(built.freshness_window(), TimeDelta::days(30));
    }

    #[test]
    fn test_validate() {
        assert!(AnalyticsConfig::default().validate().is_ok());
        let config = AnalyticsConfig {
            max_cache_entries: 0,
            ..AnalyticsConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_cache_entries"));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: AnalyticsConfig = serde_json::from_str(r#"{"top_tags": 3}"#).unwrap();
        assert_eq!(config.top_tags, 3);
        assert_eq!(config.cache_ttl_secs, 300);
    }
}
