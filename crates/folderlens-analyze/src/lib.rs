//! Analysis algorithms for folderlens.
//!
//! This crate turns a folder's activities and subfolders into a
//! [`FolderStatistics`] report:
//!
//! - **Filter stage** - Narrow items by date, level, type, tags, collaborators and size
//! - **Aggregation stage** - Counts, distributions, learning/usage/collaboration roll-ups,
//!   tag frequencies, daily trends and a composite health score
//! - **Cache** - Time-expiring, bounded report cache with one computation per key
//! - **Rollup** - Per-level statistics across a whole folder subtree
//! - **Export** - JSON and flat CSV output
//!
//! # Statistics
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use folderlens_analyze::{AnalyticsFilter, StatisticsCalculator};
//!
//! let calculator = StatisticsCalculator::new();
//! let filter = AnalyticsFilter::builder().tag("grammar").build()?;
//! let report = calculator.analyze(&activities, &subfolders, &filter, Utc::now());
//!
//! println!("{} activities, health {:.0}", report.basic.total_activities, report.health.overall_health);
//! ```
//!
//! # Caching
//!
//! ```rust,ignore
//! use folderlens_analyze::{AnalyticsConfig, StatisticsCache};
//!
//! let cache = StatisticsCache::with_config(AnalyticsConfig::default());
//! let report = cache.get_folder_statistics(&folder_id, &activities, &subfolders, &filter);
//! ```

mod aggregate;
mod cache;
mod export;
pub mod filter;
pub mod health;
mod rollup;
pub mod trends;

pub use aggregate::{
    StatisticsCalculator, basic_statistics, collaboration_statistics, distributions,
    learning_statistics, tag_statistics, time_statistics, usage_statistics,
};
pub use cache::{CacheKey, CacheStats, StatisticsCache};
pub use export::{ExportFormat, export, export_csv, export_json};
pub use filter::{apply_filter, apply_folder_filter};
pub use rollup::{FolderRollup, rollup};

// Re-export core types
pub use folderlens_core::{
    ActivityItem, AnalyticsConfig, AnalyticsError, AnalyticsFilter, FolderId, FolderItem,
    FolderSnapshot, FolderStatistics,
};
