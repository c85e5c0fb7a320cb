//! Core types and traits for folderlens.
//!
//! This crate provides the fundamental data structures used throughout
//! the folderlens ecosystem: content items, filters, configuration,
//! the statistics report, and the clock abstraction.

mod clock;
mod config;
mod error;
mod filter;
mod folder;
mod item;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnalyticsConfig, AnalyticsConfigBuilder};
pub use error::{AnalyticsError, ValidationError, ViolationKind};
pub use filter::{AnalyticsFilter, AnalyticsFilterBuilder, DateRange, SortDirection, SortKey};
pub use folder::{FolderId, FolderItem, FolderPermissions, FolderSnapshot, ShareSettings};
pub use item::{
    ActivityId, ActivityItem, CollaborationData, GeptLevel, LearningData, ShareType, UsageStats,
};
pub use stats::{
    ActivityRef, BasicStatistics, CollaborationStatistics, CreationTrendPoint, Distributions,
    FolderStatistics, GeptDistribution, HealthMetrics, LearningStatistics, LearningTrendPoint,
    TagCount, TagStatistics, TimeStatistics, TrendData, TrendSource, UsageStatistics,
    UsageTrendPoint,
};
