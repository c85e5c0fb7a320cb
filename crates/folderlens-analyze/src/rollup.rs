//! Recursive statistics over a folder subtree.
//!
//! Each level is analyzed on its own (its direct activities and direct
//! subfolders) and children are processed in parallel. Only the activity
//! count and size are summed over the whole subtree.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use folderlens_core::{AnalyticsFilter, FolderId, FolderSnapshot, FolderStatistics};

use crate::aggregate::StatisticsCalculator;
use crate::filter::folder_matches;

/// Statistics for one folder and, recursively, its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRollup {
    pub folder_id: FolderId,
    pub name: CompactString,
    /// Statistics for this level only.
    pub statistics: FolderStatistics,
    /// Children that passed the folder filter, in input order.
    pub children: Vec<FolderRollup>,
    /// Filtered activities in this folder and every descendant.
    pub recursive_activities: u64,
    /// Size in bytes of those activities.
    pub recursive_size: u64,
}

impl FolderRollup {
    /// Number of folders in this rollup, including this one.
    pub fn folder_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.folder_count()).sum::<usize>()
    }
}

/// Analyze a snapshot and all of its descendants.
///
/// Children rejected by the folder filter are not descended into, so
/// `include_subfolders = false` analyzes the root level only.
pub fn rollup(
    snapshot: &FolderSnapshot,
    filter: &AnalyticsFilter,
    calculator: &StatisticsCalculator,
    now: DateTime<Utc>,
) -> FolderRollup {
    let statistics = calculator.analyze(
        &snapshot.activities,
        &snapshot.subfolders(),
        filter,
        now,
    );

    let children: Vec<FolderRollup> = snapshot
        .children
        .par_iter()
        .filter(|child| folder_matches(&child.folder, filter))
        .map(|child| rollup(child, filter, calculator, now))
        .collect();

    let (child_activities, child_size) = children.iter().fold((0u64, 0u64), |(n, s), c| {
        (
            n.saturating_add(c.recursive_activities),
            s.saturating_add(c.recursive_size),
        )
    });

    debug!(
        folder = %snapshot.folder.id,
        children = children.len(),
        "Rolled up folder"
    );

    FolderRollup {
        folder_id: snapshot.folder.id.clone(),
        name: snapshot.folder.name.clone(),
        recursive_activities: statistics.basic.total_activities.saturating_add(child_activities),
        recursive_size: statistics.basic.total_size.saturating_add(child_size),
        statistics,
        children,
    }
}
