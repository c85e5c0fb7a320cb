//! Read-through cache in front of the filter and aggregation stages.
//!
//! Entries are keyed by folder id and the canonical filter serialization.
//! Each key owns a slot behind its own mutex: the first caller computes the
//! report while holding the slot, and callers arriving meanwhile block on it
//! and then reuse the stored report. Unrelated keys only share dashmap shards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use folderlens_core::{
    ActivityItem, AnalyticsConfig, AnalyticsFilter, Clock, FolderId, FolderItem, FolderStatistics,
    SystemClock,
};

use crate::aggregate::StatisticsCalculator;

/// Cache key: folder plus canonical filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub folder_id: FolderId,
    pub filter: String,
}

impl CacheKey {
    /// Build the key for a folder and filter.
    pub fn new(folder_id: &FolderId, filter: &AnalyticsFilter) -> Self {
        Self {
            folder_id: folder_id.clone(),
            filter: filter.cache_key(),
        }
    }
}

/// A stored report and when it was computed.
#[derive(Debug, Clone)]
struct CacheEntry {
    report: Arc<FolderStatistics>,
    computed_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::TimeDelta) -> bool {
        now - self.computed_at < ttl
    }
}

/// Slot is `None` until the first computation for the key finishes.
type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// A slot only the map references. Callers clone slots out under the shard
/// lock, so this holds for as long as that lock is held.
fn is_unclaimed(slot: &Slot) -> bool {
    Arc::strong_count(slot) == 1
}

/// Counters describing cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times the aggregation stage ran.
    pub computations: u64,
    pub evictions: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    evictions: AtomicU64,
}

/// Bounded, time-expiring cache of folder statistics.
pub struct StatisticsCache {
    calculator: StatisticsCalculator,
    clock: Arc<dyn Clock>,
    entries: DashMap<CacheKey, Slot>,
    counters: Counters,
}

impl StatisticsCache {
    /// Create a cache with default config and the system clock.
    pub fn new() -> Self {
        Self::with_clock(AnalyticsConfig::default(), Arc::new(SystemClock))
    }

    /// Create a cache with custom config and the system clock.
    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with custom config and clock.
    pub fn with_clock(config: AnalyticsConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            calculator: StatisticsCalculator::with_config(config),
            clock,
            entries: DashMap::new(),
            counters: Counters::default(),
        }
    }

    fn config(&self) -> &AnalyticsConfig {
        self.calculator.config()
    }

    /// Return the statistics for a folder, computing them on a miss.
    ///
    /// A report younger than the freshness window is returned as-is (the same
    /// `Arc`), without looking at the inputs. Otherwise the inputs are filtered
    /// and aggregated and the result replaces the entry.
    pub fn get_folder_statistics(
        &self,
        folder_id: &FolderId,
        activities: &[ActivityItem],
        subfolders: &[FolderItem],
        filter: &AnalyticsFilter,
    ) -> Arc<FolderStatistics> {
        let key = CacheKey::new(folder_id, filter);
        // Clone the slot out so the shard lock is released before we block on it.
        let slot: Slot = self.entries.entry(key).or_default().clone();

        let report = {
            let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
            let now = self.clock.now();
            let ttl = self.config().cache_ttl();

            if let Some(entry) = guard.as_ref().filter(|e| e.is_fresh(now, ttl)) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(folder = %folder_id, "Statistics cache hit");
                return Arc::clone(&entry.report);
            }

            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(folder = %folder_id, expired = guard.is_some(), "Statistics cache miss");

            let report = Arc::new(self.calculator.analyze(activities, subfolders, filter, now));
            self.counters.computations.fetch_add(1, Ordering::Relaxed);
            *guard = Some(CacheEntry {
                report: Arc::clone(&report),
                computed_at: now,
            });
            report
        };

        self.enforce_capacity();
        report
    }

    /// Evict the oldest computed entries while over capacity.
    ///
    /// Slots that a caller is holding or computing into are never evicted.
    fn enforce_capacity(&self) {
        let max = self.config().max_cache_entries;
        while self.entries.len() > max {
            let oldest = self
                .entries
                .iter()
                .filter(|item| is_unclaimed(item.value()))
                .filter_map(|item| match item.value().try_lock() {
                    Ok(guard) => guard
                        .as_ref()
                        .map(|entry| (item.key().clone(), entry.computed_at)),
                    Err(_) => None,
                })
                .min_by_key(|(_, computed_at)| *computed_at);

            let Some((key, _)) = oldest else {
                break;
            };
            // Claimed between the scan and now: leave the bound to the next insert.
            if self.entries.remove_if(&key, |_, slot| is_unclaimed(slot)).is_none() {
                break;
            }
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            info!(folder = %key.folder_id, "Evicted statistics cache entry");
        }
    }

    /// Drop every entry older than the freshness window. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config().cache_ttl();
        let before = self.entries.len();

        self.entries.retain(|_, slot| {
            if !is_unclaimed(slot) {
                return true;
            }
            match slot.try_lock() {
                Ok(guard) => guard.as_ref().is_some_and(|e| e.is_fresh(now, ttl)),
                Err(TryLockError::WouldBlock) => true,
                Err(TryLockError::Poisoned(_)) => false,
            }
        });

        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            self.counters
                .evictions
                .fetch_add(purged as u64, Ordering::Relaxed);
            info!(purged, "Purged expired statistics cache entries");
        }
        purged
    }

    /// Drop every entry for a folder, whatever the filter.
    pub fn invalidate_folder(&self, folder_id: &FolderId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.folder_id != folder_id);
        before.saturating_sub(self.entries.len())
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries, including ones being computed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            computations: self.counters.computations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl Default for StatisticsCache {
    fn default() -> Self {
        Self::new()
    }
}
