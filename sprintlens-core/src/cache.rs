//! Report memoization cache.
//!
//! An optional layer sitting outside the Aggregator/Summarizer boundary:
//! a pure key→value store with explicit TTL, keyed by a content hash of
//! the aggregate. Entries are write-once / read-many (inserting over a
//! live entry is a no-op, an expired entry may be replaced) and a miss
//! always falls through to full recomputation.

use crate::types::AggregateMetrics;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Stable content signature of an aggregate, as a hex SHA-256 digest.
///
/// Two aggregates with identical numeric content produce identical keys;
/// the sprint maps are rendered in their (ascending) grouping order, so
/// the signature never depends on construction history.
pub fn aggregate_signature(metrics: &AggregateMetrics) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(format!("issues={}", metrics.issue_count));
    parts.push(format!("completed={}", metrics.completed_count));
    parts.push(format!("cycle_mean={:?}", metrics.cycle_time_mean_days));
    parts.push(format!("cycle_stdev={:?}", metrics.cycle_time_stdev_days));
    parts.push(format!("lead_mean={:?}", metrics.lead_time_mean_days));
    parts.push(format!("reopen={}", metrics.reopen_rate_pct));
    parts.push(format!("blocked_mean={:?}", metrics.blocked_days_mean));

    let throughput: Vec<String> = metrics
        .throughput_by_sprint
        .iter()
        .map(|(sprint, count)| format!("{}:{}", sprint, count))
        .collect();
    parts.push(format!("throughput={}", throughput.join(",")));

    let velocity: Vec<String> = metrics
        .velocity_by_sprint
        .iter()
        .map(|(sprint, points)| format!("{}:{}", sprint, points))
        .collect();
    parts.push(format!("velocity={}", velocity.join(",")));

    let digest = Sha256::digest(parts.join("|").as_bytes());
    hex::encode(digest)
}

struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

/// Write-once / read-many TTL store for rendered reports.
pub struct ReportCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.inserted_at.elapsed() >= self.ttl
    }

    /// Look up a memoized value. Expired entries read as misses.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value.as_str())
    }

    /// Memoize a value under `key`.
    ///
    /// Returns `false` (leaving the stored value untouched) when a live
    /// entry already exists; an expired entry is replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key) {
            if !self.is_expired(existing) {
                return false;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value: value.into(),
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
