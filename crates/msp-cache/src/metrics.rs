//! Metrics hooks for identity caching and alias ingestion
//!
//! Cached providers and the alias registry report through the
//! [`MetricsRecorder`] trait. [`Metrics`] keeps in-process atomic counters;
//! `msp-telemetry` provides a Prometheus-backed recorder.
//!
//! ## Usage
//!
//! ```ignore
//! use msp_cache::metrics::{CacheKind, Metrics, MetricsRecorder};
//!
//! let metrics = Metrics::new();
//! metrics.record_lookup(CacheKind::ValidateIdentity, true);
//! assert_eq!(metrics.snapshot().hits(CacheKind::ValidateIdentity), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The three caches owned by a cached provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    DeserializeIdentity,
    ValidateIdentity,
    SatisfiesPrincipal,
}

impl CacheKind {
    pub const ALL: [CacheKind; 3] = [
        CacheKind::DeserializeIdentity,
        CacheKind::ValidateIdentity,
        CacheKind::SatisfiesPrincipal,
    ];

    /// Label used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKind::DeserializeIdentity => "deserialize_identity",
            CacheKind::ValidateIdentity => "validate_identity",
            CacheKind::SatisfiesPrincipal => "satisfies_principal",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// What the alias consumer did with one position record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// First alias for this identity
    Inserted,
    /// Existing alias replaced (overwrite policy)
    Replaced,
    /// Identity already aliased, record ignored (insert-if-absent policy)
    Skipped,
}

impl CommitOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitOutcome::Inserted => "inserted",
            CommitOutcome::Replaced => "replaced",
            CommitOutcome::Skipped => "skipped",
        }
    }
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// like Prometheus or StatsD.
pub trait MetricsRecorder: Send + Sync {
    /// One cache lookup and whether it hit.
    fn record_lookup(&self, kind: CacheKind, hit: bool);

    /// One entry evicted to make room.
    fn record_eviction(&self, kind: CacheKind);

    /// All caches of a provider discarded by `setup`.
    fn record_cache_reset(&self);

    /// A position record accepted by the ingestion channel after `waited`.
    fn record_position_submitted(&self, waited: Duration);

    /// A position record processed by the consumer.
    fn record_position_committed(&self, outcome: CommitOutcome);

    /// Registry maps cleared.
    fn record_registry_cleared(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_lookup(&self, _: CacheKind, _: bool) {}
    fn record_eviction(&self, _: CacheKind) {}
    fn record_cache_reset(&self) {}
    fn record_position_submitted(&self, _: Duration) {}
    fn record_position_committed(&self, _: CommitOutcome) {}
    fn record_registry_cleared(&self) {}
}

/// Atomic counters for cache and alias activity.
#[derive(Default)]
pub struct Metrics {
    hits: [AtomicU64; 3],
    misses: [AtomicU64; 3],
    evictions: [AtomicU64; 3],
    cache_resets: AtomicU64,
    positions_submitted: AtomicU64,
    submit_wait_ns: AtomicU64,
    aliases_inserted: AtomicU64,
    aliases_replaced: AtomicU64,
    aliases_skipped: AtomicU64,
    registry_clears: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counters: &[AtomicU64; 3]| {
            [
                counters[0].load(Ordering::Relaxed),
                counters[1].load(Ordering::Relaxed),
                counters[2].load(Ordering::Relaxed),
            ]
        };
        MetricsSnapshot {
            hits: load(&self.hits),
            misses: load(&self.misses),
            evictions: load(&self.evictions),
            cache_resets: self.cache_resets.load(Ordering::Relaxed),
            positions_submitted: self.positions_submitted.load(Ordering::Relaxed),
            avg_submit_wait_ns: self.avg_submit_wait_ns(),
            aliases_inserted: self.aliases_inserted.load(Ordering::Relaxed),
            aliases_replaced: self.aliases_replaced.load(Ordering::Relaxed),
            aliases_skipped: self.aliases_skipped.load(Ordering::Relaxed),
            registry_clears: self.registry_clears.load(Ordering::Relaxed),
        }
    }

    /// Average time submitters spent waiting for channel capacity.
    pub fn avg_submit_wait_ns(&self) -> u64 {
        let total = self.submit_wait_ns.load(Ordering::Relaxed);
        let count = self.positions_submitted.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }
}

impl MetricsRecorder for Metrics {
    fn record_lookup(&self, kind: CacheKind, hit: bool) {
        let counters = if hit { &self.hits } else { &self.misses };
        counters[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self, kind: CacheKind) {
        self.evictions[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_reset(&self) {
        self.cache_resets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_position_submitted(&self, waited: Duration) {
        self.positions_submitted.fetch_add(1, Ordering::Relaxed);
        self.submit_wait_ns
            .fetch_add(waited.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_position_committed(&self, outcome: CommitOutcome) {
        let counter = match outcome {
            CommitOutcome::Inserted => &self.aliases_inserted,
            CommitOutcome::Replaced => &self.aliases_replaced,
            CommitOutcome::Skipped => &self.aliases_skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_registry_cleared(&self) {
        self.registry_clears.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    hits: [u64; 3],
    misses: [u64; 3],
    evictions: [u64; 3],
    pub cache_resets: u64,
    pub positions_submitted: u64,
    pub avg_submit_wait_ns: u64,
    pub aliases_inserted: u64,
    pub aliases_replaced: u64,
    pub aliases_skipped: u64,
    pub registry_clears: u64,
}

impl MetricsSnapshot {
    pub fn hits(&self, kind: CacheKind) -> u64 {
        self.hits[kind.slot()]
    }

    pub fn misses(&self, kind: CacheKind) -> u64 {
        self.misses[kind.slot()]
    }

    pub fn evictions(&self, kind: CacheKind) -> u64 {
        self.evictions[kind.slot()]
    }

    /// Fraction of lookups served from `kind`'s cache.
    pub fn hit_rate(&self, kind: CacheKind) -> f64 {
        let hits = self.hits(kind);
        let total = hits + self.misses(kind);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }
}
