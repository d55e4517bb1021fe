use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use sqlx::PgPool;

use crate::config::{leaderboard_cache_ttl, leaderboard_max_limit};

/// Pre-serialized leaderboard body for one `limit`.
#[derive(Debug, Clone)]
pub struct CachedLeaderboard {
    pub body: Bytes,
    pub cached_at: Instant,
}

#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL pool. None if DATABASE_URL is not set.
    pub db: Option<PgPool>,
    pub leaderboard_cache: Arc<DashMap<u32, CachedLeaderboard>>,
    /// Bumped by every invalidation; bodies read under an older value are not cached.
    pub leaderboard_generation: Arc<AtomicU64>,
    pub leaderboard_cache_ttl: Duration,
    pub leaderboard_max_limit: u32,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    visit_reads_total: AtomicU64,
    visit_writes_total: AtomicU64,
    visit_write_failures_total: AtomicU64,
    profile_writes_total: AtomicU64,
    leaderboard_requests_total: AtomicU64,
    leaderboard_cache_hits_total: AtomicU64,
    leaderboard_cache_misses_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub visit_reads_total: u64,
    pub visit_writes_total: u64,
    pub visit_write_failures_total: u64,
    pub profile_writes_total: u64,
    pub leaderboard_requests_total: u64,
    pub leaderboard_cache_hits_total: u64,
    pub leaderboard_cache_misses_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            visit_reads_total: self.visit_reads_total.load(Ordering::Relaxed),
            visit_writes_total: self.visit_writes_total.load(Ordering::Relaxed),
            visit_write_failures_total: self.visit_write_failures_total.load(Ordering::Relaxed),
            profile_writes_total: self.profile_writes_total.load(Ordering::Relaxed),
            leaderboard_requests_total: self.leaderboard_requests_total.load(Ordering::Relaxed),
            leaderboard_cache_hits_total: self
                .leaderboard_cache_hits_total
                .load(Ordering::Relaxed),
            leaderboard_cache_misses_total: self
                .leaderboard_cache_misses_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_visit_read(&self) {
        self.visit_reads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_visit_write(&self) {
        self.visit_writes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_visit_write_failure(&self) {
        self.visit_write_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_write(&self) {
        self.profile_writes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaderboard_request(&self) {
        self.leaderboard_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaderboard_cache_hit(&self) {
        self.leaderboard_cache_hits_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaderboard_cache_miss(&self) {
        self.leaderboard_cache_misses_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(db: Option<PgPool>) -> Self {
        Self {
            db,
            leaderboard_cache: Arc::new(DashMap::new()),
            leaderboard_generation: Arc::new(AtomicU64::new(0)),
            leaderboard_cache_ttl: leaderboard_cache_ttl(),
            leaderboard_max_limit: leaderboard_max_limit(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    /// Fresh cached body for `limit`, if any. Expired entries are dropped.
    pub fn cached_leaderboard(&self, limit: u32) -> Option<Bytes> {
        self.cached_leaderboard_at(limit, Instant::now())
    }

    fn cached_leaderboard_at(&self, limit: u32, now: Instant) -> Option<Bytes> {
        if self.leaderboard_cache_ttl.is_zero() {
            return None;
        }
        let fresh = {
            let entry = self.leaderboard_cache.get(&limit)?;
            (now.saturating_duration_since(entry.cached_at) < self.leaderboard_cache_ttl)
                .then(|| entry.body.clone())
        };
        if fresh.is_none() {
            self.leaderboard_cache.remove(&limit);
        }
        fresh
    }

    /// Read before querying storage and pass to [`AppState::store_leaderboard`].
    pub fn leaderboard_generation(&self) -> u64 {
        self.leaderboard_generation.load(Ordering::Acquire)
    }

    /// Cache `body` unless a write invalidated the cache after `generation`
    /// was read.
    pub fn store_leaderboard(&self, limit: u32, generation: u64, body: Bytes) {
        if self.leaderboard_cache_ttl.is_zero() {
            return;
        }
        let entry = self.leaderboard_cache.entry(limit);
        // Checked while holding the shard lock so a concurrent clear cannot
        // slip between the check and the insert.
        if self.leaderboard_generation() != generation {
            return;
        }
        entry.insert(CachedLeaderboard {
            body,
            cached_at: Instant::now(),
        });
    }

    pub fn invalidate_leaderboard(&self) {
        self.leaderboard_generation.fetch_add(1, Ordering::AcqRel);
        self.leaderboard_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_ttl(ttl: Duration) -> AppState {
        AppState {
            leaderboard_cache_ttl: ttl,
            ..AppState::new(None)
        }
    }

    #[test]
    fn counters_snapshot_reflects_records() {
        let counters = ObservabilityCounters::default();
        counters.record_visit_read();
        counters.record_visit_write();
        counters.record_visit_write();
        counters.record_visit_write_failure();
        counters.record_leaderboard_cache_hit();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.visit_reads_total, 1);
        assert_eq!(snapshot.visit_writes_total, 2);
        assert_eq!(snapshot.visit_write_failures_total, 1);
        assert_eq!(snapshot.leaderboard_cache_hits_total, 1);
        assert_eq!(snapshot.leaderboard_cache_misses_total, 0);
    }

    #[test]
    fn leaderboard_cache_is_keyed_by_limit() {
        let state = state_with_ttl(Duration::from_secs(30));
        state.store_leaderboard(10, 0, Bytes::from_static(b"[1]"));

        assert_eq!(state.cached_leaderboard(10), Some(Bytes::from_static(b"[1]")));
        assert_eq!(state.cached_leaderboard(5), None);
    }

    #[test]
    fn expired_leaderboard_entries_are_evicted() {
        let state = state_with_ttl(Duration::from_secs(30));
        state.store_leaderboard(10, 0, Bytes::from_static(b"[]"));

        let later = Instant::now() + Duration::from_secs(31);
        assert_eq!(state.cached_leaderboard_at(10, later), None);
        assert!(state.leaderboard_cache.is_empty());
    }

    #[test]
    fn invalidation_clears_every_limit() {
        let state = state_with_ttl(Duration::from_secs(30));
        state.store_leaderboard(10, 0, Bytes::from_static(b"[]"));
        state.store_leaderboard(20, 0, Bytes::from_static(b"[]"));

        state.invalidate_leaderboard();
        assert_eq!(state.cached_leaderboard(10), None);
        assert_eq!(state.cached_leaderboard(20), None);
    }

    #[test]
    fn body_read_before_invalidation_is_not_cached() {
        let state = state_with_ttl(Duration::from_secs(30));
        assert_eq!(state.cached_leaderboard(10), None);
        let generation = state.leaderboard_generation();

        // A write lands while the query is still running.
        state.invalidate_leaderboard();
        state.store_leaderboard(10, generation, Bytes::from_static(b"[\"before\"]"));

        assert_eq!(state.cached_leaderboard(10), None);

        let generation = state.leaderboard_generation();
        state.store_leaderboard(10, generation, Bytes::from_static(b"[\"after\"]"));
        assert_eq!(
            state.cached_leaderboard(10),
            Some(Bytes::from_static(b"[\"after\"]"))
        );
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let state = state_with_ttl(Duration::ZERO);
        state.store_leaderboard(10, 0, Bytes::from_static(b"[]"));
        assert!(state.leaderboard_cache.is_empty());
        assert_eq!(state.cached_leaderboard(10), None);
    }
}
