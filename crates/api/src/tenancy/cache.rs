//! In-memory tenant cache with TTL
//!
//! Caches code-to-team lookups to reduce database queries on every request.
//! Both hits and misses are cached; misses expire sooner so a newly
//! registered team becomes reachable quickly even without invalidation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use teamhub_shared::Team;
use uuid::Uuid;

use super::resolver::TenantCode;

/// Default TTL for found teams (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default TTL for codes with no team (30 seconds)
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(30);

/// Default upper bound on cached codes
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Cache entry with expiration
#[derive(Clone)]
struct CacheEntry {
    team: Option<Team>,
    expires_at: Instant,
    /// Insertion sequence number, matched against `CacheInner::order`
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Entries plus their insertion order.
///
/// `order` may hold stale keys (overwritten or invalidated entries); a key
/// is live only while its sequence number matches the entry's.
#[derive(Default)]
struct CacheInner {
    entries: HashMap<TenantCode, CacheEntry>,
    order: VecDeque<(TenantCode, u64)>,
    next_seq: u64,
}

impl CacheInner {
    fn is_live(&self, code: &TenantCode, seq: u64) -> bool {
        self.entries.get(code).map(|e| e.seq) == Some(seq)
    }

    /// Drop the oldest live entry
    fn evict_oldest(&mut self) {
        while let Some((code, seq)) = self.order.pop_front() {
            if self.is_live(&code, seq) {
                self.entries.remove(&code);
                return;
            }
        }
    }

    /// Forget stale keys in `order`
    fn compact(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(code, seq)| entries.get(code).map(|e| e.seq) == Some(*seq));
    }
}

/// Thread-safe, bounded tenant cache
///
/// When full, the oldest inserted entry is evicted.
pub struct TenantCache {
    /// Maps team code -> team (None means no active team owns the code)
    inner: RwLock<CacheInner>,
    ttl: Duration,
    negative_ttl: Duration,
    max_entries: usize,
    /// Bumped by every invalidation, under the write lock
    generation: AtomicU64,
}

impl Default for TenantCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantCache {
    /// Create a new cache with default TTLs and capacity
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CACHE_TTL, DEFAULT_NEGATIVE_TTL, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new cache with custom TTLs and capacity
    pub fn with_limits(ttl: Duration, negative_ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            ttl,
            negative_ttl,
            max_entries: max_entries.max(1),
            generation: AtomicU64::new(0),
        }
    }

    /// Get the cached team for a code
    /// Returns Some(Some(team)) if found and valid
    /// Returns Some(None) if the code was cached as not resolving
    /// Returns None if not in cache or expired
    pub fn get(&self, code: &TenantCode) -> Option<Option<Team>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let entry = inner.entries.get(code)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.team.clone())
        }
    }

    /// Cache a code -> team mapping
    pub fn set(&self, code: &TenantCode, team: Option<Team>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        self.insert(&mut inner, code, team);
    }

    /// Current invalidation generation. Read it before querying storage and
    /// hand it to [`TenantCache::set_if_unchanged`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Cache a mapping only if no invalidation happened since `generation`
    /// was read. Keeps a lookup that raced with a rename or delete from
    /// re-inserting the stale team. Returns whether the entry was stored.
    pub fn set_if_unchanged(&self, code: &TenantCode, team: Option<Team>, generation: u64) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        self.insert(&mut inner, code, team)
    }

    fn insert(&self, inner: &mut CacheInner, code: &TenantCode, team: Option<Team>) -> bool {
        // A team stored under another code would be served to the wrong tenant
        if let Some(t) = &team {
            if t.code != code.as_str() {
                tracing::warn!(code = %code, team_code = %t.code, "Refusing to cache team under mismatched code");
                return false;
            }
        }

        let ttl = if team.is_some() {
            self.ttl
        } else {
            self.negative_ttl
        };

        if inner.entries.len() >= self.max_entries && !inner.entries.contains_key(code) {
            inner.evict_oldest();
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            code.clone(),
            CacheEntry {
                team,
                expires_at: Instant::now() + ttl,
                seq,
            },
        );
        inner.order.push_back((code.clone(), seq));

        // Stale keys pile up on overwrite and invalidation
        if inner.order.len() > 2 * self.max_entries {
            inner.compact();
        }
        true
    }

    /// Invalidate a specific code
    pub fn invalidate(&self, code: &TenantCode) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        inner.entries.remove(code);
    }

    /// Invalidate all entries for a team (useful when its settings change)
    pub fn invalidate_team(&self, team_id: Uuid) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        inner
            .entries
            .retain(|_, entry| entry.team.as_ref().map(|t| t.id) != Some(team_id));
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        inner.entries.clear();
        inner.order.clear();
    }

    /// Clear expired entries (call periodically for memory management)
    pub fn cleanup(&self) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        inner.compact();
        before - inner.entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let total = inner.entries.len();
        let expired = inner.entries.values().filter(|e| e.is_expired()).count();
        let negative = inner
            .entries
            .values()
            .filter(|e| !e.is_expired() && e.team.is_none())
            .count();
        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
            negative_entries: negative,
            max_entries: self.max_entries,
        }
    }
}

/// Cache statistics
#[derive(Default, Debug, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub negative_entries: usize,
    pub max_entries: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use time::OffsetDateTime;

    fn code(s: &str) -> TenantCode {
        TenantCode::parse(s).unwrap()
    }

    fn team(code: &str) -> Team {
        let now = OffsetDateTime::now_utc();
        Team {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_uppercase(),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cache_get_set() {
        let cache = TenantCache::new();
        let lions = team("lions");

        // Initially empty
        assert!(cache.get(&code("lions")).is_none());

        cache.set(&code("lions"), Some(lions.clone()));
        assert_eq!(cache.get(&code("lions")), Some(Some(lions)));
    }

    #[test]
    fn test_cache_negative() {
        let cache = TenantCache::new();

        cache.set(&code("ghosts"), None);
        assert_eq!(cache.get(&code("ghosts")), Some(None));
        assert_eq!(cache.stats().negative_entries, 1);
    }

    #[test]
    fn test_cache_refuses_mismatched_code() {
        let cache = TenantCache::new();

        cache.set(&code("lions"), Some(team("tigers")));
        assert!(cache.get(&code("lions")).is_none());
    }

    #[test]
    fn test_cache_expiration() {
        let cache = TenantCache::with_limits(
            Duration::from_millis(50),
            Duration::from_millis(50),
            DEFAULT_MAX_ENTRIES,
        );

        cache.set(&code("lions"), Some(team("lions")));
        assert!(cache.get(&code("lions")).is_some());

        // Wait for expiration
        sleep(Duration::from_millis(60));
        assert!(cache.get(&code("lions")).is_none());
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_negative_entries_expire_sooner() {
        let cache = TenantCache::with_limits(
            Duration::from_secs(60),
            Duration::from_millis(20),
            DEFAULT_MAX_ENTRIES,
        );

        cache.set(&code("lions"), Some(team("lions")));
        cache.set(&code("ghosts"), None);

        sleep(Duration::from_millis(30));
        assert!(cache.get(&code("lions")).is_some());
        assert!(cache.get(&code("ghosts")).is_none());
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = TenantCache::new();

        cache.set(&code("lions"), Some(team("lions")));
        cache.invalidate(&code("lions"));
        assert!(cache.get(&code("lions")).is_none());
    }

    #[test]
    fn test_cache_invalidate_team() {
        let cache = TenantCache::new();
        let lions = team("lions");
        let tigers = team("tigers");

        cache.set(&code("lions"), Some(lions.clone()));
        cache.set(&code("tigers"), Some(tigers.clone()));
        cache.set(&code("ghosts"), None);

        cache.invalidate_team(lions.id);

        assert!(cache.get(&code("lions")).is_none());
        assert_eq!(cache.get(&code("tigers")), Some(Some(tigers)));
        assert_eq!(cache.get(&code("ghosts")), Some(None));
    }

    #[test]
    fn test_cache_is_bounded() {
        let cache = TenantCache::with_limits(Duration::from_secs(60), Duration::from_secs(60), 2);

        cache.set(&code("a"), None);
        sleep(Duration::from_millis(2));
        cache.set(&code("b"), None);
        sleep(Duration::from_millis(2));
        cache.set(&code("c"), None);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        // Oldest entry is evicted first
        assert!(cache.get(&code("a")).is_none());
        assert!(cache.get(&code("b")).is_some());
        assert!(cache.get(&code("c")).is_some());
    }

    #[test]
    fn test_overwrite_moves_entry_to_back() {
        let cache = TenantCache::with_limits(Duration::from_secs(60), Duration::from_secs(60), 2);

        cache.set(&code("a"), None);
        cache.set(&code("b"), None);
        cache.set(&code("a"), None);
        cache.set(&code("c"), None);

        assert!(cache.get(&code("a")).is_some());
        assert!(cache.get(&code("b")).is_none());
        assert!(cache.get(&code("c")).is_some());
    }

    #[test]
    fn test_eviction_skips_invalidated_entries() {
        let cache = TenantCache::with_limits(Duration::from_secs(60), Duration::from_secs(60), 2);

        cache.set(&code("a"), None);
        cache.set(&code("b"), None);
        cache.invalidate(&code("a"));
        cache.set(&code("c"), None);
        cache.set(&code("d"), None);

        assert_eq!(cache.stats().total_entries, 2);
        assert!(cache.get(&code("b")).is_none());
        assert!(cache.get(&code("c")).is_some());
        assert!(cache.get(&code("d")).is_some());
    }

    #[test]
    fn test_insertion_order_stays_bounded() {
        let cache = TenantCache::with_limits(Duration::from_secs(60), Duration::from_secs(60), 4);

        for i in 0..1_000 {
            cache.set(&code(&format!("team-{}", i % 3)), None);
            cache.set(&code(&format!("miss-{}", i)), None);
        }

        let inner = cache.inner.read().unwrap();
        assert_eq!(inner.entries.len(), 4);
        assert!(inner.order.len() <= 2 * 4);
    }

    #[test]
    fn test_set_if_unchanged_rejects_stale_lookup() {
        let cache = TenantCache::new();

        let seen = cache.generation();
        // A rename lands while the lookup is in flight
        cache.invalidate(&code("lions"));
        assert!(!cache.set_if_unchanged(&code("lions"), Some(team("lions")), seen));
        assert!(cache.get(&code("lions")).is_none());

        let seen = cache.generation();
        assert!(cache.set_if_unchanged(&code("lions"), Some(team("lions")), seen));
        assert!(cache.get(&code("lions")).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = TenantCache::new();

        cache.set(&code("lions"), Some(team("lions")));
        cache.set(&code("ghosts"), None);
        cache.clear();
        assert_eq!(cache.stats().total_entries, 0);
    }
}
