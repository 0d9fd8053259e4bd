// ABOUTME: In-memory response cache keyed by normalized request, target set, and strategy.
// ABOUTME: Entries are immutable snapshots with a per-entry TTL and lazy expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;

use super::types::{DispatchStrategy, OrchestrationResult};

/// Storage behind the orchestrator's response cache.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<OrchestrationResult>>;
    /// Insert or wholesale-replace an entry.
    fn put(&self, key: String, entry: Arc<OrchestrationResult>, ttl: Duration);
    /// Number of live (unexpired) entries.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Lowercase, trim and collapse whitespace so trivially different spellings
/// of the same request share an entry.
pub fn normalize_request(request: &str) -> String {
    request
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable hex-encoded SHA-256 over (normalized request, targets, strategy).
pub fn cache_key(request: &str, targets: &[String], strategy: DispatchStrategy) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_request(request).as_bytes());
    hasher.update([0u8]);
    for target in targets {
        hasher.update(target.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(strategy.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

struct CacheEntry {
    value: Arc<OrchestrationResult>,
    expires_at: Instant,
}

/// Mutex-guarded map; safe for concurrent readers and writers.
pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResponseCache for InMemoryResponseCache {
    fn get(&self, key: &str) -> Option<Arc<OrchestrationResult>> {
        let mut entries = self.lock();
        let now = Instant::now();
        let lookup = entries
            .get(key)
            .map(|entry| (entry.expires_at > now, entry.value.clone()));
        match lookup {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.remove(key);
                log::debug!("[Cache] Entry {} expired", key.get(..12).unwrap_or(key));
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, entry: Arc<OrchestrationResult>, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.lock().insert(
            key,
            CacheEntry {
                value: entry,
                expires_at,
            },
        );
    }

    fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| e.expires_at > now).count()
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("[Cache] Purged {} expired entries", removed);
        }
        removed
    }
}
