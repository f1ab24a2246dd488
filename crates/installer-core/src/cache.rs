//! In-memory cache of successful resolutions.
//!
//! Entries expire lazily: a lookup ignores anything older than the TTL and
//! nothing is evicted in the background. A TTL of zero disables the cache.
//!
//! Concurrent misses on one key are collapsed: the first caller takes a
//! per-key gate and resolves, the others wait on the gate and then find the
//! fresh entry. The map locks are only held for map access, never across
//! the resolution itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use installer_schema::{LATEST, Query, Resolution};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Stable key over the query fields that affect resolution.
///
/// An empty release is keyed as [`LATEST`], which it resolves to.
pub fn cache_key(query: &Query) -> String {
    let release = if query.release.is_empty() {
        LATEST
    } else {
        query.release.as_str()
    };
    // `Value` objects keep their keys sorted, so this is canonical.
    let canonical = serde_json::json!({
        "owner": query.owner,
        "program": query.program,
        "release": release,
        "select": query.select,
    });
    hex::encode(Sha256::digest(canonical.to_string().as_bytes()))
}

#[derive(Debug)]
struct Entry {
    inserted: Instant,
    resolution: Resolution,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Successful resolutions keyed by [`cache_key`], each fresh for one TTL.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
    gates: Mutex<HashMap<String, Gate>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResultCache {
    /// An empty cache; a zero `ttl` turns it into a no-op.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// How long an entry stays fresh.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// A fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Resolution> {
        if !self.enabled() {
            return None;
        }
        let entries = lock(&self.entries);
        let entry = entries.get(key)?;
        (entry.inserted.elapsed() < self.ttl).then(|| entry.resolution.clone())
    }

    /// Store `resolution` under `key`, replacing any older entry.
    pub fn insert(&self, key: &str, resolution: Resolution) {
        if !self.enabled() {
            return;
        }
        lock(&self.entries).insert(
            key.to_string(),
            Entry {
                inserted: Instant::now(),
                resolution,
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gate(&self, key: &str) -> Gate {
        Arc::clone(lock(&self.gates).entry(key.to_string()).or_default())
    }

    fn release_gate(&self, key: &str, gate: Gate) {
        let mut gates = lock(&self.gates);
        drop(gate);
        // Clones are only made under this lock, so a count of one means
        // nobody is waiting.
        if gates.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(key);
        }
    }

    /// Return the cached resolution for `key`, or run `resolve` and cache
    /// its success. At most one `resolve` runs per key at a time.
    ///
    /// # Errors
    ///
    /// Whatever `resolve` returns. Errors are not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        resolve: F,
    ) -> Result<Resolution, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Resolution, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        let gate = self.gate(key);
        let result = {
            let _held = gate.lock().await;
            match self.get(key) {
                Some(hit) => {
                    debug!(%key, "cache filled while waiting");
                    Ok(hit)
                }
                None => {
                    let result = resolve().await;
                    if let Ok(resolution) = &result {
                        self.insert(key, resolution.clone());
                    }
                    result
                }
            }
        };
        self.release_gate(key, gate);
        result
    }
}
