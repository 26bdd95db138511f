//! Response memoization for retransmitted requests
//!
//! Clients retry requests that got no answer, so the same `(sender, request
//! id)` may arrive several times. The first response is kept for the TTL and
//! replayed verbatim instead of running the handler again.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Identifies one request of one sender
///
/// The sender's address is hashed to 64 bits and XORed with the request id;
/// the raw request id is kept alongside so two ids of the same sender can
/// never share a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey {
    hash: u64,
    request_id: u32,
}

impl CacheKey {
    pub fn new(request_id: u32, sender: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        sender.hash(&mut hasher);
        Self {
            hash: hasher.finish() ^ u64::from(request_id),
            request_id,
        }
    }
}

struct Entry {
    response: Vec<u8>,
    stored_at: Instant,
}

/// Bounded cache of responses with passive TTL expiry
pub struct ResponseCache {
    entries: DashMap<CacheKey, Entry>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Get the cached response for `key`; expired entries are dropped here.
    pub fn lookup(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.response.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        }
        None
    }

    /// Remember `response` for `key`.
    ///
    /// At capacity, expired entries are swept first; if none expired, the
    /// oldest entry is evicted.
    pub fn store(&self, key: CacheKey, response: Vec<u8>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.entries
                .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
            if self.entries.len() >= self.capacity {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.stored_at)
                    .map(|entry| *entry.key());
                if let Some(oldest) = oldest {
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(
            key,
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
