//! Monotonic request tickets so only the newest response for a piece of
//! state is applied.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct Fence {
    issued: AtomicU64,
}

impl Fence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket; every earlier ticket stops being current.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued ticket, without issuing a new one.
    pub fn current(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.current() == ticket
    }
}

/// A fence per key, e.g. one per receipt id.
#[derive(Debug)]
pub struct KeyedFence<K> {
    counter: AtomicU64,
    latest: Mutex<HashMap<K, u64>>,
}

impl<K: Eq + Hash> Default for KeyedFence<K> {
    fn default() -> Self {
        Self {
            counter: AtomicU64::new(0),
            latest: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> KeyedFence<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: K) -> u64 {
        let ticket = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, ticket);
        ticket
    }

    pub fn is_current(&self, key: &K, ticket: u64) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|&latest| latest == ticket)
    }

    /// Forget the ticket for `key` once its last request has settled.
    pub fn settle(&self, key: &K, ticket: u64) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.get(key) == Some(&ticket) {
            latest.remove(key);
        }
    }
}
