//! Per-item async locks
//!
//! Operations on the same item name are serialized; different names proceed
//! concurrently. Idle locks are dropped from the table the next time a lock
//! is taken.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of async mutexes keyed by item name
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`
    pub async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|key, lock| key == name || Arc::strong_count(lock) > 1);
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of names with a live lock entry
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
