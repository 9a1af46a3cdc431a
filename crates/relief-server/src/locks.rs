//! Per-entity async locks.
//!
//! Mutations on the same entity id queue behind one another here, before
//! they reach the database. Entries are removed once nobody holds or waits
//! on them, so the map only ever contains entities with work in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct EntityLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds `key`, then holds it until the
    /// returned guard is dropped.
    pub async fn lock(&self, key: String) -> EntityGuard {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.clone().lock_owned().await;
        EntityGuard {
            key,
            lock,
            guard: Some(guard),
            registry: self.clone(),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub struct EntityGuard {
    key: String,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    registry: EntityLocks,
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self
            .registry
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // Only the map and this guard reference the lock: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.key);
        }
    }
}
