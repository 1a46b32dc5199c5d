//! Per-resource write serialization.

use crate::{Resource, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async mutexes keyed by resource.
///
/// A lock exists only while someone holds or waits for it; the map keeps weak
/// references and drops dead ones on every acquire. Writers of different
/// resources never contend.
#[derive(Default)]
pub struct ResourceLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `resource`.
    pub async fn acquire(&self, resource: &Resource) -> StorageResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(resource.key()).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(resource.key().to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        Ok(lock.lock_owned().await)
    }

    /// Number of resources currently locked or awaited.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.values().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_resource_is_exclusive() {
        let locks = Arc::new(ResourceLocks::new());
        let resource = Resource::file("/a");

        let guard = locks.acquire(&resource).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            let resource = resource.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&resource).await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_resources_do_not_contend() {
        let locks = ResourceLocks::new();
        let _a = locks.acquire(&Resource::file("/a")).await.unwrap();
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&Resource::file("/b")),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_idle_locks_are_discarded() {
        let locks = ResourceLocks::new();
        {
            let _guard = locks.acquire(&Resource::file("/a")).await.unwrap();
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);

        let _guard = locks.acquire(&Resource::file("/b")).await.unwrap();
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
    }
}
