//! Per-package write serialization.
//!
//! Publishing is a read-modify-write of the package's metadata document. Two
//! unsynchronized publishes of the same package would both read the old
//! document and the slower save would drop the other's version. Holding the
//! package's lock across load, merge and save rules that out. Locks for
//! different packages are independent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct PackageLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PackageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `package`. Access is released when the
    /// guard is dropped.
    pub async fn acquire(&self, package: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on
            locks.retain(|name, lock| name == package || Arc::strong_count(lock) > 1);
            locks
                .entry(package.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of packages with a live lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_package_is_exclusive() {
        let locks = Arc::new(PackageLocks::new());
        let guard = locks.acquire("demo").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("demo").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_packages_do_not_contend() {
        let locks = PackageLocks::new();
        let _a = locks.acquire("alpha").await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.acquire("beta"))
            .await
            .expect("independent package lock should be immediately available");
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = PackageLocks::new();
        for name in ["a", "b", "c"] {
            let _guard = locks.acquire(name).await;
        }
        let _guard = locks.acquire("d").await;
        assert_eq!(locks.len().await, 1);
    }
}
