//! Per-scope reader/writer locks
//!
//! Persists hold the shared side; `clear` holds the exclusive side, so a
//! clear never interleaves with a persist of the same scope. Entries are
//! dropped by [`ScopeLocks::release`] once nobody holds or awaits them.

use salescribe_common::models::Scope;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: Mutex<HashMap<Scope, Arc<RwLock<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, scope: &Scope) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(scope.clone()).or_default())
    }

    pub async fn shared(&self, scope: &Scope) -> OwnedRwLockReadGuard<()> {
        self.lock_for(scope).await.read_owned().await
    }

    pub async fn exclusive(&self, scope: &Scope) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(scope).await.write_owned().await
    }

    /// Forget the lock of `scope` if no guard or waiter still refers to it
    pub async fn release(&self, scope: &Scope) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(scope)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(scope);
        }
    }

    /// Number of scopes with a lock entry
    pub async fn tracked_scopes(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exclusive_waits_for_shared() {
        let locks = Arc::new(ScopeLocks::new());
        let scope = Scope::parse("tenant-a").unwrap();

        let reader = locks.shared(&scope).await;
        let pending = {
            let locks = Arc::clone(&locks);
            let scope = scope.clone();
            tokio::spawn(async move {
                let _guard = locks.exclusive(&scope).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(reader);
        tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_scopes_do_not_block_each_other() {
        let locks = ScopeLocks::new();
        let a = Scope::parse("a").unwrap();
        let b = Scope::parse("b").unwrap();

        let _held = locks.exclusive(&a).await;
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.exclusive(&b)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_release_keeps_held_locks() {
        let locks = ScopeLocks::new();
        let a = Scope::parse("a").unwrap();
        let b = Scope::parse("b").unwrap();

        let held = locks.shared(&a).await;
        drop(locks.exclusive(&b).await);
        assert_eq!(locks.tracked_scopes().await, 2);

        locks.release(&a).await;
        locks.release(&b).await;
        assert_eq!(locks.tracked_scopes().await, 1);

        drop(held);
        locks.release(&a).await;
        assert_eq!(locks.tracked_scopes().await, 0);

        // Releasing an unknown scope is a no-op
        locks.release(&Scope::parse("c").unwrap()).await;
        assert_eq!(locks.tracked_scopes().await, 0);
    }
}
