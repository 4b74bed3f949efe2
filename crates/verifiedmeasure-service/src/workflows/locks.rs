//! Per-user claim serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use verifiedmeasure_core::UserId;

/// Keyed async locks, one per user.
///
/// Holding a user's guard keeps every other claim by that user in this process
/// waiting, which closes the window between the balance read and the ledger
/// write. Other processes are not covered.
#[derive(Debug, Clone, Default)]
pub struct ClaimLocks {
    locks: Arc<Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ClaimLocks {
    /// Wait for and take the claim lock of `user_id`.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            // Drop entries nobody holds or waits on so the map stays bounded.
            locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of users with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .map_or(0, |locks| locks.len())
    }

    /// Whether no lock entry is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_waits() {
        let locks = ClaimLocks::default();
        let user = UserId::generate();

        let guard = locks.acquire(user).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(user)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(user)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = ClaimLocks::default();
        let _alice = locks.acquire(UserId::generate()).await;
        let bob = tokio::time::timeout(Duration::from_millis(50), locks.acquire(UserId::generate())).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = ClaimLocks::default();
        for _ in 0..10 {
            drop(locks.acquire(UserId::generate()).await);
        }
        let _held = locks.acquire(UserId::generate()).await;
        assert_eq!(locks.len(), 1);
    }
}
