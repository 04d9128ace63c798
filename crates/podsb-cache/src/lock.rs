//! # Single-Flight Lock Registry
//!
//! Per-key mutual exclusion for fetch runs. Each [`CanonicalAssetId`] gets its
//! own async mutex, created on first use; distinct ids never share a lock.
//!
//! Entries are reference counted. Every acquirer (holder or waiter) holds a
//! lease on the entry and the entry is removed when the last lease is
//! dropped, so the registry only ever contains keys with a request in flight.
//! A waiter whose future is dropped before it gets the lock gives up its
//! lease too.
//!
//! The slot also remembers how the last fetch under it failed. Requests that
//! queued behind a failing run read that failure instead of starting the tool
//! again; once the slot is gone the next request starts fresh.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use podsb_core::CanonicalAssetId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::fetch::FetchError;

/// State shared by everyone queued on one key.
#[derive(Debug, Default)]
pub struct SlotState {
    failure: Option<FetchError>,
}

struct Slot {
    lock: Arc<AsyncMutex<SlotState>>,
    holders: usize,
}

type Slots = Arc<Mutex<HashMap<CanonicalAssetId, Slot>>>;

/// Process-wide registry of per-key locks.
#[derive(Clone, Default)]
pub struct LockRegistry {
    slots: Slots,
}

impl std::fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    ///
    /// Never blocks on other keys. The returned [`KeyLock`] releases on drop.
    pub async fn acquire(&self, id: &CanonicalAssetId) -> KeyLock {
        let (lease, lock) = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id.clone()).or_insert_with(|| Slot {
                lock: Arc::new(AsyncMutex::new(SlotState::default())),
                holders: 0,
            });
            slot.holders += 1;
            let lease = Lease {
                slots: Arc::clone(&self.slots),
                id: id.clone(),
            };
            (lease, Arc::clone(&slot.lock))
        };
        // `lease` is dropped if this future is cancelled while waiting.
        let guard = lock.lock_owned().await;
        KeyLock {
            guard,
            lease,
        }
    }

    /// Number of keys with at least one holder or waiter.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` currently has a holder or waiter.
    pub fn contains(&self, id: &CanonicalAssetId) -> bool {
        self.slots.lock().contains_key(id)
    }
}

/// Registration of one acquirer on a slot.
struct Lease {
    slots: Slots,
    id: CanonicalAssetId,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        let remove = match slots.get_mut(&self.id) {
            Some(slot) => {
                slot.holders = slot.holders.saturating_sub(1);
                slot.holders == 0
            }
            None => false,
        };
        if remove {
            slots.remove(&self.id);
        }
    }
}

/// Exclusive hold on one key.
pub struct KeyLock {
    // Field order matters: the guard is released before the lease.
    guard: OwnedMutexGuard<SlotState>,
    lease: Lease,
}

impl std::fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLock")
            .field("id", &self.lease.id)
            .field("failure", &self.guard.failure)
            .finish()
    }
}

impl KeyLock {
    pub fn id(&self) -> &CanonicalAssetId {
        &self.lease.id
    }

    /// Failure recorded by an earlier holder of this slot, if any.
    pub fn failure(&self) -> Option<&FetchError> {
        self.guard.failure.as_ref()
    }

    /// Record a failure for holders that are still queued.
    pub fn record_failure(&mut self, error: FetchError) {
        self.guard.failure = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn id(s: &str) -> CanonicalAssetId {
        CanonicalAssetId::new(s).unwrap()
    }

    #[tokio::test]
    async fn entry_removed_after_release() {
        let registry = LockRegistry::new();
        let key = id("abc123XYZ");
        {
            let lock = registry.acquire(&key).await;
            assert_eq!(lock.id(), &key);
            assert!(registry.contains(&key));
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let registry = LockRegistry::new();
        let key = id("abc123XYZ");
        let held = registry.acquire(&key).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), registry.acquire(&key)).await;
        assert!(blocked.is_err(), "second acquire must wait");

        drop(held);
        let again = tokio::time::timeout(Duration::from_secs(1), registry.acquire(&key)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let registry = LockRegistry::new();
        let _a = registry.acquire(&id("aaaaa11111")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(200),
            registry.acquire(&id("bbbbb22222")),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn cancelled_waiter_releases_its_lease() {
        let registry = LockRegistry::new();
        let key = id("abc123XYZ");
        let held = registry.acquire(&key).await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), registry.acquire(&key)).await;
        assert!(timed_out.is_err());
        assert_eq!(registry.len(), 1);

        drop(held);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failure_visible_to_queued_waiter_only() {
        let registry = LockRegistry::new();
        let key = id("abc123XYZ");
        let mut first = registry.acquire(&key).await;

        let waiter = {
            let registry = registry.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let lock = registry.acquire(&key).await;
                lock.failure().cloned()
            })
        };
        // Let the waiter register.
        while registry.slots.lock().get(&key).map(|s| s.holders) != Some(2) {
            tokio::task::yield_now().await;
        }

        let failure = FetchError::ToolFailed {
            status: "exit status: 1".into(),
            stderr: "boom".into(),
        };
        first.record_failure(failure.clone());
        drop(first);

        assert_eq!(waiter.await.unwrap(), Some(failure));
        assert!(registry.is_empty());

        let fresh = registry.acquire(&key).await;
        assert!(fresh.failure().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn at_most_one_holder_per_key() {
        let registry = LockRegistry::new();
        let key = id("abc123XYZ");
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let key = key.clone();
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            tasks.spawn(async move {
                let _lock = registry.acquire(&key).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }
}
