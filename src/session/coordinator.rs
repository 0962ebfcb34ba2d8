//! State coordination for the portal session
//!
//! The portal tracks one server-side navigation state per session, so at most
//! one state-changing operation may be in flight at a time, while any number
//! of state-preserving reads may run concurrently with each other. The
//! coordinator provides:
//! - An exclusive lock with FIFO ordering and a priority entry used by login
//! - A reference-counted "stable state" read section that internally holds
//!   the exclusive lock as a placeholder while readers are active
//! - A forceful acquisition used by logout that cancels every queued waiter
//!
//! Queue state lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; suspended waiters are woken through `tokio::sync::oneshot`
//! channels. Dropping a waiter's sender wakes it with a cancellation, so a
//! cancelled caller always observes [`WatchError::LockCancelled`] instead of
//! hanging.

use crate::{Result, WatchError};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Identifies the current exclusive holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockToken(u64);

#[derive(Default)]
struct Inner {
    /// Current exclusive holder, if any. Also set while the stable-state
    /// placeholder is held.
    holder: Option<LockToken>,

    /// Set when `holder` is the placeholder taken on behalf of active
    /// stable-state readers rather than a real exclusive operation.
    stable_hold: Option<LockToken>,

    /// Number of active stable-state readers.
    stable_count: usize,

    next_token: u64,

    /// Suspended exclusive waiters in grant order.
    exclusive_queue: VecDeque<oneshot::Sender<LockToken>>,

    /// Suspended stable-state waiters; admitted as a batch once the
    /// exclusive lock clears.
    stable_queue: Vec<oneshot::Sender<()>>,
}

impl Inner {
    fn mint(&mut self) -> LockToken {
        self.next_token += 1;
        LockToken(self.next_token)
    }

    /// Hands the freed lock to the next exclusive waiter, or admits all
    /// queued stable-state waiters when no exclusive waiter is left.
    fn grant_next(&mut self) {
        while let Some(waiter) = self.exclusive_queue.pop_front() {
            let token = self.mint();
            if waiter.send(token).is_ok() {
                self.holder = Some(token);
                return;
            }
        }

        if !self.stable_queue.is_empty() {
            let mut admitted = 0;
            for waiter in self.stable_queue.drain(..) {
                if waiter.send(()).is_ok() {
                    admitted += 1;
                }
            }
            if admitted > 0 {
                let token = self.mint();
                self.holder = Some(token);
                self.stable_hold = Some(token);
                self.stable_count = admitted;
            }
        }
    }
}

/// Coordinates exclusive (state-changing) and stable (state-preserving)
/// access to the session's server-side navigation state.
#[derive(Default)]
pub struct StateCoordinator {
    inner: Mutex<Inner>,
}

/// Holds the exclusive state lock; released exactly once on drop.
pub struct ExclusiveGuard<'a> {
    coordinator: &'a StateCoordinator,
    token: LockToken,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.release(self.token);
    }
}

/// Holds one stable-state (read) slot; released exactly once on drop.
pub struct StableGuard<'a> {
    coordinator: &'a StateCoordinator,
}

impl Drop for StableGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.release_stable();
    }
}

impl StateCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the exclusive lock, suspending FIFO behind earlier waiters.
    ///
    /// Fails with [`WatchError::LockCancelled`] if the wait is cancelled by a
    /// forceful acquisition.
    pub async fn acquire(&self) -> Result<ExclusiveGuard<'_>> {
        self.acquire_at(QueuePosition::Back).await
    }

    /// Acquires the exclusive lock ahead of every queued waiter.
    ///
    /// Used only by login, which must not wait behind queued navigation.
    pub async fn acquire_priority(&self) -> Result<ExclusiveGuard<'_>> {
        self.acquire_at(QueuePosition::Front).await
    }

    async fn acquire_at(&self, position: QueuePosition) -> Result<ExclusiveGuard<'_>> {
        let receiver = {
            let mut inner = self.inner.lock().unwrap();
            if inner.holder.is_none() {
                let token = inner.mint();
                inner.holder = Some(token);
                return Ok(ExclusiveGuard {
                    coordinator: self,
                    token,
                });
            }
            let (tx, rx) = oneshot::channel();
            match position {
                QueuePosition::Back => inner.exclusive_queue.push_back(tx),
                QueuePosition::Front => inner.exclusive_queue.push_front(tx),
            }
            rx
        };

        let token = receiver.await.map_err(|_| WatchError::LockCancelled)?;
        Ok(ExclusiveGuard {
            coordinator: self,
            token,
        })
    }

    /// Enters the stable-state section, suspending while a state-changing
    /// holder is active. Readers already inside admit new readers directly.
    pub async fn retain_stable(&self) -> Result<StableGuard<'_>> {
        let receiver = {
            let mut inner = self.inner.lock().unwrap();
            if inner.stable_hold.is_some() {
                inner.stable_count += 1;
                return Ok(StableGuard { coordinator: self });
            }
            if inner.holder.is_none() {
                let token = inner.mint();
                inner.holder = Some(token);
                inner.stable_hold = Some(token);
                inner.stable_count = 1;
                return Ok(StableGuard { coordinator: self });
            }
            let (tx, rx) = oneshot::channel();
            inner.stable_queue.push(tx);
            rx
        };

        receiver.await.map_err(|_| WatchError::LockCancelled)?;
        Ok(StableGuard { coordinator: self })
    }

    /// Cancels every queued waiter, then takes the exclusive lock itself,
    /// waiting only for the currently active holder. Used only by logout,
    /// which must proceed even when other operations are queued; every
    /// cancelled waiter observes [`WatchError::LockCancelled`].
    pub async fn force_acquire(&self) -> Result<ExclusiveGuard<'_>> {
        let receiver = {
            let mut inner = self.inner.lock().unwrap();
            // Dropping the senders wakes all queued waiters with a failure.
            inner.exclusive_queue.clear();
            inner.stable_queue.clear();
            if inner.holder.is_none() {
                let token = inner.mint();
                inner.holder = Some(token);
                return Ok(ExclusiveGuard {
                    coordinator: self,
                    token,
                });
            }
            let (tx, rx) = oneshot::channel();
            inner.exclusive_queue.push_front(tx);
            rx
        };

        let token = receiver.await.map_err(|_| WatchError::LockCancelled)?;
        Ok(ExclusiveGuard {
            coordinator: self,
            token,
        })
    }

    fn release(&self, token: LockToken) {
        let mut inner = self.inner.lock().unwrap();
        if inner.holder != Some(token) {
            return;
        }
        inner.holder = None;
        inner.stable_hold = None;
        inner.grant_next();
    }

    fn release_stable(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.stable_count == 0 {
            return;
        }
        inner.stable_count -= 1;
        if inner.stable_count == 0 {
            if let Some(token) = inner.stable_hold.take() {
                if inner.holder == Some(token) {
                    inner.holder = None;
                    inner.grant_next();
                }
            }
        }
    }

    #[cfg(test)]
    fn queued_waiters(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.exclusive_queue.len(), inner.stable_queue.len())
    }
}

enum QueuePosition {
    Back,
    Front,
}
