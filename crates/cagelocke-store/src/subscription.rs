//! Change-watch registrations and their handles.

use cagelocke_core::RunId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback invoked when a watched run's roster changes.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

struct WatcherEntry {
    token: u64,
    run_id: RunId,
    callback: SharedCallback,
}

#[derive(Default)]
struct WatcherTable {
    next_token: u64,
    entries: Vec<WatcherEntry>,
}

/// The set of live watch registrations for one store.
///
/// There is no process-wide registry: each store instance owns its watchers,
/// and handles release straight back into the instance they came from.
#[derive(Default)]
pub(crate) struct Watchers {
    inner: Mutex<WatcherTable>,
}

impl Watchers {
    fn lock(&self) -> MutexGuard<'_, WatcherTable> {
        // A poisoned lock only means a callback panicked; the table itself
        // is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add(&self, run_id: RunId, callback: ChangeCallback) -> u64 {
        let mut table = self.lock();
        let token = table.next_token;
        table.next_token += 1;
        table.entries.push(WatcherEntry {
            token,
            run_id,
            callback: Arc::from(callback),
        });
        token
    }

    fn release(&self, token: u64) {
        self.lock().entries.retain(|entry| entry.token != token);
    }

    /// Invoke every callback watching the given run.
    ///
    /// Callbacks are cloned out before invocation so none of them runs
    /// under the table lock.
    pub(crate) fn notify(&self, run_id: &RunId) {
        let callbacks: Vec<SharedCallback> = {
            let table = self.lock();
            table
                .entries
                .iter()
                .filter(|entry| &entry.run_id == run_id)
                .map(|entry| entry.callback.clone())
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

/// Handle for an active watch registration.
///
/// Owned by the caller. [`Subscription::unsubscribe`] releases the
/// registration and is idempotent; dropping the handle releases it too.
pub struct Subscription {
    token: u64,
    watchers: Arc<Watchers>,
    released: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(watchers: Arc<Watchers>, run_id: RunId, callback: ChangeCallback) -> Self {
        let token = watchers.add(run_id, callback);
        Self {
            token,
            watchers,
            released: AtomicBool::new(false),
        }
    }

    /// Release the registration. Calling this twice is a no-op.
    pub fn unsubscribe(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.watchers.release(self.token);
        }
    }

    /// Whether the registration is still live.
    pub fn is_active(&self) -> bool {
        !self.released.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}
