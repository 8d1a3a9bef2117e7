//! Keyed debounce scheduling
//!
//! [`Debouncer::schedule`] is a replace-or-schedule primitive: any task still
//! pending for the key is aborted and a new one is armed, so each key has at
//! most one live timer.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Per-key delayed task runner
#[derive(Debug)]
pub struct Debouncer<K>
where
    K: Eq + Hash,
{
    slots: Arc<DashMap<K, Slot>>,
    generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create debouncer with no pending tasks
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `task` after `delay`, replacing any task pending for `key`
    ///
    /// Outside a tokio runtime there is no timer to arm: any pending task for
    /// `key` is cancelled, `task` is dropped and `false` is returned.
    pub fn schedule<F>(&self, key: K, delay: Duration, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            self.cancel(&key);
            return false;
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let slots = Arc::clone(&self.slots);
        let slot_key = key.clone();

        // The shard stays locked until the new slot is in place, so a timer
        // that fires immediately cannot miss its own slot.
        match self.slots.entry(key) {
            Entry::Occupied(mut occupied) => {
                let handle = spawn_timer(&runtime, slots, slot_key, generation, delay, task);
                let previous = occupied.insert(Slot { generation, handle });
                previous.handle.abort();
            }
            Entry::Vacant(vacant) => {
                let handle = spawn_timer(&runtime, slots, slot_key, generation, delay, task);
                vacant.insert(Slot { generation, handle });
            }
        }
        true
    }

    /// Abort the task pending for `key`; returns whether one was pending
    pub fn cancel(&self, key: &K) -> bool {
        match self.slots.remove(key) {
            Some((_, slot)) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending task; returns how many were aborted
    pub fn cancel_all(&self) -> usize {
        let keys = self.keys();
        keys.iter().filter(|key| self.cancel(key)).count()
    }

    /// Check if a task is pending for `key`
    #[inline]
    #[must_use]
    pub fn is_scheduled(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of pending tasks
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.len()
    }

    /// Keys with a pending task
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_timer<K, F>(
    runtime: &Handle,
    slots: Arc<DashMap<K, Slot>>,
    key: K,
    generation: u64,
    delay: Duration,
    task: F,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    F: FnOnce() + Send + 'static,
{
    runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        // A newer schedule or a cancel owns the slot if the generation moved on.
        if slots
            .remove_if(&key, |_, slot| slot.generation == generation)
            .is_some()
        {
            task();
        }
    })
}
