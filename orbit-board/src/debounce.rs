//! Debounced saves.
//!
//! A [`Debouncer`] holds at most one pending value per key. Scheduling a
//! key again replaces (or merges into) the pending value and restarts its
//! quiet period. When the period elapses the save callback runs with the
//! latest value. [`EditSession`] scopes the edits of one key and flushes
//! them when the session ends.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type SaveFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type SaveFn<K, V> = Arc<dyn Fn(K, V) -> SaveFuture + Send + Sync>;
type MergeFn<V> = Arc<dyn Fn(&mut V, V) + Send + Sync>;

struct Pending<V> {
    value: V,
    generation: u64,
    timer: JoinHandle<()>,
}

struct Inner<K, V> {
    delay: Duration,
    save: SaveFn<K, V>,
    merge: Option<MergeFn<V>>,
    pending: Mutex<HashMap<K, Pending<V>>>,
    generation: AtomicU64,
}

impl<K, V> Inner<K, V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Pending<V>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Per-key debounce of an async save.
///
/// Cloning shares the pending set. Scheduling needs a running tokio
/// runtime.
pub struct Debouncer<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for Debouncer<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Creates a debouncer that calls `save` once a key has been quiet for
    /// `delay`.
    pub fn new<F, Fut>(delay: Duration, save: F) -> Self
    where
        F: Fn(K, V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let save: SaveFn<K, V> = Arc::new(move |key: K, value: V| -> SaveFuture {
            Box::pin(save(key, value))
        });
        Self::from_parts(delay, save, None)
    }

    /// Merges a newly scheduled value into the pending one instead of
    /// replacing it. Must be set before anything is scheduled.
    #[must_use]
    pub fn with_merge(self, merge: impl Fn(&mut V, V) + Send + Sync + 'static) -> Self {
        Self::from_parts(
            self.inner.delay,
            Arc::clone(&self.inner.save),
            Some(Arc::new(merge)),
        )
    }

    fn from_parts(delay: Duration, save: SaveFn<K, V>, merge: Option<MergeFn<V>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                save,
                merge,
                pending: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedules `value` for `key`, cancelling the key's running timer.
    pub fn schedule(&self, key: K, value: V) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = self.inner.lock();

        let value = match pending.remove(&key) {
            Some(previous) => {
                previous.timer.abort();
                match &self.inner.merge {
                    Some(merge) => {
                        let mut merged = previous.value;
                        merge(&mut merged, value);
                        merged
                    }
                    None => value,
                }
            }
            None => value,
        };

        let timer = tokio::spawn(fire_after_delay(
            Arc::clone(&self.inner),
            key.clone(),
            generation,
        ));
        pending.insert(
            key,
            Pending {
                value,
                generation,
                timer,
            },
        );
    }

    /// Saves the pending value of `key` now. Returns whether there was one.
    pub async fn flush(&self, key: &K) -> bool {
        let taken = self.inner.lock().remove(key);
        let Some(entry) = taken else {
            return false;
        };
        entry.timer.abort();
        (self.inner.save)(key.clone(), entry.value).await;
        true
    }

    /// Saves every pending value now. Returns how many were saved.
    pub async fn flush_all(&self) -> usize {
        let drained: Vec<(K, Pending<V>)> = self.inner.lock().drain().collect();
        let count = drained.len();
        for (key, entry) in drained {
            entry.timer.abort();
            (self.inner.save)(key, entry.value).await;
        }
        if count > 0 {
            debug!("Flushed {count} pending saves");
        }
        count
    }

    /// Forgets the pending value of `key` without saving it.
    pub fn cancel(&self, key: &K) -> bool {
        let taken = self.inner.lock().remove(key);
        match taken {
            Some(entry) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Opens an editing session for `key`.
    pub fn session(&self, key: K) -> EditSession<K, V> {
        EditSession {
            debouncer: self.clone(),
            key,
            open: true,
        }
    }
}

async fn fire_after_delay<K, V>(inner: Arc<Inner<K, V>>, key: K, generation: u64)
where
    K: Eq + Hash,
{
    tokio::time::sleep(inner.delay).await;
    let value = {
        let mut pending = inner.lock();
        match pending.get(&key) {
            Some(entry) if entry.generation == generation => {
                pending.remove(&key).map(|entry| entry.value)
            }
            _ => None,
        }
    };
    if let Some(value) = value {
        (inner.save)(key, value).await;
    }
}

/// The edits of one key. Ending the session flushes whatever is still
/// pending.
///
/// Only [`finish`](Self::finish) waits for that save. Dropping the session
/// hands the flush to a detached task on the current runtime, which is lost
/// if the runtime shuts down before it runs, and outside a runtime the
/// pending value is discarded.
pub struct EditSession<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    debouncer: Debouncer<K, V>,
    key: K,
    open: bool,
}

impl<K, V> EditSession<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Schedules a new value for the session's key.
    pub fn edit(&self, value: V) {
        self.debouncer.schedule(self.key.clone(), value);
    }

    /// Ends the session and waits for the pending save, if any. When this
    /// returns the save has completed.
    pub async fn finish(mut self) -> bool {
        self.open = false;
        self.debouncer.flush(&self.key).await
    }
}

impl<K, V> Drop for EditSession<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    fn drop(&mut self) {
        if !self.open || !self.debouncer.is_pending(&self.key) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let debouncer = self.debouncer.clone();
                let key = self.key.clone();
                handle.spawn(async move {
                    debouncer.flush(&key).await;
                });
            }
            Err(_) => warn!("Edit session dropped outside a runtime; pending save lost"),
        }
    }
}
