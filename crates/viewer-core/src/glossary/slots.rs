use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::{Error, Result, lock};

pub(crate) type SharedFetch<T> = Shared<BoxFuture<'static, std::result::Result<Arc<T>, Arc<Error>>>>;

enum Slot<T> {
    Pending { generation: u64, fetch: SharedFetch<T> },
    Ready(Arc<T>),
}

pub(crate) enum Claim<T> {
    Ready(Arc<T>),
    Wait {
        generation: u64,
        fetch: SharedFetch<T>,
        leader: bool,
    },
    Declined,
}

/// Memoized fetches with at most one request in flight per key. Concurrent
/// callers share the pending future; a failed fetch leaves the key empty.
pub(crate) struct Slots<K, T> {
    inner: Mutex<HashMap<K, Slot<T>>>,
    generation: AtomicU64,
}

impl<K, T> Slots<K, T>
where
    K: Hash + Eq + Clone,
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ready(&self, key: &K) -> Option<Arc<T>> {
        match lock(&self.inner).get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// `start` runs only when the key is neither ready nor in flight, and may
    /// decline to issue a request by returning `None`.
    pub fn claim<F, Fut>(&self, key: &K, start: F) -> Claim<T>
    where
        F: FnOnce() -> Option<Fut>,
        Fut: std::future::Future<Output = Result<T>> + Send + 'static,
    {
        let mut slots = lock(&self.inner);
        match slots.get(key) {
            Some(Slot::Ready(value)) => Claim::Ready(value.clone()),
            Some(Slot::Pending { generation, fetch }) => Claim::Wait {
                generation: *generation,
                fetch: fetch.clone(),
                leader: false,
            },
            None => {
                let Some(fut) = start() else {
                    return Claim::Declined;
                };
                let fetch = fut
                    .map(|result| result.map(Arc::new).map_err(Arc::new))
                    .boxed()
                    .shared();
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                slots.insert(
                    key.clone(),
                    Slot::Pending {
                        generation,
                        fetch: fetch.clone(),
                    },
                );
                Claim::Wait {
                    generation,
                    fetch,
                    leader: true,
                }
            }
        }
    }

    /// Stores the outcome of the fetch identified by `generation`. A newer
    /// fetch for the same key is left untouched.
    pub fn settle(&self, key: &K, generation: u64, result: &std::result::Result<Arc<T>, Arc<Error>>) {
        let mut slots = lock(&self.inner);
        let owns_slot = matches!(
            slots.get(key),
            Some(Slot::Pending { generation: g, .. }) if *g == generation
        );
        if !owns_slot {
            return;
        }
        match result {
            Ok(value) => {
                slots.insert(key.clone(), Slot::Ready(value.clone()));
            }
            Err(_) => {
                slots.remove(key);
            }
        }
    }
}
