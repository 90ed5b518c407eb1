//! Request coalescing ("singleflight").
//!
//! Concurrent calls for the same key share one execution of the work and
//! all observe its result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::Result;

type InFlight<T> = Arc<OnceCell<Result<T>>>;

/// Suppresses duplicate concurrent work per key.
///
/// At most one in-flight record exists per key; it is dropped as soon as the
/// work completes, so a later call starts a fresh execution.
#[derive(Debug)]
pub struct RequestCoalescer<T> {
    calls: Mutex<HashMap<String, InFlight<T>>>,
}

impl<T> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> RequestCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` unless a call for `key` is already in flight, in which
    /// case this waits for that call and returns a clone of its result.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cell = {
            let mut calls = self.calls.lock();
            calls.entry(key.to_string()).or_default().clone()
        };

        let result = cell.get_or_init(work).await.clone();

        let mut calls = self.calls.lock();
        if calls
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            calls.remove(key);
        }
        result
    }

    /// Number of keys with work in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
