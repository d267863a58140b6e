//! Named worker threads with failure propagation.
//!
//! A worker that returns an error or panics closes every queue it was
//! registered with, so peers blocked on those queues wake up and the
//! coordinator can report the failure instead of waiting forever.

use crate::queue::BoundedQueue;
use crate::{Error, Result};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Something a failing worker must shut down.
pub trait Closable: Send + Sync {
    fn close(&self);
}

impl<T: Send> Closable for BoundedQueue<T> {
    fn close(&self) {
        BoundedQueue::close(self);
    }
}

/// Cooperative cancellation flag checked by coordinators between puts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct FailureGuard {
    queues: Vec<Arc<dyn Closable>>,
    armed: bool,
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        if self.armed {
            for queue in &self.queues {
                queue.close();
            }
        }
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panicked".to_string()
    }
}

/// A fixed set of threads playing one role in a pipeline.
pub struct WorkerPool<R> {
    role: &'static str,
    handles: Vec<JoinHandle<Result<R>>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawns `count` threads running `work(index)`.
    pub fn spawn<F>(
        role: &'static str,
        count: usize,
        queues: Vec<Arc<dyn Closable>>,
        work: F,
    ) -> Result<Self>
    where
        F: Fn(usize) -> Result<R> + Send + Sync + 'static,
    {
        Self::spawn_with(role, vec![(); count], queues, move |index, ()| work(index))
    }

    /// Spawns one thread per input, handing each its own input.
    pub fn spawn_with<I, F>(
        role: &'static str,
        inputs: Vec<I>,
        queues: Vec<Arc<dyn Closable>>,
        work: F,
    ) -> Result<Self>
    where
        I: Send + 'static,
        F: Fn(usize, I) -> Result<R> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let mut handles = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            let work = work.clone();
            let thread_queues = queues.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", role, index))
                .spawn(move || {
                    let mut guard = FailureGuard {
                        queues: thread_queues,
                        armed: true,
                    };
                    let outcome = work(index, input);
                    if outcome.is_ok() {
                        guard.armed = false;
                    }
                    outcome
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for queue in &queues {
                        queue.close();
                    }
                    return Err(Error::Io(e));
                }
            }
        }

        debug!("Started {} {} threads", handles.len(), role);
        Ok(Self { role, handles })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every thread. Returns per-thread results in spawn order, or
    /// the root failure: a worker's own error or panic is preferred over the
    /// queue-closed errors it caused in its peers.
    pub fn join(self) -> Result<Vec<R>> {
        let mut results = Vec::with_capacity(self.handles.len());
        let mut root: Option<Error> = None;
        let mut secondary: Option<Error> = None;

        for (index, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(value)) => results.push(value),
                Ok(Err(Error::QueueClosed)) => {
                    secondary.get_or_insert(Error::WorkerFailed {
                        role: self.role,
                        index,
                        reason: Error::QueueClosed.to_string(),
                    });
                }
                Ok(Err(e)) => {
                    error!("{} {} failed: {}", self.role, index, e);
                    root.get_or_insert(Error::WorkerFailed {
                        role: self.role,
                        index,
                        reason: e.to_string(),
                    });
                }
                Err(payload) => {
                    let reason = panic_reason(payload);
                    error!("{} {} panicked: {}", self.role, index, reason);
                    root.get_or_insert(Error::WorkerFailed {
                        role: self.role,
                        index,
                        reason,
                    });
                }
            }
        }

        match root.or(secondary) {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}

/// Picks the error to report when several pool stages failed: the first
/// failure that is not merely a consequence of a closed queue.
pub fn root_cause(failures: Vec<Error>) -> Option<Error> {
    let is_secondary = |e: &Error| {
        matches!(e, Error::QueueClosed)
            || matches!(e, Error::WorkerFailed { reason, .. } if *reason == Error::QueueClosed.to_string())
    };
    let mut fallback = None;
    for failure in failures {
        if !is_secondary(&failure) {
            return Some(failure);
        }
        fallback.get_or_insert(failure);
    }
    fallback
}
