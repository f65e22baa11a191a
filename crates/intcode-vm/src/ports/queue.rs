//! Thread-safe FIFO port for wiring machines together.

use super::{CancelToken, Cancelled, InputPort, OutputPort};
use crate::machine::Word;
use crate::VmError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Default interval a blocking [`QueuePort`] read sleeps for between
/// rechecking its predicates. Strictly positive, as required by the
/// cancellation contract (§5 concurrency model).
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(2);

struct Inner {
    queue: Mutex<VecDeque<Word>>,
    not_empty: Condvar,
    starving: AtomicBool,
    polling_interval: Duration,
}

/// A FIFO shared between a producer and a consumer thread.
///
/// `write` enqueues and returns immediately. `read` dequeues if the queue is
/// non-empty; otherwise it marks the port "starving", waits on the
/// not-empty condition in slices of `polling_interval`, and re-checks the
/// cancel token on every wake. Cloning a `QueuePort` shares the same
/// underlying queue — this is how one machine's output port becomes
/// another's input port.
#[derive(Clone)]
pub struct QueuePort {
    inner: Arc<Inner>,
}

impl QueuePort {
    /// Create an empty queue port with the default polling interval.
    #[must_use]
    pub fn new(initial: Vec<Word>) -> Self {
        Self::with_polling_interval(initial, DEFAULT_POLLING_INTERVAL)
    }

    /// Create a queue port with an explicit polling interval. `interval`
    /// must be strictly positive.
    #[must_use]
    pub fn with_polling_interval(initial: Vec<Word>, interval: Duration) -> Self {
        debug_assert!(interval > Duration::ZERO, "polling interval must be positive");
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(initial.into()),
                not_empty: Condvar::new(),
                starving: AtomicBool::new(false),
                polling_interval: interval,
            }),
        }
    }

    /// Whether the last read attempt found the queue empty.
    #[must_use]
    pub fn is_starving(&self) -> bool {
        self.inner.starving.load(Ordering::SeqCst)
    }

    /// Block until the port is starving, polling at the configured interval.
    /// Used by interactive clients that wait for a remote-control program to
    /// finish consuming the current batch of commands before feeding more.
    pub fn wait_until_starving(&self, cancel: &CancelToken) -> Result<(), Cancelled> {
        loop {
            if self.is_starving() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            std::thread::sleep(self.inner.polling_interval);
        }
    }

    /// Atomically dequeue up to `n` words, blocking until that many are
    /// available (or cancellation fires).
    ///
    /// # Errors
    ///
    /// Never returns a [`VmError`]; the error variant exists to satisfy the
    /// `InputPort`-shaped return type used elsewhere in this crate.
    pub fn read_n(&self, n: usize, cancel: &CancelToken) -> Result<Result<Vec<Word>, Cancelled>, VmError> {
        let mut guard = self.inner.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            if guard.len() >= n {
                self.inner.starving.store(false, Ordering::SeqCst);
                return Ok(Ok(guard.drain(..n).collect()));
            }
            self.inner.starving.store(true, Ordering::SeqCst);
            if cancel.is_cancelled() {
                return Ok(Err(Cancelled));
            }
            let (g, _timeout) = self
                .inner
                .not_empty
                .wait_timeout(guard, self.inner.polling_interval)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard = g;
        }
    }

    /// Atomically enqueue every word in `words`, waking any waiting reader
    /// once. No interleaving with another `write_all`/`write` call is
    /// observable.
    ///
    /// # Errors
    ///
    /// Never returns a [`VmError`]; kept for symmetry with `read_n`.
    pub fn write_all(&self, words: &[Word], _cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        let mut guard = self.inner.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.extend(words.iter().copied());
        self.inner.starving.store(false, Ordering::SeqCst);
        self.inner.not_empty.notify_all();
        Ok(Ok(()))
    }
}

impl InputPort for QueuePort {
    fn read(&self, cancel: &CancelToken) -> Result<Result<Word, Cancelled>, VmError> {
        Ok(self.read_n(1, cancel)?.map(|mut words| words.remove(0)))
    }
}

impl OutputPort for QueuePort {
    fn write(&self, value: Word, cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        self.write_all(&[value], cancel)
    }
}
