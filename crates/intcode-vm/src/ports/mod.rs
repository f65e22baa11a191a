//! Port traits: the read-one-word / write-one-word contracts a [`crate::Machine`]
//! talks through, and the concrete port implementations.
//!
//! A port mediates between a machine and whatever supplies or consumes its
//! words — another machine, a terminal, a fixed script, or a peer-to-peer
//! switch. All blocking port implementations in this module observe a
//! [`CancelToken`] at least once per polling interval, so a cancelled machine
//! unblocks promptly instead of hanging forever on an empty queue.

mod ascii;
mod prompt;
mod queue;
mod scripted;
mod tape;

pub use ascii::{AsciiScriptedPort, AsciiViewPort};
pub use prompt::{DisplayPort, PromptPort};
pub use queue::{QueuePort, DEFAULT_POLLING_INTERVAL};
pub use scripted::ScriptedPort;
pub use tape::TapePort;

use crate::machine::Word;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marker returned when a blocking port operation was unblocked by
/// cancellation rather than by data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// A process-wide shared flag that, once set, causes every blocking port
/// operation watching it to return [`Cancelled`] within one polling interval.
///
/// Cheap to clone: internally an `Arc<AtomicBool>`, so a [`crate::Machine`]
/// and every port it touches can hold their own handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capability for reading one word of input at a time.
pub trait InputPort {
    /// Read the next word, blocking if the implementation needs to wait for
    /// one. Returns `Err(Cancelled)` if `cancel` fires before a word is
    /// available.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VmError`] if the port has no more data to offer (for
    /// example, a [`ScriptedPort`] that has been exhausted).
    fn read(&self, cancel: &CancelToken) -> Result<std::result::Result<Word, Cancelled>, crate::VmError>;
}

/// Capability for writing one word of output at a time.
pub trait OutputPort {
    /// Write `value`, blocking if the implementation needs to wait for room.
    /// Returns `Err(Cancelled)` if `cancel` fires before the write completes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VmError`] if the write cannot be completed.
    fn write(
        &self,
        value: Word,
        cancel: &CancelToken,
    ) -> Result<std::result::Result<(), Cancelled>, crate::VmError>;
}

impl<T: InputPort + ?Sized> InputPort for Arc<T> {
    fn read(&self, cancel: &CancelToken) -> Result<std::result::Result<Word, Cancelled>, crate::VmError> {
        (**self).read(cancel)
    }
}

impl<T: OutputPort + ?Sized> OutputPort for Arc<T> {
    fn write(
        &self,
        value: Word,
        cancel: &CancelToken,
    ) -> Result<std::result::Result<(), Cancelled>, crate::VmError> {
        (**self).write(value, cancel)
    }
}
