//! Unbounded output sink.

use super::{CancelToken, Cancelled, OutputPort};
use crate::machine::Word;
use crate::VmError;
use std::sync::{Arc, Mutex};

/// An output port that appends every written word to an unbounded tape.
/// Never blocks; the tape is readable from any thread, typically after the
/// machine halts.
#[derive(Clone, Default)]
pub struct TapePort {
    tape: Arc<Mutex<Vec<Word>>>,
}

impl TapePort {
    /// Create an empty tape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the words written so far, in write order.
    #[must_use]
    pub fn tape(&self) -> Vec<Word> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl OutputPort for TapePort {
    fn write(&self, value: Word, _cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(value);
        Ok(Ok(()))
    }
}
