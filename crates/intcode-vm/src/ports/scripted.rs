//! Fixed-script input port.

use super::{CancelToken, Cancelled, InputPort};
use crate::machine::Word;
use crate::VmError;
use std::sync::Mutex;

/// An input port that replays a fixed sequence of words in order.
///
/// Never blocks and is never cancelled mid-read: reading past the end of the
/// script is an [`VmError::EndOfInput`] failure, not a cancellation.
pub struct ScriptedPort {
    words: Vec<Word>,
    cursor: Mutex<usize>,
}

impl ScriptedPort {
    /// Create a port that will replay `words` in order.
    #[must_use]
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            words,
            cursor: Mutex::new(0),
        }
    }
}

impl InputPort for ScriptedPort {
    fn read(&self, _cancel: &CancelToken) -> Result<Result<Word, Cancelled>, VmError> {
        let mut cursor = self.cursor.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let word = *self.words.get(*cursor).ok_or(VmError::EndOfInput)?;
        *cursor += 1;
        Ok(Ok(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_words_in_order() {
        let port = ScriptedPort::new(vec![1, 2, 3]);
        let cancel = CancelToken::new();
        assert_eq!(port.read(&cancel).unwrap().unwrap(), 1);
        assert_eq!(port.read(&cancel).unwrap().unwrap(), 2);
        assert_eq!(port.read(&cancel).unwrap().unwrap(), 3);
    }

    #[test]
    fn exhaustion_is_a_failure() {
        let port = ScriptedPort::new(vec![1]);
        let cancel = CancelToken::new();
        port.read(&cancel).unwrap().unwrap();
        assert_eq!(port.read(&cancel), Err(VmError::EndOfInput));
    }
}
