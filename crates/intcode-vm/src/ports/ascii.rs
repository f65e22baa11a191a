//! ASCII-oriented ports used by the painter and adventure clients.
//!
//! The VM itself has no notion of characters — these ports are driver-side
//! encoding/decoding: [`AsciiScriptedPort`] turns `\n`-terminated command
//! strings into a word-per-character script, and [`AsciiViewPort`] decodes
//! output words back into text, falling back to a bare decimal line for any
//! value that isn't a printable byte.

use super::{CancelToken, Cancelled, InputPort, OutputPort, QueuePort};
use crate::machine::Word;
use crate::VmError;
use std::sync::Mutex;

/// An output port that renders values under 128 as ASCII characters and
/// anything else as a decimal integer on its own line.
#[derive(Default)]
pub struct AsciiViewPort {
    text: Mutex<String>,
    tape: Mutex<Vec<Word>>,
}

impl AsciiViewPort {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The rendered transcript so far: printable bytes as characters,
    /// non-printable values rendered as `{n}\n`.
    #[must_use]
    pub fn rendered(&self) -> String {
        self.text.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Every raw word written so far, in write order.
    #[must_use]
    pub fn tape(&self) -> Vec<Word> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl OutputPort for AsciiViewPort {
    fn write(&self, value: Word, _cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(value);
        let mut text = self.text.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if (0..128).contains(&value) {
            text.push(char::from_u32(u32::try_from(value).unwrap()).unwrap_or('\u{FFFD}'));
        } else {
            text.push_str(&format!("{value}\n"));
        }
        Ok(Ok(()))
    }
}

/// A [`QueuePort`] wrapper that accepts whole command lines and feeds them in
/// as one word per ASCII character (plus a trailing newline), matching the
/// remote-control protocol the maze and adventure programs speak.
#[derive(Clone)]
pub struct AsciiScriptedPort {
    queue: QueuePort,
}

impl AsciiScriptedPort {
    /// Wrap an existing queue port.
    #[must_use]
    pub fn new(queue: QueuePort) -> Self {
        Self { queue }
    }

    /// Encode `line` as ASCII words terminated by a newline and append them
    /// to the underlying queue.
    ///
    /// # Errors
    ///
    /// Propagates a [`VmError`] from the underlying queue write (never
    /// produced in practice; kept for trait symmetry).
    pub fn append_line(&self, line: &str, cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        let words = Self::encode(line);
        self.queue.write_all(&words, cancel)
    }

    /// Encode a `\n`-terminated command string into one word per character.
    #[must_use]
    pub fn encode(line: &str) -> Vec<Word> {
        format!("{line}\n").chars().map(|c| Word::from(c as u32)).collect()
    }

    /// The underlying queue port, for constructing a [`crate::Machine`].
    #[must_use]
    pub fn queue(&self) -> QueuePort {
        self.queue.clone()
    }
}

impl InputPort for AsciiScriptedPort {
    fn read(&self, cancel: &CancelToken) -> Result<Result<Word, Cancelled>, VmError> {
        self.queue.read(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_view_renders_printable_and_decimal() {
        let view = AsciiViewPort::new();
        let cancel = CancelToken::new();
        for word in "hi\n".chars().map(|c| Word::from(c as u32)) {
            view.write(word, &cancel).unwrap().unwrap();
        }
        view.write(12345, &cancel).unwrap().unwrap();
        assert_eq!(view.rendered(), "hi\n12345\n");
    }

    #[test]
    fn ascii_scripted_port_encodes_command_and_newline() {
        let port = AsciiScriptedPort::new(QueuePort::new(vec![]));
        let cancel = CancelToken::new();
        port.append_line("north", &cancel).unwrap().unwrap();
        let mut decoded = String::new();
        for _ in 0..6 {
            let word = port.read(&cancel).unwrap().unwrap();
            decoded.push(char::from_u32(u32::try_from(word).unwrap()).unwrap());
        }
        assert_eq!(decoded, "north\n");
    }
}
