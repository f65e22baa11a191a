//! Interactive terminal ports, for puzzles run by hand at a console.

use super::{CancelToken, Cancelled, InputPort, OutputPort};
use crate::machine::Word;
use crate::VmError;
use std::io::{BufRead, Write};
use std::sync::Mutex;

/// An input port that prompts on standard output and parses a line of
/// standard input as an integer.
pub struct PromptPort {
    prompt: String,
    tape: Mutex<Vec<Word>>,
}

impl PromptPort {
    /// Create a prompt port with the given prompt text.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tape: Mutex::new(Vec::new()),
        }
    }

    /// Every value this port has returned so far, in read order.
    #[must_use]
    pub fn tape(&self) -> Vec<Word> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl Default for PromptPort {
    fn default() -> Self {
        Self::new("Enter an input integer: ")
    }
}

impl InputPort for PromptPort {
    fn read(&self, _cancel: &CancelToken) -> Result<Result<Word, Cancelled>, VmError> {
        print!("{}", self.prompt);
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|_| VmError::EndOfInput)?;
        let value: Word = line.trim().parse().map_err(|_| VmError::EndOfInput)?;
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(value);
        Ok(Ok(value))
    }
}

/// An output port that writes each value as a formatted line to the given
/// writer (standard output by default).
pub struct DisplayPort<W: Write = std::io::Stdout> {
    prefix: Option<String>,
    writer: Mutex<W>,
    tape: Mutex<Vec<Word>>,
}

impl DisplayPort<std::io::Stdout> {
    /// Create a port writing to standard output with no line prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Create a port writing to standard output, prefixing every line.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            writer: Mutex::new(std::io::stdout()),
            tape: Mutex::new(Vec::new()),
        }
    }
}

impl Default for DisplayPort<std::io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> DisplayPort<W> {
    /// Create a port writing to an arbitrary writer (useful for tests).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            prefix: None,
            writer: Mutex::new(writer),
            tape: Mutex::new(Vec::new()),
        }
    }

    /// Every value written so far, in write order.
    #[must_use]
    pub fn tape(&self) -> Vec<Word> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl<W: Write> OutputPort for DisplayPort<W> {
    fn write(&self, value: Word, _cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        self.tape.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(value);
        let mut writer = self.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match &self.prefix {
            Some(prefix) => writeln!(writer, "{prefix}{value}").ok(),
            None => writeln!(writer, "{value}").ok(),
        };
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_port_records_tape_and_formats_lines() {
        let mut buf = Vec::new();
        {
            let port = DisplayPort::with_writer(&mut buf);
            let cancel = CancelToken::new();
            port.write(42, &cancel).unwrap().unwrap();
            assert_eq!(port.tape(), vec![42]);
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "42\n");
    }
}
