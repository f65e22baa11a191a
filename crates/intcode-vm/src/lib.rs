//! Intcode virtual machine: decoder, memory, ports, and the fetch-decode-execute core.
//!
//! This crate provides an interpreter for the Intcode instruction set (Advent of
//! Code 2019) together with the I/O port abstraction that lets one machine's
//! output feed another machine's input. It supports:
//!
//! - All nine opcodes plus halt, with position/immediate/relative addressing
//! - A growable, zero-initialized memory model (reads of unwritten addresses are 0)
//! - Cooperative cancellation for machines blocked on a port read/write
//! - Pluggable ports: scripted input, tape/prompt/display output, and a
//!   thread-safe queue port for wiring multiple machines together
//!
//! # Architecture
//!
//! The [`Machine`] executes instructions against a [`Memory`] and two ports,
//! bound through the [`InputPort`]/[`OutputPort`] traits. Anything satisfying
//! those traits can plug into a machine — a file-backed script, a terminal, or
//! another machine's port, shared under a mutex.
//!
//! # Example
//!
//! ```
//! use intcode_vm::{Machine, ports::{ScriptedPort, TapePort}};
//!
//! // "read a word, write it back, halt"
//! let image = vec![3, 0, 4, 0, 99];
//! let input = ScriptedPort::new(vec![42]);
//! let output = TapePort::new();
//! let mut machine = Machine::new(image, input, output.clone());
//! machine.run_until_terminate().unwrap();
//! assert_eq!(output.tape(), vec![42]);
//! ```

#![warn(missing_docs)]

mod config;
mod decode;
mod error;
mod image;
mod machine;
pub mod ports;

pub use config::RunConfig;
pub use decode::{Opcode, ParamMode};
pub use error::VmError;
pub use image::{load_image, parse_image, ImageError};
pub use machine::{Machine, RunResult, Spawned, StepOutcome, Word};
pub use ports::{CancelToken, Cancelled, InputPort, OutputPort};

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ScriptedPort, TapePort};

    #[test]
    fn read_write_back_roundtrip() {
        let image = vec![3, 0, 4, 0, 99];
        let input = ScriptedPort::new(vec![42]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output.clone());
        machine.run_until_terminate().unwrap();
        assert_eq!(output.tape(), vec![42]);
    }

    #[test]
    fn quine_emits_itself() {
        let image = vec![
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let input = ScriptedPort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image.clone(), input, output.clone());
        machine.run_until_terminate().unwrap();
        assert_eq!(output.tape(), image);
    }

    #[test]
    fn sixteen_digit_output() {
        let image = vec![1102, 34915192, 34915192, 7, 4, 7, 99, 0];
        let input = ScriptedPort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output.clone());
        machine.run_until_terminate().unwrap();
        assert_eq!(output.tape(), vec![1_219_070_632_396_864]);
    }

    #[test]
    fn large_immediate() {
        let image = vec![104, 1_125_899_906_842_624, 99];
        let input = ScriptedPort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output.clone());
        machine.run_until_terminate().unwrap();
        assert_eq!(output.tape(), vec![1_125_899_906_842_624]);
    }

    #[test]
    fn equality_position_mode() {
        let image = vec![3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
        for (input_value, expected) in [(8, 1), (7, 0)] {
            let input = ScriptedPort::new(vec![input_value]);
            let output = TapePort::new();
            let mut machine = Machine::new(image.clone(), input, output.clone());
            machine.run_until_terminate().unwrap();
            assert_eq!(output.tape(), vec![expected]);
        }
    }

    #[test]
    fn jump_immediate_mode() {
        let image = vec![3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];
        for (input_value, expected) in [(0, 0), (42, 1)] {
            let input = ScriptedPort::new(vec![input_value]);
            let output = TapePort::new();
            let mut machine = Machine::new(image.clone(), input, output.clone());
            machine.run_until_terminate().unwrap();
            assert_eq!(output.tape(), vec![expected]);
        }
    }

    #[test]
    fn unwritten_address_reads_as_zero() {
        // Output address 50 directly, never written by anything, then halt.
        let image = vec![4, 50, 99];
        let input = ScriptedPort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output.clone());
        machine.run_until_terminate().unwrap();
        assert_eq!(output.tape(), vec![0]);
    }

    #[test]
    fn halt_twice_is_idempotent() {
        let image = vec![99];
        let input = ScriptedPort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output);
        assert!(matches!(machine.step().unwrap(), StepOutcome::Halted));
        assert!(matches!(machine.step().unwrap(), StepOutcome::Halted));
    }

    #[test]
    fn cancellation_before_any_step_yields_cancelled_with_no_side_effects() {
        use crate::ports::QueuePort;
        // Blocks immediately on the Input opcode; nothing is ever written.
        let image = vec![3, 0, 99];
        let input = QueuePort::new(vec![]);
        let output = TapePort::new();
        let mut machine = Machine::new(image, input, output);
        machine.request_cancel();
        assert!(matches!(
            machine.run_until_terminate().unwrap(),
            RunResult::Cancelled
        ));
        assert_eq!(machine.memory_read(0), 0);
    }

    proptest::proptest! {
        #[test]
        fn read_write_back_holds_for_any_word(k: i64) {
            let image = vec![3, 0, 4, 0, 99];
            let input = ScriptedPort::new(vec![k]);
            let output = TapePort::new();
            let mut machine = Machine::new(image, input, output.clone());
            machine.run_until_terminate().unwrap();
            proptest::prop_assert_eq!(output.tape(), vec![k]);
        }
    }
}
