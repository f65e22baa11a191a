//! VM error types.

use crate::machine::Word;

/// Errors that abort a machine's run loop.
///
/// Every variant except cancellation-adjacent ones is an instruction-level
/// failure: decode or addressing went wrong, and the machine halts having
/// made no further progress. Cancellation itself is not an error — see
/// [`crate::RunResult::Cancelled`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    /// Unknown opcode encountered at the given program counter.
    #[error("bad opcode {word} at pc {pc}")]
    BadOpcode {
        /// The raw instruction word that failed to decode.
        word: Word,
        /// Program counter at the time of the fault.
        pc: i64,
    },

    /// Unknown parameter mode digit encountered at the given program counter.
    #[error("bad parameter mode {mode} at pc {pc}")]
    BadMode {
        /// The offending mode digit.
        mode: i64,
        /// Program counter at the time of the fault.
        pc: i64,
    },

    /// Attempted to write through an immediate-mode operand.
    #[error("invalid write through immediate-mode operand at pc {pc}")]
    InvalidWrite {
        /// Program counter at the time of the fault.
        pc: i64,
    },

    /// Attempted to read or write a negative address.
    #[error("invalid address {addr} at pc {pc}")]
    InvalidAddress {
        /// The negative address that was requested.
        addr: i64,
        /// Program counter at the time of the fault.
        pc: i64,
    },

    /// A scripted input port ran out of words while the program still
    /// requested input.
    #[error("end of input")]
    EndOfInput,

    /// A bounded run ([`crate::Machine::run_with_step_limit`]) exhausted its
    /// step budget without the machine halting or being cancelled.
    #[error("exceeded step limit of {limit} instructions without halting")]
    StepLimitExceeded {
        /// The step budget that was exhausted.
        limit: u64,
    },
}
