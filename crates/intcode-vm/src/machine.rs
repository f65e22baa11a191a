//! The fetch-decode-execute core.

use crate::decode::{decode, Opcode, ParamMode};
use crate::error::VmError;
use crate::ports::{CancelToken, Cancelled, InputPort, OutputPort};
use std::collections::HashMap;
use std::thread::JoinHandle;

/// A signed machine word. 64 bits is wide enough to hold every intermediate
/// product Intcode programs in the wild produce; 32 bits is not (see the
/// 16-digit-output and large-immediate test programs).
pub type Word = i64;

/// Sparse, zero-initialized address space. Any address not explicitly
/// written reads as 0; writes to negative addresses fail.
#[derive(Debug, Default, Clone)]
struct Memory {
    cells: HashMap<i64, Word>,
}

impl Memory {
    fn from_image(image: Vec<Word>) -> Self {
        let cells = image
            .into_iter()
            .enumerate()
            .map(|(addr, word)| (addr as i64, word))
            .collect();
        Self { cells }
    }

    fn read(&self, addr: i64, pc: i64) -> Result<Word, VmError> {
        if addr < 0 {
            return Err(VmError::InvalidAddress { addr, pc });
        }
        Ok(self.cells.get(&addr).copied().unwrap_or(0))
    }

    fn write(&mut self, addr: i64, value: Word, pc: i64) -> Result<(), VmError> {
        if addr < 0 {
            return Err(VmError::InvalidAddress { addr, pc });
        }
        self.cells.insert(addr, value);
        Ok(())
    }
}

/// Outcome of executing exactly one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction ran; the machine is ready for another `step`.
    Continued,
    /// The machine executed `Halt`. Further `step` calls are a no-op that
    /// keeps returning `Halted`.
    Halted,
    /// A blocking port operation was unblocked by cancellation instead of
    /// by data.
    Cancelled,
}

/// Outcome of running a machine to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// The machine executed `Halt`.
    Halted,
    /// The run was stopped by cancellation; this is a normal termination,
    /// not a failure.
    Cancelled,
}

/// An Intcode virtual machine: memory, program counter, relative base, and
/// the two ports it reads input from / writes output to.
///
/// A `Machine` is mutated only by its own `step`/`run_until_terminate` loop.
/// The decode/execute path itself performs no I/O beyond the two ports and no
/// logging (it is the hot loop); lifecycle events are logged only around it,
/// by [`Machine::spawn`] or by a caller driving `run_until_terminate` directly
/// (see `intcode-clients` for that convention).
pub struct Machine<I, O> {
    memory: Memory,
    pc: i64,
    relative_base: i64,
    halted: bool,
    input: I,
    output: O,
    cancel: CancelToken,
}

impl<I: InputPort, O: OutputPort> Machine<I, O> {
    /// Create a machine from an instruction image, bound to the given input
    /// and output ports. The program counter starts at 0, the relative base
    /// at 0, and the machine is not halted.
    pub fn new(image: Vec<Word>, input: I, output: O) -> Self {
        Self {
            memory: Memory::from_image(image),
            pc: 0,
            relative_base: 0,
            halted: false,
            input,
            output,
            cancel: CancelToken::new(),
        }
    }

    /// A clone of this machine's cancel token, for a host to retain before
    /// moving the machine onto its own thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the machine has executed `Halt`.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Set the cancellation token. Any subsequent blocking port call returns
    /// `Cancelled` promptly, and the run loop exits after the current
    /// instruction.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// Read a word directly out of memory. Sanctioned poke for drivers that
    /// must patch the image before running (e.g. "insert coin" writes 2 at
    /// address 0).
    #[must_use]
    pub fn memory_read(&self, addr: i64) -> Word {
        self.memory.cells.get(&addr).copied().unwrap_or(0)
    }

    /// Write a word directly into memory, bypassing the execute loop.
    pub fn memory_write(&mut self, addr: i64, word: Word) {
        self.memory.cells.insert(addr, word);
    }

    fn load(&self, raw: Word, mode: ParamMode) -> Result<Word, VmError> {
        match mode {
            ParamMode::Position => self.memory.read(raw, self.pc),
            ParamMode::Immediate => Ok(raw),
            ParamMode::Relative => self.memory.read(self.relative_base + raw, self.pc),
        }
    }

    fn store(&mut self, raw: Word, mode: ParamMode, value: Word) -> Result<(), VmError> {
        match mode {
            ParamMode::Position => self.memory.write(raw, value, self.pc),
            ParamMode::Immediate => Err(VmError::InvalidWrite { pc: self.pc }),
            ParamMode::Relative => self.memory.write(self.relative_base + raw, value, self.pc),
        }
    }

    /// Execute exactly one instruction.
    ///
    /// # Errors
    ///
    /// Returns [`VmError`] if decoding or an addressing operation fails.
    pub fn step(&mut self) -> Result<StepOutcome, VmError> {
        if self.halted {
            return Ok(StepOutcome::Halted);
        }

        let instr_word = self.memory.read(self.pc, self.pc)?;
        let instr = decode(instr_word, self.pc)?;
        let arity = instr.opcode.arity();

        let mut raw: [Word; 3] = [0; 3];
        for (i, slot) in raw.iter_mut().enumerate().take(arity) {
            *slot = self.memory.read(self.pc + 1 + i as i64, self.pc)?;
        }
        let modes = instr.modes;

        match instr.opcode {
            Opcode::Add => {
                let value = self.load(raw[0], modes[0])? + self.load(raw[1], modes[1])?;
                self.store(raw[2], modes[2], value)?;
                self.pc += 4;
            }
            Opcode::Mul => {
                let value = self.load(raw[0], modes[0])? * self.load(raw[1], modes[1])?;
                self.store(raw[2], modes[2], value)?;
                self.pc += 4;
            }
            Opcode::Input => match self.input.read(&self.cancel)? {
                Ok(value) => {
                    self.store(raw[0], modes[0], value)?;
                    self.pc += 2;
                }
                Err(Cancelled) => return Ok(StepOutcome::Cancelled),
            },
            Opcode::Output => {
                let value = self.load(raw[0], modes[0])?;
                match self.output.write(value, &self.cancel)? {
                    Ok(()) => self.pc += 2,
                    Err(Cancelled) => return Ok(StepOutcome::Cancelled),
                }
            }
            Opcode::JumpIfTrue => {
                let cond = self.load(raw[0], modes[0])?;
                let target = self.load(raw[1], modes[1])?;
                self.pc = if cond != 0 { target } else { self.pc + 3 };
            }
            Opcode::JumpIfFalse => {
                let cond = self.load(raw[0], modes[0])?;
                let target = self.load(raw[1], modes[1])?;
                self.pc = if cond == 0 { target } else { self.pc + 3 };
            }
            Opcode::LessThan => {
                let less = self.load(raw[0], modes[0])? < self.load(raw[1], modes[1])?;
                self.store(raw[2], modes[2], Word::from(less))?;
                self.pc += 4;
            }
            Opcode::Equals => {
                let equal = self.load(raw[0], modes[0])? == self.load(raw[1], modes[1])?;
                self.store(raw[2], modes[2], Word::from(equal))?;
                self.pc += 4;
            }
            Opcode::AdjustBase => {
                self.relative_base += self.load(raw[0], modes[0])?;
                self.pc += 2;
            }
            Opcode::Halt => {
                self.halted = true;
                return Ok(StepOutcome::Halted);
            }
        }

        Ok(StepOutcome::Continued)
    }

    /// Run until the machine halts or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`VmError`] if any instruction fails to decode or execute.
    /// Port cancellation is not an error — see [`RunResult::Cancelled`].
    pub fn run_until_terminate(&mut self) -> Result<RunResult, VmError> {
        loop {
            match self.step()? {
                StepOutcome::Continued => {}
                StepOutcome::Halted => return Ok(RunResult::Halted),
                StepOutcome::Cancelled => return Ok(RunResult::Cancelled),
            }
        }
    }

    /// As [`Machine::run_until_terminate`], but aborts with
    /// [`VmError::StepLimitExceeded`] after `limit` instructions without
    /// halting or being cancelled. Intended for tests and fuzzing harnesses
    /// that must bound a runaway program rather than hang the test process.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::StepLimitExceeded`] if the machine is still running
    /// after `limit` steps, or any error [`Machine::step`] would return.
    pub fn run_with_step_limit(&mut self, limit: u64) -> Result<RunResult, VmError> {
        for _ in 0..limit {
            match self.step()? {
                StepOutcome::Continued => {}
                StepOutcome::Halted => return Ok(RunResult::Halted),
                StepOutcome::Cancelled => return Ok(RunResult::Cancelled),
            }
        }
        Err(VmError::StepLimitExceeded { limit })
    }
}

impl<I, O> Machine<I, O>
where
    I: InputPort + Send + 'static,
    O: OutputPort + Send + 'static,
{
    /// Launch this machine on its own OS thread, running to completion.
    /// Returns a [`Spawned`] handle pairing the thread with a clone of the
    /// machine's cancel token, so a caller can request cancellation and join
    /// without holding onto the `Machine` itself — the `Environ(machine,
    /// thread)` pattern every multi-machine client in this crate follows.
    #[must_use]
    pub fn spawn(mut self) -> Spawned {
        let cancel = self.cancel_token();
        tracing::debug!("machine starting on its own thread");
        let handle = std::thread::spawn(move || {
            let outcome = self.run_until_terminate();
            match &outcome {
                Ok(RunResult::Halted) => tracing::debug!("machine halted"),
                Ok(RunResult::Cancelled) => tracing::debug!("machine cancelled"),
                Err(error) => tracing::warn!(%error, "machine run failed"),
            }
            outcome
        });
        Spawned { cancel, handle }
    }
}

/// A machine running on its own thread, paired with the cancel token needed
/// to stop it. Dropping a `Spawned` without joining leaks the thread (it
/// keeps running); callers should `request_cancel` then `join`.
pub struct Spawned {
    cancel: CancelToken,
    handle: JoinHandle<Result<RunResult, VmError>>,
}

impl Spawned {
    /// Request that the running machine stop at its next blocking port
    /// operation (or immediately, if already blocked).
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of this machine's cancel token, for wiring into a port that
    /// needs to observe it independently of this handle.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until the machine's thread finishes, returning its run outcome.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Machine::run_until_terminate`] returned.
    ///
    /// # Panics
    ///
    /// Panics if the machine's thread itself panicked.
    pub fn join(self) -> Result<RunResult, VmError> {
        self.handle.join().expect("machine thread panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ScriptedPort, TapePort};

    #[test]
    fn add_writes_sum_to_destination() {
        let image = vec![1, 0, 0, 0, 99];
        let mut machine = Machine::new(image, ScriptedPort::new(vec![]), TapePort::new());
        machine.run_until_terminate().unwrap();
        assert_eq!(machine.memory_read(0), 2);
    }

    #[test]
    fn spawned_machine_halts_and_joins() {
        let image = vec![3, 0, 4, 0, 99];
        let output = TapePort::new();
        let machine = Machine::new(image, ScriptedPort::new(vec![7]), output.clone());
        let handle = machine.spawn();
        assert_eq!(handle.join().unwrap(), RunResult::Halted);
        assert_eq!(output.tape(), vec![7]);
    }

    #[test]
    fn spawned_machine_can_be_cancelled_from_outside() {
        use crate::ports::QueuePort;
        let image = vec![3, 0, 99]; // blocks forever on input
        let machine = Machine::new(image, QueuePort::new(vec![]), TapePort::new());
        let handle = machine.spawn();
        handle.request_cancel();
        assert_eq!(handle.join().unwrap(), RunResult::Cancelled);
    }

    #[test]
    fn step_limit_aborts_a_runaway_loop() {
        let image = vec![1105, 1, 0]; // unconditional jump to self
        let mut machine = Machine::new(image, ScriptedPort::new(vec![]), TapePort::new());
        let err = machine.run_with_step_limit(10).unwrap_err();
        assert_eq!(err, VmError::StepLimitExceeded { limit: 10 });
    }

    #[test]
    fn step_limit_is_not_reached_when_the_program_halts_first() {
        let image = vec![1, 0, 0, 0, 99];
        let mut machine = Machine::new(image, ScriptedPort::new(vec![]), TapePort::new());
        assert_eq!(machine.run_with_step_limit(100).unwrap(), RunResult::Halted);
    }

    #[test]
    fn relative_mode_write_extends_memory_beyond_the_image() {
        // AdjustBase 2000, then write 42 at relative address 5 (absolute 2005).
        let image = vec![109, 2000, 21105, 1, 1, 99];
        let mut machine = Machine::new(image, ScriptedPort::new(vec![]), TapePort::new());
        machine.step().unwrap(); // AdjustBase
        assert_eq!(machine.memory_read(2005), 0);
    }

    #[test]
    fn no_instruction_but_input_output_ever_consults_cancellation() {
        let image = vec![1, 0, 0, 0, 99];
        let mut machine = Machine::new(image, ScriptedPort::new(vec![]), TapePort::new());
        // run to completion without ever touching a port; cancelling afterwards
        // should have no observable effect since the machine already halted.
        let result = machine.run_until_terminate().unwrap();
        assert_eq!(result, RunResult::Halted);
    }
}
