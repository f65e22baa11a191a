//! The per-machine port adapter into a [`crate::Switch`].

use crate::switch::Switch;
use intcode_vm::ports::{CancelToken, Cancelled, InputPort, OutputPort};
use intcode_vm::{VmError, Word};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) struct BridgeState {
    pub(crate) queue: Mutex<VecDeque<Word>>,
    pub(crate) starving: AtomicBool,
}

impl BridgeState {
    pub(crate) fn seeded(addr: Word) -> Arc<Self> {
        let mut queue = VecDeque::new();
        queue.push_back(addr);
        Arc::new(Self {
            queue: Mutex::new(queue),
            starving: AtomicBool::new(false),
        })
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.starving.load(Ordering::SeqCst) && self.lock_queue().is_empty()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Word>> {
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// A single machine's window onto the switch: an input/output port pair that
/// reads the machine's own address first, never fails, and never blocks for
/// longer than one polling interval.
///
/// Cloning a `Bridge` shares the same address's queue and output-framing
/// buffer — a `Bridge` is used as both the input and output port of exactly
/// one [`intcode_vm::Machine`], so both clones must observe the same state.
#[derive(Clone)]
pub struct Bridge {
    switch: Switch,
    addr: Word,
    state: Arc<BridgeState>,
    out_buffer: Arc<Mutex<Vec<Word>>>,
    polling_interval: Duration,
}

impl Bridge {
    pub(crate) fn new(
        switch: Switch,
        addr: Word,
        state: Arc<BridgeState>,
        polling_interval: Duration,
    ) -> Self {
        Self {
            switch,
            addr,
            state,
            out_buffer: Arc::new(Mutex::new(Vec::new())),
            polling_interval,
        }
    }

    /// This bridge's machine address.
    #[must_use]
    pub fn address(&self) -> Word {
        self.addr
    }
}

impl InputPort for Bridge {
    fn read(&self, cancel: &CancelToken) -> Result<Result<Word, Cancelled>, VmError> {
        let mut queue = self
            .state
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(word) = queue.pop_front() {
            // Per the starving-flag contract: it is only ever *set* by a
            // read that finds the queue empty, and *cleared* by an enqueue
            // (see `Switch::deliver`). A successful pop does not touch it,
            // even if it happens to drain the last word.
            return Ok(Ok(word));
        }
        drop(queue);

        self.state.starving.store(true, Ordering::SeqCst);
        std::thread::sleep(self.polling_interval);
        if cancel.is_cancelled() {
            return Ok(Err(Cancelled));
        }
        Ok(Ok(-1))
    }
}

impl OutputPort for Bridge {
    fn write(&self, value: Word, _cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        let mut buffer = self
            .out_buffer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buffer.push(value);
        if buffer.len() == 3 {
            let dest = buffer[0];
            let x = buffer[1];
            let y = buffer[2];
            buffer.clear();
            drop(buffer);
            self.switch.deliver(self.addr, dest, x, y);
        }
        Ok(Ok(()))
    }
}
