//! Pipelines of amplifier machines wired through `QueuePort`s, run either as
//! a single pass or as a feedback ring.

use intcode_vm::ports::{CancelToken, Cancelled, QueuePort};
use intcode_vm::{InputPort, Machine, OutputPort, VmError, Word};
use std::sync::{Arc, Mutex};

/// Feed `image` through one machine per phase setting in `phases`, wired
/// input-to-output in a straight line, and return the final amplifier's
/// single output value. `phases` is consumed in order: `phases[0]` seeds the
/// first machine, and so on.
#[must_use]
pub fn run_sequential(image: &[Word], phases: &[Word]) -> Word {
    let boot = CancelToken::new();
    let stage_count = phases.len();
    let ports: Vec<QueuePort> = phases.iter().map(|&phase| QueuePort::new(vec![phase])).collect();
    ports[0].write_all(&[0], &boot).unwrap().unwrap();
    let drain = QueuePort::new(vec![]);

    tracing::debug!(stage_count, "booting sequential amplifier chain");
    let mut handles = Vec::with_capacity(stage_count);
    for i in 0..stage_count {
        let input = ports[i].clone();
        let image = image.to_vec();
        if i + 1 < stage_count {
            let output = ports[i + 1].clone();
            handles.push(Machine::new(image, input, output).spawn());
        } else {
            let output = drain.clone();
            handles.push(Machine::new(image, input, output).spawn());
        }
    }

    let value = drain.read(&boot).unwrap().unwrap();
    for handle in handles {
        handle.join().unwrap();
    }
    tracing::debug!(value, "sequential amplifier chain produced final signal");
    value
}

/// As [`run_sequential`], but the last amplifier's output feeds back into
/// the first amplifier's input, forming a ring. Returns the last value the
/// final amplifier emits before it halts.
#[must_use]
pub fn run_feedback(image: &[Word], phases: &[Word]) -> Word {
    let boot = CancelToken::new();
    let stage_count = phases.len();
    let ports: Vec<QueuePort> = phases.iter().map(|&phase| QueuePort::new(vec![phase])).collect();
    ports[0].write_all(&[0], &boot).unwrap().unwrap();
    let last_value: Arc<Mutex<Option<Word>>> = Arc::new(Mutex::new(None));

    let mut handles = Vec::with_capacity(stage_count);
    for i in 0..stage_count {
        let input = ports[i].clone();
        let image = image.to_vec();
        if i + 1 < stage_count {
            let output = ports[i + 1].clone();
            handles.push(Machine::new(image, input, output).spawn());
        } else {
            let output = RecordingPort {
                ring: ports[0].clone(),
                last: Arc::clone(&last_value),
            };
            handles.push(Machine::new(image, input, output).spawn());
        }
    }

    tracing::debug!(stage_count, "feedback amplifier ring running, waiting on final stage");
    // The final stage halts when the ring's last full cycle completes; it
    // alone tells us the answer is ready. The others are still looping on
    // an empty ring input at that point and need a nudge to stop.
    handles.pop().unwrap().join().unwrap();
    for handle in &handles {
        handle.request_cancel();
    }
    for handle in handles {
        handle.join().unwrap();
    }

    last_value
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .expect("the final amplifier must emit at least one value before halting")
}

/// An output port that forwards every write into the feedback ring's first
/// queue while also recording the most recent value, so the driver can read
/// the final amplifier's last output after the ring has gone quiet.
#[derive(Clone)]
struct RecordingPort {
    ring: QueuePort,
    last: Arc<Mutex<Option<Word>>>,
}

impl OutputPort for RecordingPort {
    fn write(&self, value: Word, cancel: &CancelToken) -> Result<Result<(), Cancelled>, VmError> {
        *self.last.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(value);
        self.ring.write(value, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The two worked examples from the amplifier-circuit puzzle statement.

    #[test]
    fn sequential_wiring_finds_the_published_max_signal() {
        let image = vec![
            3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0,
        ];
        assert_eq!(run_sequential(&image, &[4, 3, 2, 1, 0]), 43210);
    }

    #[test]
    fn feedback_wiring_finds_the_published_max_signal() {
        let image = vec![
            3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1,
            28, 1005, 28, 6, 99, 0, 0, 5,
        ];
        assert_eq!(run_feedback(&image, &[9, 8, 7, 6, 5]), 139_629_729);
    }
}
