//! The text-adventure security checkpoint: a droid controlled by ASCII
//! command lines, solved by brute-forcing the inventory the pressure plate
//! accepts.

use intcode_vm::ports::{AsciiScriptedPort, AsciiViewPort, CancelToken, QueuePort};
use intcode_vm::{Machine, Spawned, Word};
use std::collections::HashSet;
use std::sync::Arc;

/// The message the checkpoint prints when the carried inventory's combined
/// weight is wrong.
pub const REJECTED_MESSAGE: &str = "you are ejected back to the checkpoint";

/// A running droid: ASCII commands in, rendered transcript out.
pub struct DroneController {
    commands: AsciiScriptedPort,
    view: Arc<AsciiViewPort>,
    cancel: CancelToken,
}

impl DroneController {
    /// Boot the droid's program on its own thread and return a controller
    /// for it plus the running machine's handle.
    #[must_use]
    pub fn spawn(image: &[Word]) -> (Self, Spawned) {
        let commands = AsciiScriptedPort::new(QueuePort::new(vec![]));
        let view = Arc::new(AsciiViewPort::new());
        let machine = Machine::new(image.to_vec(), commands.clone(), Arc::clone(&view));
        let handle = machine.spawn();
        let cancel = handle.cancel_token();
        (
            Self {
                commands,
                view,
                cancel,
            },
            handle,
        )
    }

    /// Send one `\n`-terminated text command to the droid.
    pub fn send_line(&self, line: &str) {
        self.commands.append_line(line, &self.cancel).unwrap().unwrap();
    }

    /// The transcript rendered from the droid's output so far.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.view.rendered()
    }

    /// Block until every sent command has been consumed and the droid is
    /// waiting on its next input.
    pub fn wait_for_droid(&self) {
        self.commands.queue().wait_until_starving(&self.cancel).ok();
    }

    /// Stop the droid's machine.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Walk `initial_commands` (room navigation and `take <item>` commands) to
/// reach the checkpoint carrying every item named in `items`, then
/// brute-force the subset of `items` the checkpoint's pressure plate
/// accepts by trying every subset and moving through `move_command`,
/// stopping at the first subset whose attempt isn't rejected.
///
/// Returns `None` if every subset was rejected.
#[must_use]
pub fn solve(
    controller: &DroneController,
    initial_commands: &[String],
    items: &[String],
    move_command: &str,
) -> Option<Vec<String>> {
    for command in initial_commands {
        controller.send_line(command);
    }
    controller.wait_for_droid();

    let mut previous: HashSet<&str> = items.iter().map(String::as_str).collect();
    let mut last_seen = controller.transcript().len();

    for subset in powerset(items) {
        let current: HashSet<&str> = subset.iter().map(String::as_str).collect();
        for item in current.difference(&previous) {
            controller.send_line(&format!("take {item}"));
        }
        for item in previous.difference(&current) {
            controller.send_line(&format!("drop {item}"));
        }
        previous = current;
        controller.send_line(move_command);
        controller.wait_for_droid();

        let transcript = controller.transcript();
        if !transcript[last_seen..].contains(REJECTED_MESSAGE) {
            return Some(subset);
        }
        last_seen = transcript.len();
    }
    None
}

/// Every subset of `items`, smallest first. `items` is expected to be small
/// (puzzle inventories run to a handful of items); this is `2^n` by
/// construction, not meant for large slices.
fn powerset(items: &[String]) -> Vec<Vec<String>> {
    let mut subsets = Vec::with_capacity(1 << items.len());
    for mask in 0..(1u32 << items.len()) {
        let subset = items
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1 << i) != 0)
            .map(|(_, item)| item.clone())
            .collect();
        subsets.push(subset);
    }
    subsets
}
