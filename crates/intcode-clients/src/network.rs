//! The 50-node "category six" network: every machine wired to a `Switch`
//! through its own `Bridge`, with a NAT watching address 255.

use intcode_switch::{NatError, Switch};
use intcode_vm::{Machine, Spawned, Word};

/// The NAT address used by the reference network puzzle.
pub const NAT_ADDRESS: Word = 255;

/// Boot `count` machines at addresses `0..count` on a fresh switch and
/// return the first `(x, y)` packet ever addressed to the NAT. This is the
/// network's initial steady state, before any NAT wakeup.
///
/// The spawned machines keep running after this function returns; callers
/// that don't also need [`run_until_repeat`] should build their own `Switch`
/// and cancel its bridges' machines once done.
#[must_use]
pub fn first_packet_to_nat(image: &[Word], count: Word) -> (Word, Word) {
    let switch = Switch::new(NAT_ADDRESS);
    let _handles = boot_network(&switch, image, count);
    switch.first_packet_to_nat()
}

/// Boot `count` machines at addresses `0..count` on a fresh switch and drive
/// the NAT idle-wakeup protocol until it observes a repeated `y`, returning
/// that packet. Spawned machines are left running; the `Switch` itself has
/// no natural shutdown since the network never halts on its own.
///
/// # Errors
///
/// Returns [`NatError::IdleWithoutPacket`] if the network goes idle before
/// the NAT ever receives a packet.
pub fn run_until_repeat(image: &[Word], count: Word) -> Result<(Word, Word), NatError> {
    let switch = Switch::new(NAT_ADDRESS);
    let _handles = boot_network(&switch, image, count);
    switch.run_nat_until_repeat()
}

fn boot_network(switch: &Switch, image: &[Word], count: Word) -> Vec<Spawned> {
    tracing::debug!(count, "booting bridged network");
    (0..count)
        .map(|addr| {
            let bridge = switch.bridge_for(addr);
            let machine = Machine::new(image.to_vec(), bridge.clone(), bridge);
            machine.spawn()
        })
        .collect()
}
