//! The central switch: a peer-to-peer router over [`Bridge`] ports, plus the
//! NAT idle-wakeup worker.

use crate::bridge::{Bridge, BridgeState};
use crate::error::NatError;
use intcode_vm::ports::DEFAULT_POLLING_INTERVAL;
use intcode_vm::Word;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace};

struct SwitchInner {
    nat_address: Word,
    polling_interval: Duration,
    bridges: Mutex<HashMap<Word, Arc<BridgeState>>>,
    nat_inbox: Mutex<Option<(Word, Word)>>,
    first_to_nat: Mutex<Option<(Word, Word)>>,
    last_delivered_y: Mutex<Option<Word>>,
}

/// A peer-to-peer message fabric for a fixed set of machine addresses plus
/// one reserved NAT address.
///
/// Cheap to clone: internally an `Arc`, so every [`Bridge`] it hands out can
/// hold a handle back to the switch to deliver its framed output.
#[derive(Clone)]
pub struct Switch(Arc<SwitchInner>);

impl Switch {
    /// Create a switch whose reserved pseudo-address is `nat_address`
    /// (`255` in the reference network).
    #[must_use]
    pub fn new(nat_address: Word) -> Self {
        Self::with_polling_interval(nat_address, DEFAULT_POLLING_INTERVAL)
    }

    /// As [`Switch::new`], with an explicit polling interval for bridge
    /// reads and NAT idle detection.
    #[must_use]
    pub fn with_polling_interval(nat_address: Word, polling_interval: Duration) -> Self {
        debug_assert!(
            !polling_interval.is_zero(),
            "polling interval must be strictly positive"
        );
        Self(Arc::new(SwitchInner {
            nat_address,
            polling_interval,
            bridges: Mutex::new(HashMap::new()),
            nat_inbox: Mutex::new(None),
            first_to_nat: Mutex::new(None),
            last_delivered_y: Mutex::new(None),
        }))
    }

    /// This switch's reserved NAT address.
    #[must_use]
    pub fn nat_address(&self) -> Word {
        self.0.nat_address
    }

    /// Get or create the bridge for `addr`. A freshly created bridge's input
    /// queue is seeded with `addr` itself, matching the protocol every
    /// machine on the network expects on its first read.
    #[must_use]
    pub fn bridge_for(&self, addr: Word) -> Bridge {
        let mut bridges = self.lock_bridges();
        let state = bridges
            .entry(addr)
            .or_insert_with(|| BridgeState::seeded(addr))
            .clone();
        Bridge::new(self.clone(), addr, state, self.0.polling_interval)
    }

    pub(crate) fn deliver(&self, sender: Word, dest: Word, x: Word, y: Word) {
        trace!(sender, dest, x, y, "bridge message");
        if dest == self.0.nat_address {
            self.deliver_to_nat(x, y);
            return;
        }
        let bridges = self.lock_bridges();
        if let Some(state) = bridges.get(&dest) {
            let mut queue = state
                .queue
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            queue.push_back(x);
            queue.push_back(y);
            state.starving.store(false, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn deliver_to_nat(&self, x: Word, y: Word) {
        *self.lock_nat_inbox() = Some((x, y));
        let mut first = self.lock_first_to_nat();
        first.get_or_insert((x, y));
    }

    /// Block until the first `(x, y)` packet ever addressed to the NAT
    /// arrives, then return it. This is the "first part" answer for the
    /// reference network puzzle: the network's initial steady state, before
    /// any NAT wakeup has occurred.
    #[must_use]
    pub fn first_packet_to_nat(&self) -> (Word, Word) {
        loop {
            if let Some(packet) = *self.lock_first_to_nat() {
                return packet;
            }
            std::thread::sleep(self.0.polling_interval);
        }
    }

    /// Run the NAT idle-wakeup protocol until it observes the same `y` value
    /// delivered to address 0 twice in a row, then return the repeated
    /// packet. Checks for the repeat BEFORE resending, matching the
    /// reference protocol's exact ordering.
    ///
    /// # Errors
    ///
    /// Returns [`NatError::IdleWithoutPacket`] if the network goes idle
    /// before the NAT has ever received a packet, which under well-formed
    /// inputs never happens.
    pub fn run_nat_until_repeat(&self) -> Result<(Word, Word), NatError> {
        loop {
            self.wait_until_idle();

            let (x, y) = self.lock_nat_inbox().ok_or(NatError::IdleWithoutPacket)?;

            let mut last = self.lock_last_delivered_y();
            if *last == Some(y) {
                debug!(y, "nat observed a repeated y on an idle network, stopping");
                return Ok((x, y));
            }
            *last = Some(y);
            drop(last);

            debug!(x, y, "nat waking the network, delivering to address 0");
            self.deliver(self.0.nat_address, 0, x, y);
        }
    }

    fn wait_until_idle(&self) {
        loop {
            if self.is_idle() {
                return;
            }
            std::thread::sleep(self.0.polling_interval);
        }
    }

    fn is_idle(&self) -> bool {
        self.lock_bridges().values().all(|state| state.is_idle())
    }

    fn lock_bridges(&self) -> std::sync::MutexGuard<'_, HashMap<Word, Arc<BridgeState>>> {
        self.0
            .bridges
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_nat_inbox(&self) -> std::sync::MutexGuard<'_, Option<(Word, Word)>> {
        self.0
            .nat_inbox
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_first_to_nat(&self) -> std::sync::MutexGuard<'_, Option<(Word, Word)>> {
        self.0
            .first_to_nat
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_last_delivered_y(&self) -> std::sync::MutexGuard<'_, Option<Word>> {
        self.0
            .last_delivered_y
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intcode_vm::ports::CancelToken;
    use intcode_vm::{InputPort, OutputPort};

    #[test]
    fn fresh_bridge_reads_its_own_address_first() {
        let switch = Switch::new(255);
        let bridge = switch.bridge_for(7);
        let cancel = CancelToken::new();
        assert_eq!(bridge.read(&cancel).unwrap().unwrap(), 7);
    }

    #[test]
    fn empty_bridge_read_returns_negative_one_and_sets_starving() {
        let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
        let bridge = switch.bridge_for(1);
        let cancel = CancelToken::new();
        bridge.read(&cancel).unwrap().unwrap(); // drains the seeded address
        assert_eq!(bridge.read(&cancel).unwrap().unwrap(), -1);
    }

    #[test]
    fn three_writes_route_a_packet_to_the_destination_bridge() {
        let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
        let sender = switch.bridge_for(0);
        let receiver = switch.bridge_for(1);
        let cancel = CancelToken::new();

        receiver.read(&cancel).unwrap().unwrap(); // drain seeded address

        sender.write(1, &cancel).unwrap().unwrap(); // dest
        sender.write(111, &cancel).unwrap().unwrap(); // x
        sender.write(222, &cancel).unwrap().unwrap(); // y

        assert_eq!(receiver.read(&cancel).unwrap().unwrap(), 111);
        assert_eq!(receiver.read(&cancel).unwrap().unwrap(), 222);
    }

    #[test]
    fn packets_to_the_nat_address_do_not_reach_a_bridge_queue() {
        let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
        let sender = switch.bridge_for(0);
        let cancel = CancelToken::new();
        sender.write(255, &cancel).unwrap().unwrap();
        sender.write(1, &cancel).unwrap().unwrap();
        sender.write(2, &cancel).unwrap().unwrap();
        assert_eq!(switch.first_packet_to_nat(), (1, 2));
    }

    #[test]
    fn nat_reports_idle_without_packet() {
        let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
        let only = switch.bridge_for(0);
        let cancel = CancelToken::new();
        only.read(&cancel).unwrap().unwrap(); // drain seeded address
        only.read(&cancel).unwrap().unwrap(); // finds it empty, flips starving
        assert_eq!(
            switch.run_nat_until_repeat(),
            Err(NatError::IdleWithoutPacket)
        );
    }

    #[test]
    fn nat_wakes_the_network_and_then_detects_a_repeat() {
        let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
        let addr0 = switch.bridge_for(0);
        let sender = switch.bridge_for(1);
        let cancel = CancelToken::new();

        // Drain each bridge's seeded address, then read once more against an
        // empty queue so the starving flag actually flips (it is only set by
        // a read that *finds* the queue empty, never by the pop that empties it).
        addr0.read(&cancel).unwrap().unwrap();
        addr0.read(&cancel).unwrap().unwrap();
        sender.read(&cancel).unwrap().unwrap();
        sender.read(&cancel).unwrap().unwrap();

        sender.write(255, &cancel).unwrap().unwrap();
        sender.write(9, &cancel).unwrap().unwrap();
        sender.write(42, &cancel).unwrap().unwrap();

        let handle = {
            let switch = switch.clone();
            std::thread::spawn(move || switch.run_nat_until_repeat())
        };

        // address 0 receives (9, 42) from the NAT's first wakeup; read it
        // back out and once more against empty so it goes starving again,
        // at which point the NAT should observe the repeated y and stop.
        assert_eq!(addr0.read(&cancel).unwrap().unwrap(), 9);
        assert_eq!(addr0.read(&cancel).unwrap().unwrap(), 42);
        addr0.read(&cancel).unwrap().unwrap();

        assert_eq!(handle.join().unwrap().unwrap(), (9, 42));
    }
}
