//! Errors the switch fabric itself can raise. VM-level failures are still
//! reported through [`intcode_vm::VmError`] from each machine's own run loop.

/// An error raised by the NAT worker or the switch's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NatError {
    /// The network went idle but the NAT's inbox was never populated. Under
    /// well-formed inputs the NAT always receives at least one packet before
    /// the network can go idle; seeing this means the image never addresses
    /// the NAT at all.
    #[error("network went idle but the NAT never received a packet")]
    IdleWithoutPacket,
}
