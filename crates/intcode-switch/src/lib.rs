//! Peer-to-peer switch fabric for Intcode machines.
//!
//! A [`Switch`] routes three-word packets (`dest_addr, x, y`) between
//! machines, each wired to the fabric through its own [`Bridge`] port. A
//! reserved address acts as the network's NAT: it observes the most recent
//! packet addressed to it and, once the rest of the network has gone idle,
//! rebroadcasts that packet to address 0 — waking a network that would
//! otherwise deadlock with every machine blocked on an empty input queue.
//!
//! # Example
//!
//! ```
//! use intcode_switch::Switch;
//! use intcode_vm::ports::CancelToken;
//! use intcode_vm::{InputPort, OutputPort};
//! use std::time::Duration;
//!
//! let switch = Switch::with_polling_interval(255, Duration::from_millis(1));
//! let sender = switch.bridge_for(0);
//! let cancel = CancelToken::new();
//!
//! sender.write(255, &cancel).unwrap().unwrap(); // dest: the NAT
//! sender.write(10, &cancel).unwrap().unwrap(); // x
//! sender.write(20, &cancel).unwrap().unwrap(); // y
//!
//! assert_eq!(switch.first_packet_to_nat(), (10, 20));
//! ```

#![warn(missing_docs)]

mod bridge;
mod error;
mod switch;

pub use bridge::Bridge;
pub use error::NatError;
pub use switch::Switch;

pub use intcode_vm::{InputPort, OutputPort};
