//! Reference clients built on top of [`intcode_vm`] and [`intcode_switch`]:
//! an amplifier pipeline, a hull-painting robot, a maze-mapping drone, a
//! peer-to-peer network with NAT wakeup, and a text-adventure solver.
//!
//! Each module is a thin driver over the VM/port primitives — the
//! interesting state (a painted panel grid, a mapped maze, an accepted item
//! set) lives in plain Rust data structures built by walking the machine's
//! input/output protocol, not inside the VM itself.

#![warn(missing_docs)]

pub mod adventure;
pub mod amplifier;
pub mod geometry;
pub mod maze;
pub mod network;
pub mod painter;
