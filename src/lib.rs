//! VLAN-aware learning bridge with a simplified spanning-tree core.
//!
//! The crate is split into a pure data/control plane (this library) and a
//! thin binary (`main.rs`) that wires the plane to real interfaces via
//! `pnet::datalink`. Keeping the split lets the forwarding and STP logic be
//! driven in tests against an in-memory [`link::LinkSend`] instead of real
//! sockets.

pub mod bpdu;
pub mod bridge;
pub mod cam;
pub mod config;
pub mod dataplane;
pub mod emitter;
pub mod forward;
pub mod frame;
pub mod link;
pub mod stp;
