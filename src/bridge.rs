//! Port table (C1) and bridge identity, with the shared-state mutex
//! discipline the data-plane and timer tasks use to coordinate.

use std::sync::Mutex;

use crate::config::{PortConfig, PortKind, SwitchConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StpState {
    Designated,
    Root,
    Blocking,
}

/// `root_bid`, `root_path_cost`, and the per-port STP state vector are
/// protected together by one mutex: the data-plane task holds it for an
/// entire BPDU-processing step (including reactive sends), while the BPDU
/// timer task takes it only long enough to snapshot before releasing.
#[derive(Debug)]
struct SharedState {
    root_bid: u64,
    root_path_cost: u32,
    port_states: Vec<StpState>,
}

#[derive(Debug)]
pub struct Bridge {
    pub own_bid: u64,
    ports: Vec<PortConfig>,
    shared: Mutex<SharedState>,
}

impl Bridge {
    pub fn new(config: SwitchConfig) -> Self {
        let own_bid = config.bridge_priority;
        let port_states = vec![StpState::Designated; config.ports.len()];
        Bridge {
            own_bid,
            ports: config.ports,
            shared: Mutex::new(SharedState {
                root_bid: own_bid,
                root_path_cost: 0,
                port_states,
            }),
        }
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port_name(&self, idx: usize) -> &str {
        &self.ports[idx].name
    }

    pub fn port_kind(&self, idx: usize) -> PortKind {
        self.ports[idx].kind
    }

    pub fn is_trunk(&self, idx: usize) -> bool {
        matches!(self.ports[idx].kind, PortKind::Trunk)
    }

    /// Indices of every trunk port, in port-table order.
    pub fn trunk_indices(&self) -> Vec<usize> {
        (0..self.ports.len()).filter(|&i| self.is_trunk(i)).collect()
    }

    pub fn root_bid(&self) -> u64 {
        self.shared.lock().unwrap().root_bid
    }

    pub fn root_path_cost(&self) -> u32 {
        self.shared.lock().unwrap().root_path_cost
    }

    pub fn is_root(&self) -> bool {
        self.own_bid == self.root_bid()
    }

    pub fn port_state(&self, idx: usize) -> StpState {
        self.shared.lock().unwrap().port_states[idx]
    }

    /// Snapshot used by the BPDU emitter (T2): `(own_bid, root_bid,
    /// trunk_ports)`, taken and released without holding the lock across
    /// the subsequent sends, since those reach real network interfaces.
    pub fn emitter_snapshot(&self) -> (u64, u64, Vec<usize>) {
        let state = self.shared.lock().unwrap();
        let trunks = self.trunk_indices();
        (self.own_bid, state.root_bid, trunks)
    }

    /// Runs the entire STP reaction to one BPDU atomically: the whole
    /// root-election/port-state step happens with the lock held, including
    /// deciding any reactive re-advertisement sends. `f` is called once
    /// with a mutable view of the shared state and must not block on
    /// anything but in-memory work.
    pub fn with_locked_state<R>(&self, f: impl FnOnce(&mut StpStep) -> R) -> R {
        let mut guard = self.shared.lock().unwrap();
        let mut step = StpStep {
            own_bid: self.own_bid,
            root_bid: &mut guard.root_bid,
            root_path_cost: &mut guard.root_path_cost,
            port_states: &mut guard.port_states,
        };
        f(&mut step)
    }
}

/// A mutable view into the bridge-identity triple and port-state vector,
/// handed to the STP engine for the duration of one locked BPDU-processing
/// step.
pub struct StpStep<'a> {
    pub own_bid: u64,
    pub root_bid: &'a mut u64,
    pub root_path_cost: &'a mut u32,
    pub port_states: &'a mut Vec<StpState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortConfig;

    fn bridge(own_bid: u64, ports: Vec<PortConfig>) -> Bridge {
        Bridge::new(SwitchConfig {
            bridge_priority: own_bid,
            ports,
        })
    }

    fn access(name: &str, vlan: u16) -> PortConfig {
        PortConfig {
            name: name.into(),
            kind: PortKind::Access { vlan },
        }
    }

    fn trunk(name: &str) -> PortConfig {
        PortConfig {
            name: name.into(),
            kind: PortKind::Trunk,
        }
    }

    #[test]
    fn initializes_as_own_root_with_zero_cost() {
        let b = bridge(10, vec![access("r-0", 1), trunk("rr-1")]);
        assert!(b.is_root());
        assert_eq!(b.root_bid(), 10);
        assert_eq!(b.root_path_cost(), 0);
    }

    #[test]
    fn all_ports_start_designated() {
        let b = bridge(10, vec![access("r-0", 1), trunk("rr-1")]);
        assert_eq!(b.port_state(0), StpState::Designated);
        assert_eq!(b.port_state(1), StpState::Designated);
    }

    #[test]
    fn trunk_indices_excludes_access_ports() {
        let b = bridge(10, vec![access("r-0", 1), trunk("rr-1"), trunk("rr-2")]);
        assert_eq!(b.trunk_indices(), vec![1, 2]);
    }
}
