//! Spanning-tree engine (C5): BPDU reaction and the resulting root
//! election and port-state transitions.

use tracing::{info, warn};

use crate::bpdu::{Bpdu, LINK_COST};
use crate::bridge::{Bridge, StpState};
use crate::config::PortKind;
use crate::link::LinkSend;

/// Runs the full per-BPDU reaction (rules 1-4) atomically against the
/// bridge's shared state. Access ports never participate in STP: they have
/// no notion of a trunk link to block, so a BPDU arriving there is dropped
/// with a log line instead of being run through the state machine.
pub fn process_bpdu(bridge: &Bridge, link: &dyn LinkSend, ingress: usize, bpdu: &Bpdu) {
    if matches!(bridge.port_kind(ingress), PortKind::Access { .. }) {
        warn!(
            port = ingress,
            name = bridge.port_name(ingress),
            "dropping bpdu received on access port"
        );
        return;
    }

    let trunks = bridge.trunk_indices();
    let mut reactive_sends: Vec<(usize, Bpdu)> = Vec::new();

    bridge.with_locked_state(|step| {
        let was_root = step.own_bid == *step.root_bid;

        if bpdu.root_bid < *step.root_bid {
            // Rule 1: superior root learned.
            *step.root_bid = bpdu.root_bid;
            *step.root_path_cost = bpdu.root_path_cost + LINK_COST as u32;
            step.port_states[ingress] = StpState::Root;

            if was_root {
                for &q in &trunks {
                    if q != ingress && step.port_states[q] != StpState::Root {
                        step.port_states[q] = StpState::Blocking;
                    }
                }
            }

            let advertisement = Bpdu {
                own_bid: step.own_bid,
                root_bid: *step.root_bid,
                root_path_cost: *step.root_path_cost,
            };
            for &q in &trunks {
                if q != ingress && step.port_states[q] != StpState::Root {
                    reactive_sends.push((q, advertisement));
                }
            }
        } else if bpdu.root_bid == *step.root_bid {
            // Rule 2: same root.
            if step.port_states[ingress] == StpState::Root {
                let candidate = bpdu.root_path_cost + LINK_COST as u32;
                if candidate < *step.root_path_cost {
                    *step.root_path_cost = candidate;
                }
            } else if bpdu.root_path_cost > *step.root_path_cost {
                step.port_states[ingress] = StpState::Designated;
            }
        }

        // Rule 3: loop/echo, evaluated independently of (and after) 1-2.
        if bpdu.own_bid == step.own_bid {
            step.port_states[ingress] = StpState::Blocking;
        }

        // Rule 4: post-step, a root bridge has no ROOT/BLOCKING ports.
        if step.own_bid == *step.root_bid {
            for &q in &trunks {
                step.port_states[q] = StpState::Designated;
            }
        }
    });

    if !reactive_sends.is_empty() {
        info!(
            root_bid = bridge.root_bid(),
            root_path_cost = bridge.root_path_cost(),
            "adopted superior root, re-advertising"
        );
    }
    for (port, advertisement) in reactive_sends {
        link.send_to_link(port, &advertisement.encode());
    }
}
