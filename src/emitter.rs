//! BPDU emitter (C6), the periodic timer task (T2) that re-advertises the
//! root bridge on every trunk.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::bpdu::Bpdu;
use crate::bridge::Bridge;
use crate::link::LinkSend;

/// Runs forever: every `interval`, if this bridge currently believes itself
/// root, advertises on every trunk port. Takes only a snapshot of the
/// bridge's shared state before sending, never holding the lock across I/O,
/// so a slow interface can't stall the data-plane task's BPDU processing.
pub fn run(bridge: Arc<Bridge>, link: Arc<dyn LinkSend>, interval: Duration) {
    loop {
        std::thread::sleep(interval);
        emit_once(&bridge, link.as_ref());
    }
}

pub fn emit_once(bridge: &Bridge, link: &dyn LinkSend) {
    let (own_bid, root_bid, trunks) = bridge.emitter_snapshot();
    if own_bid != root_bid {
        trace!(own_bid, root_bid, "not root, skipping bpdu emission");
        return;
    }
    let advertisement = Bpdu {
        own_bid,
        root_bid,
        root_path_cost: 0,
    };
    let wire = advertisement.encode();
    for port in trunks {
        link.send_to_link(port, &wire);
    }
}
