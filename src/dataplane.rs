//! The data-plane / STP dispatch loop (T1): classify each ingress frame and
//! route it to the forwarding engine or the STP engine.

use std::io;

use tracing::warn;

use crate::bpdu::{self, Bpdu};
use crate::bridge::Bridge;
use crate::cam::Cam;
use crate::forward;
use crate::frame;
use crate::link::LinkSend;

/// Abstraction over "block until the next ingress frame", so the dispatch
/// loop can be driven by real interfaces (`link::PnetReceivers`) or a
/// canned sequence in tests.
pub trait LinkRecv {
    fn recv_from_any_link(&mut self) -> io::Result<Option<(usize, Vec<u8>)>>;
}

impl LinkRecv for crate::link::PnetReceivers {
    fn recv_from_any_link(&mut self) -> io::Result<Option<(usize, Vec<u8>)>> {
        crate::link::PnetReceivers::recv_from_any_link(self)
    }
}

/// Runs T1 forever: classify, dispatch to the STP engine or the forwarding
/// engine, repeat. Only the adapter's receive failing is fatal; everything
/// else (parse errors, send failures) is logged and the loop continues.
pub fn run(
    bridge: &Bridge,
    cam: &mut Cam,
    link: &dyn LinkSend,
    recv: &mut dyn LinkRecv,
) -> anyhow::Result<()> {
    loop {
        let Some((ingress, raw)) = recv.recv_from_any_link()? else {
            continue;
        };
        dispatch(bridge, cam, link, ingress, &raw);
    }
}

/// Handles exactly one ingress frame. Split out from `run` so tests can
/// drive it without an infinite loop.
pub fn dispatch(bridge: &Bridge, cam: &mut Cam, link: &dyn LinkSend, ingress: usize, raw: &[u8]) {
    if bpdu::is_bpdu_dst(raw) {
        match Bpdu::decode(raw) {
            Ok(b) => crate::stp::process_bpdu(bridge, link, ingress, &b),
            Err(e) => warn!(port = ingress, error = %e, "dropping malformed bpdu"),
        }
        return;
    }

    match frame::parse(raw) {
        Ok(hdr) => forward::forward_frame(bridge, cam, link, ingress, raw, &hdr),
        Err(e) => warn!(port = ingress, error = %e, "dropping unparseable frame"),
    }
}
