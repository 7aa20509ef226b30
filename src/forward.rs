//! VLAN-aware forwarding engine (C4): learning, destination resolution, and
//! per-egress tag adaptation.

use tracing::{trace, warn};

use crate::bridge::{Bridge, StpState};
use crate::cam::Cam;
use crate::config::PortKind;
use crate::frame::{self, ParsedHeader};
use crate::link::LinkSend;

const BROADCAST: [u8; 6] = [0xff; 6];

/// Handles one non-BPDU ingress frame: learns the source, resolves the
/// destination, and forwards to every surviving egress candidate with the
/// tagging adapted to that port's kind.
pub fn forward_frame(
    bridge: &Bridge,
    cam: &mut Cam,
    link: &dyn LinkSend,
    ingress: usize,
    raw: &[u8],
    hdr: &ParsedHeader,
) {
    cam.set(hdr.src, ingress);

    let effective_vlan = match effective_vlan(bridge, ingress, hdr) {
        Some(vlan) => vlan,
        None => return,
    };
    let arrived_tagged = hdr.vlan.is_some();

    let candidates: Vec<usize> = match cam.lookup(&hdr.dst) {
        Some(hit) if hdr.dst != BROADCAST => vec![hit],
        _ => (0..bridge.port_count()).collect(),
    };

    for egress in candidates {
        if egress == ingress {
            continue;
        }
        send_to_egress(bridge, link, egress, raw, effective_vlan, arrived_tagged);
    }
}

/// Computes the effective VLAN for an ingress frame, dropping (and logging)
/// frames whose tagging doesn't match their port kind: a tagged frame on an
/// access port or an untagged frame on a trunk has no well-defined VLAN to
/// forward on, so we drop rather than guess.
fn effective_vlan(bridge: &Bridge, ingress: usize, hdr: &ParsedHeader) -> Option<u16> {
    match bridge.port_kind(ingress) {
        PortKind::Access { vlan } => {
            if hdr.vlan.is_some() {
                warn!(
                    port = ingress,
                    name = bridge.port_name(ingress),
                    "dropping tagged frame received on access port"
                );
                return None;
            }
            Some(vlan)
        }
        PortKind::Trunk => match hdr.vlan {
            Some(vlan) => Some(vlan),
            None => {
                warn!(
                    port = ingress,
                    name = bridge.port_name(ingress),
                    "dropping untagged frame received on trunk port"
                );
                None
            }
        },
    }
}

fn send_to_egress(
    bridge: &Bridge,
    link: &dyn LinkSend,
    egress: usize,
    raw: &[u8],
    effective_vlan: u16,
    arrived_tagged: bool,
) {
    match bridge.port_kind(egress) {
        PortKind::Access { vlan } => {
            if vlan != effective_vlan {
                return;
            }
            let out = if arrived_tagged {
                frame::strip_tag(raw)
            } else {
                raw.to_vec()
            };
            link.send_to_link(egress, &out);
        }
        PortKind::Trunk => {
            if bridge.port_state(egress) == StpState::Blocking {
                trace!(port = egress, "skipping blocked trunk for egress");
                return;
            }
            let out = if arrived_tagged {
                raw.to_vec()
            } else {
                frame::insert_tag(raw, effective_vlan)
            };
            link.send_to_link(egress, &out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Bridge;
    use crate::config::{PortConfig, SwitchConfig};
    use crate::frame::parse;
    use crate::link::test_support::MockLink;

    fn bridge_with(ports: Vec<PortConfig>) -> Bridge {
        Bridge::new(SwitchConfig {
            bridge_priority: 10,
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

    fn untagged_frame(dst: [u8; 6], src: [u8; 6]) -> Vec<u8> {
        let mut buf = vec![0u8; 60];
        buf[0..6].copy_from_slice(&dst);
        buf[6..12].copy_from_slice(&src);
        buf[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
        buf
    }

    // Unknown unicast from an access port floods to the other access port
    // untagged and tags for the trunk, learning the source along the way.
    #[test]
    fn unknown_unicast_floods_and_tags_for_trunk() {
        let bridge = bridge_with(vec![access("r-0", 1), access("r-1", 1), trunk("rr-2")]);
        let mut cam = Cam::new();
        let link = MockLink::new();

        let src = [0x02, 0, 0, 0, 0, 0x01];
        let dst = [0x02, 0, 0, 0, 0, 0x02];
        let raw = untagged_frame(dst, src);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 0, &raw, &hdr);

        assert_eq!(cam.lookup(&src), Some(0));

        let sent = link.drain();
        assert_eq!(sent.len(), 2);
        let (p1, buf1) = &sent[0];
        assert_eq!(*p1, 1);
        assert_eq!(buf1, &raw);
        let (p2, buf2) = &sent[1];
        assert_eq!(*p2, 2);
        let tagged_hdr = parse(buf2).unwrap();
        assert_eq!(tagged_hdr.vlan, Some(1));
    }

    // Once a source has been learned, a reply to it is a known unicast and
    // forwards to that single port.
    #[test]
    fn known_unicast_forwards_to_single_port() {
        let bridge = bridge_with(vec![access("r-0", 1), access("r-1", 1), trunk("rr-2")]);
        let mut cam = Cam::new();
        cam.set([0x02, 0, 0, 0, 0, 0x01], 0);
        let link = MockLink::new();

        let src = [0x02, 0, 0, 0, 0, 0x02];
        let dst = [0x02, 0, 0, 0, 0, 0x01];
        let raw = untagged_frame(dst, src);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 1, &raw, &hdr);

        assert_eq!(cam.lookup(&src), Some(1));
        let sent = link.drain();
        assert_eq!(sent, vec![(0, raw)]);
    }

    #[test]
    fn never_forwards_back_to_ingress_port() {
        let bridge = bridge_with(vec![access("r-0", 1), access("r-1", 1)]);
        let mut cam = Cam::new();
        let link = MockLink::new();
        let raw = untagged_frame(BROADCAST, [0x02, 0, 0, 0, 0, 0x01]);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 0, &raw, &hdr);

        let sent = link.drain();
        assert!(sent.iter().all(|(p, _)| *p != 0));
    }

    // Cross-VLAN isolation holds even through a trunk.
    #[test]
    fn cross_vlan_isolation_through_trunk() {
        let bridge = bridge_with(vec![access("r-0", 1), access("r-1", 2), trunk("rr-2")]);
        let mut cam = Cam::new();
        let link = MockLink::new();
        let raw = untagged_frame(BROADCAST, [0x02, 0, 0, 0, 0, 0x01]);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 0, &raw, &hdr);

        let sent = link.drain();
        assert!(sent.iter().all(|(p, _)| *p != 1));
    }

    #[test]
    fn skips_blocked_trunk_on_egress() {
        let bridge = bridge_with(vec![access("r-0", 1), trunk("rr-1"), trunk("rr-2")]);
        bridge.with_locked_state(|step| step.port_states[1] = StpState::Blocking);
        let mut cam = Cam::new();
        let link = MockLink::new();
        let raw = untagged_frame(BROADCAST, [0x02, 0, 0, 0, 0, 0x01]);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 0, &raw, &hdr);

        let sent = link.drain();
        assert!(sent.iter().all(|(p, _)| *p != 1));
        assert!(sent.iter().any(|(p, _)| *p == 2));
    }

    #[test]
    fn drops_tagged_frame_on_access_port() {
        let bridge = bridge_with(vec![access("r-0", 1), trunk("rr-1")]);
        let mut cam = Cam::new();
        let link = MockLink::new();
        let untagged = untagged_frame(BROADCAST, [0x02, 0, 0, 0, 0, 0x01]);
        let tagged = frame::insert_tag(&untagged, 1);
        let hdr = parse(&tagged).unwrap();

        forward_frame(&bridge, &mut cam, &link, 0, &tagged, &hdr);

        assert!(link.drain().is_empty());
    }

    #[test]
    fn drops_untagged_frame_on_trunk_port() {
        let bridge = bridge_with(vec![access("r-0", 1), trunk("rr-1")]);
        let mut cam = Cam::new();
        let link = MockLink::new();
        let raw = untagged_frame(BROADCAST, [0x02, 0, 0, 0, 0, 0x01]);
        let hdr = parse(&raw).unwrap();

        forward_frame(&bridge, &mut cam, &link, 1, &raw, &hdr);

        assert!(link.drain().is_empty());
    }
}
