//! BPDU wire format.
//!
//! This is a custom, non-IEEE 26-byte layout. Encoding/decoding is done with
//! explicit big-endian integer helpers rather than a `repr(C)` struct cast:
//! the fields are plain integers, not MAC-shaped byte arrays, so a struct
//! packer would just obscure the layout without saving anything.

use thiserror::Error;

/// Reserved multicast destination used for control frames in this topology.
/// https://notes.networklessons.com/stp-bpdu-destination-mac-address
pub const BPDU_MAC: [u8; 6] = [0x01, 0x80, 0xC2, 0x00, 0x00, 0x00];

/// Uniform per-link cost contributed to `root_path_cost` on each hop,
/// matching this topology's uniform 100Mbps trunk links.
pub const LINK_COST: u64 = 10;

const BID_LEN: usize = 8;
const COST_LEN: usize = 4;
pub const BPDU_LEN: usize = 6 + BID_LEN + BID_LEN + COST_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BpduError {
    #[error("bpdu frame is {0} bytes, expected exactly {BPDU_LEN}")]
    WrongLength(usize),
}

/// A decoded BPDU: the sender's own bridge ID, and the root identity/cost it
/// is advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bpdu {
    pub own_bid: u64,
    pub root_bid: u64,
    pub root_path_cost: u32,
}

impl Bpdu {
    pub fn decode(buf: &[u8]) -> Result<Self, BpduError> {
        if buf.len() != BPDU_LEN {
            return Err(BpduError::WrongLength(buf.len()));
        }
        let own_bid = u64::from_be_bytes(buf[6..14].try_into().unwrap());
        let root_bid = u64::from_be_bytes(buf[14..22].try_into().unwrap());
        let root_path_cost = u32::from_be_bytes(buf[22..26].try_into().unwrap());
        Ok(Bpdu {
            own_bid,
            root_bid,
            root_path_cost,
        })
    }

    pub fn encode(&self) -> [u8; BPDU_LEN] {
        let mut out = [0u8; BPDU_LEN];
        out[0..6].copy_from_slice(&BPDU_MAC);
        out[6..14].copy_from_slice(&self.own_bid.to_be_bytes());
        out[14..22].copy_from_slice(&self.root_bid.to_be_bytes());
        out[22..26].copy_from_slice(&self.root_path_cost.to_be_bytes());
        out
    }
}

/// True if `buf`'s destination MAC is the STP multicast address. Cheaper
/// than a full parse and used by the data-plane loop to classify ingress
/// before deciding whether to hand off to the forwarding engine or the STP
/// engine.
pub fn is_bpdu_dst(buf: &[u8]) -> bool {
    buf.len() >= 6 && buf[0..6] == BPDU_MAC
}
