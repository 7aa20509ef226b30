//! Ethernet + 802.1Q frame codec (C3).
//!
//! Pure and stateless: no policy, no port table, no learning. Everything
//! here is safe to unit test in isolation from the rest of the bridge.

use thiserror::Error;

/// This topology's 802.1Q TPID. Not the IEEE-standard `0x8100`. Fixed at
/// this value because every switch and trunk in this topology is under our
/// own control and agrees on it.
pub const TPID: u16 = 0x8200;

const UNTAGGED_HEADER_LEN: usize = 14;
const TAGGED_HEADER_LEN: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame of {0} bytes is shorter than the minimum untagged header of {UNTAGGED_HEADER_LEN}")]
    TooShortForHeader(usize),
    #[error("tagged frame of {0} bytes is shorter than the minimum tagged header of {TAGGED_HEADER_LEN}")]
    TooShortForTag(usize),
}

/// The parsed fields of an ingress frame. Does not own the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ethertype: u16,
    /// `Some(vid)` if the frame carried an 802.1Q tag with this TPID, else `None`.
    pub vlan: Option<u16>,
}

/// Parses the destination, source, ethertype and (if present) VLAN tag out
/// of a raw frame. Rejects buffers shorter than the header they claim to have.
pub fn parse(buf: &[u8]) -> Result<ParsedHeader, FrameError> {
    if buf.len() < UNTAGGED_HEADER_LEN {
        return Err(FrameError::TooShortForHeader(buf.len()));
    }

    let mut dst = [0u8; 6];
    let mut src = [0u8; 6];
    dst.copy_from_slice(&buf[0..6]);
    src.copy_from_slice(&buf[6..12]);

    let tpid = u16::from_be_bytes([buf[12], buf[13]]);
    if tpid != TPID {
        let ethertype = tpid;
        return Ok(ParsedHeader {
            dst,
            src,
            ethertype,
            vlan: None,
        });
    }

    if buf.len() < TAGGED_HEADER_LEN {
        return Err(FrameError::TooShortForTag(buf.len()));
    }
    let tci = u16::from_be_bytes([buf[14], buf[15]]);
    let vid = tci & 0x0FFF;
    let ethertype = u16::from_be_bytes([buf[16], buf[17]]);

    Ok(ParsedHeader {
        dst,
        src,
        ethertype,
        vlan: Some(vid),
    })
}

/// Splices an 802.1Q tag carrying `vid` (masked to 12 bits) right after the
/// source MAC. The caller is responsible for knowing the frame isn't already
/// tagged; this function never inspects bytes [12, 14).
pub fn insert_tag(buf: &[u8], vid: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() + 4);
    out.extend_from_slice(&buf[0..12]);
    out.extend_from_slice(&TPID.to_be_bytes());
    out.extend_from_slice(&(vid & 0x0FFF).to_be_bytes());
    out.extend_from_slice(&buf[12..]);
    out
}

/// Drops the 4-byte 802.1Q tag at offset 12. Caller must have already
/// verified a tag is present (e.g. via `parse`).
pub fn strip_tag(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() - 4);
    out.extend_from_slice(&buf[0..12]);
    out.extend_from_slice(&buf[16..]);
    out
}
