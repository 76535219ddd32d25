//! Frame dispatch
//!
//! Stateless entry points that turn the next bytes of a connection into one
//! typed frame, and a typed frame back into bytes. The caller owns the read
//! loop and decides what to do with the connection after an error; nothing
//! here skips ahead or resynchronizes.

use bytes::{Buf, Bytes};
use crate::error::Result;
use crate::frame::Frame;
use crate::header::{FrameHeader, HEADER_LEN};

/// Encode a frame for transport
pub fn encode(frame: &Frame) -> Result<Bytes> {
    frame.encode()
}

/// Decode exactly one frame from `src`.
///
/// Reads the header, selects the variant by its type byte, and hands the
/// rest of the source to that variant. Bytes read before a failure stay
/// consumed.
pub fn decode_one<B: Buf>(src: &mut B) -> Result<Frame> {
    let header = FrameHeader::decode(src)?;
    Frame::decode_body(header, src)
}

/// Look at the next header without consuming anything
pub fn peek_header(buf: &[u8]) -> Option<FrameHeader> {
    if buf.len() < HEADER_LEN {
        return None;
    }
    let mut head = &buf[..HEADER_LEN];
    FrameHeader::decode(&mut head).ok()
}
