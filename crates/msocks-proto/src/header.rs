//! Fixed frame header
//!
//! ```text
//! +--------+----------------+----------------+
//! |  type  | payload_length |   stream_id    |
//! |   u8   |     u16 BE     |     u16 BE     |
//! +--------+----------------+----------------+
//! ```
//!
//! The header carries no version field. Widening any of these fields breaks
//! every deployed peer.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use crate::error::{ProtocolError, Result};
use crate::wire;

/// Encoded header size in bytes
pub const HEADER_LEN: usize = 5;

/// Stream id reserved for connection-level frames
pub const CONNECTION_STREAM_ID: u16 = 0;

/// Frame kinds understood by this codec.
///
/// Value `0` is reserved. New kinds take the next unused code; existing codes
/// are never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameType {
    /// Request accepted
    Ok = 1,
    /// Request failed, carries an error code
    Failed = 2,
    /// Username/password authentication
    Auth = 3,
    /// Stream payload bytes
    Data = 4,
    /// Open a stream to a target address
    Syn = 5,
    /// Flow-control window update
    Ack = 6,
    /// Graceful stream close
    Fin = 7,
    /// Stream reset
    Rst = 8,
    /// Connection liveness probe
    Ping = 9,
}

impl FrameType {
    /// Wire code of this kind
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ok),
            2 => Some(Self::Failed),
            3 => Some(Self::Auth),
            4 => Some(Self::Data),
            5 => Some(Self::Syn),
            6 => Some(Self::Ack),
            7 => Some(Self::Fin),
            8 => Some(Self::Rst),
            9 => Some(Self::Ping),
            _ => None,
        }
    }

    /// Protocol name of this kind
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::Auth => "AUTH",
            Self::Data => "DATA",
            Self::Syn => "SYN",
            Self::Ack => "ACK",
            Self::Fin => "FIN",
            Self::Rst => "RST",
            Self::Ping => "PING",
        }
    }
}

impl From<FrameType> for u8 {
    fn from(kind: FrameType) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for FrameType {
    type Error = u8;

    fn try_from(code: u8) -> std::result::Result<Self, u8> {
        Self::from_code(code).ok_or(code)
    }
}

/// Raw frame header as it appears on the wire.
///
/// `frame_type` stays a raw byte so headers of unknown kinds can still be
/// read and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Raw type byte
    pub frame_type: u8,
    /// Exact byte count of the payload that follows
    pub length: u16,
    /// Logical stream the frame belongs to
    pub stream_id: u16,
}

impl FrameHeader {
    /// Create a new header
    pub fn new(frame_type: u8, length: u16, stream_id: u16) -> Self {
        Self {
            frame_type,
            length,
            stream_id,
        }
    }

    /// Known kind of this header, if any
    pub fn kind(&self) -> Option<FrameType> {
        FrameType::from_code(self.frame_type)
    }

    /// Total encoded size of the frame this header introduces
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.length as usize
    }

    /// Write the header
    pub fn encode_to<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.frame_type);
        dst.put_u16(self.length);
        dst.put_u16(self.stream_id);
    }

    /// Encode the header into a fixed array
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        self.encode_to(&mut &mut buf[..]);
        buf
    }

    /// Read a header.
    ///
    /// Succeeds for any type byte; kind lookup is the dispatcher's job.
    pub fn decode<B: Buf>(src: &mut B) -> Result<Self> {
        // Check up front so a short header consumes nothing
        if src.remaining() < HEADER_LEN {
            return Err(ProtocolError::TruncatedInput {
                needed: HEADER_LEN,
                available: src.remaining(),
            });
        }
        let frame_type = wire::read_u8(src)?;
        let length = wire::read_u16(src)?;
        let stream_id = wire::read_u16(src)?;
        Ok(Self::new(frame_type, length, stream_id))
    }
}
