//! Frame variants and their payload codecs

use std::borrow::Cow;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::error_code::ErrorCode;
use crate::header::{FrameHeader, FrameType, CONNECTION_STREAM_ID, HEADER_LEN};
use crate::wire::{self, STRING_PREFIX_LEN};

/// Largest payload a single frame can carry
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Combined username and password bytes an AUTH frame can carry
pub const MAX_AUTH_CREDENTIALS_LEN: usize = MAX_PAYLOAD_LEN - 2 * STRING_PREFIX_LEN;

/// Payload of a frame, one variant per frame kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    /// Request accepted
    Ok,
    /// Request failed
    Failed {
        /// Opaque error number, usually an [`ErrorCode`]
        errno: u32,
    },
    /// Plaintext credentials
    Auth {
        /// Raw username bytes
        username: Bytes,
        /// Raw password bytes
        password: Bytes,
    },
    /// Stream payload
    Data {
        /// Opaque bytes
        data: Bytes,
    },
    /// Open a stream to a target
    Syn {
        /// Raw target address, usually `host:port`
        address: Bytes,
    },
    /// Flow-control window update
    Ack {
        /// Opaque window value
        window: u32,
    },
    /// Graceful stream close
    Fin,
    /// Stream reset
    Rst,
    /// Liveness probe
    Ping,
}

impl FrameBody {
    /// Kind of frame this body belongs to
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Ok => FrameType::Ok,
            Self::Failed { .. } => FrameType::Failed,
            Self::Auth { .. } => FrameType::Auth,
            Self::Data { .. } => FrameType::Data,
            Self::Syn { .. } => FrameType::Syn,
            Self::Ack { .. } => FrameType::Ack,
            Self::Fin => FrameType::Fin,
            Self::Rst => FrameType::Rst,
            Self::Ping => FrameType::Ping,
        }
    }

    /// Serialized payload size, without the 16-bit limit check
    pub fn payload_size(&self) -> usize {
        match self {
            Self::Ok | Self::Fin | Self::Rst | Self::Ping => 0,
            Self::Failed { .. } | Self::Ack { .. } => 4,
            Self::Auth { username, password } => {
                username.len() + password.len() + 2 * STRING_PREFIX_LEN
            }
            Self::Data { data } => data.len(),
            Self::Syn { address } => address.len() + STRING_PREFIX_LEN,
        }
    }

    /// Serialized payload size, checked against the wire limits
    pub fn payload_len(&self) -> Result<u16> {
        match self {
            Self::Auth { username, password } => {
                wire::check_len("username", username.len())?;
                wire::check_len("password", password.len())?;
            }
            Self::Data { data } => {
                wire::check_len("data", data.len())?;
            }
            Self::Syn { address } => {
                wire::check_len("address", address.len())?;
            }
            _ => {}
        }
        wire::check_len("payload", self.payload_size())
    }

    fn encode_payload<B: BufMut>(&self, dst: &mut B) -> Result<()> {
        match self {
            Self::Ok | Self::Fin | Self::Rst | Self::Ping => {}
            Self::Failed { errno } => dst.put_u32(*errno),
            Self::Auth { username, password } => {
                wire::write_string(dst, username)?;
                wire::write_string(dst, password)?;
            }
            Self::Data { data } => dst.put_slice(data),
            Self::Syn { address } => wire::write_string(dst, address)?,
            Self::Ack { window } => dst.put_u32(*window),
        }
        Ok(())
    }

    /// Decode a complete payload for a known kind.
    ///
    /// `payload` must hold exactly `header.length` bytes.
    fn decode(kind: FrameType, header: &FrameHeader, mut payload: Bytes) -> Result<Self> {
        let body = match kind {
            FrameType::Ok => {
                expect_len(header, 0)?;
                Self::Ok
            }
            FrameType::Failed => {
                expect_len(header, 4)?;
                Self::Failed { errno: payload.get_u32() }
            }
            FrameType::Auth => {
                let username = read_field(&mut payload, header)?;
                let password = read_field(&mut payload, header)?;
                Self::Auth { username, password }
            }
            FrameType::Data => Self::Data { data: std::mem::take(&mut payload) },
            FrameType::Syn => {
                let address = read_field(&mut payload, header)?;
                Self::Syn { address }
            }
            FrameType::Ack => {
                expect_len(header, 4)?;
                Self::Ack { window: payload.get_u32() }
            }
            FrameType::Fin => {
                expect_len(header, 0)?;
                Self::Fin
            }
            FrameType::Rst => {
                expect_len(header, 0)?;
                Self::Rst
            }
            FrameType::Ping => {
                expect_len(header, 0)?;
                Self::Ping
            }
        };

        // Sub-fields plus their overhead must account for every declared byte
        if payload.has_remaining() {
            return Err(length_mismatch(header, header.length as usize - payload.remaining()));
        }
        Ok(body)
    }
}

fn length_mismatch(header: &FrameHeader, actual: usize) -> ProtocolError {
    ProtocolError::LengthMismatch {
        frame_type: header.frame_type,
        stream_id: header.stream_id,
        declared: header.length,
        actual,
    }
}

fn expect_len(header: &FrameHeader, expected: usize) -> Result<()> {
    if header.length as usize != expected {
        return Err(length_mismatch(header, expected));
    }
    Ok(())
}

/// Read a length-prefixed string that must fit inside the declared payload
fn read_field(payload: &mut Bytes, header: &FrameHeader) -> Result<Bytes> {
    let consumed = header.length as usize - payload.remaining();
    if payload.remaining() < STRING_PREFIX_LEN {
        return Err(length_mismatch(header, consumed + STRING_PREFIX_LEN));
    }
    let len = payload.get_u16() as usize;
    if payload.remaining() < len {
        return Err(length_mismatch(header, consumed + STRING_PREFIX_LEN + len));
    }
    Ok(payload.split_to(len))
}

/// A single protocol frame.
///
/// The header is never stored: type and length are derived from the body
/// whenever the frame is encoded, so they cannot disagree with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    stream_id: u16,
    body: FrameBody,
}

impl Frame {
    /// Create a frame from a stream id and body
    pub fn new(stream_id: u16, body: FrameBody) -> Self {
        Self { stream_id, body }
    }

    /// Create an OK frame
    pub fn ok(stream_id: u16) -> Self {
        Self::new(stream_id, FrameBody::Ok)
    }

    /// Create a FAILED frame with a raw error number
    pub fn failed(stream_id: u16, errno: u32) -> Self {
        Self::new(stream_id, FrameBody::Failed { errno })
    }

    /// Create a FAILED frame from a known error code
    pub fn failed_with(stream_id: u16, code: ErrorCode) -> Self {
        Self::failed(stream_id, code.into())
    }

    /// Create an AUTH frame
    pub fn auth(stream_id: u16, username: impl Into<Bytes>, password: impl Into<Bytes>) -> Self {
        Self::new(
            stream_id,
            FrameBody::Auth {
                username: username.into(),
                password: password.into(),
            },
        )
    }

    /// Create a DATA frame
    pub fn data(stream_id: u16, data: impl Into<Bytes>) -> Self {
        Self::new(stream_id, FrameBody::Data { data: data.into() })
    }

    /// Create a SYN frame asking the peer to open a stream to `address`
    pub fn syn(stream_id: u16, address: impl Into<Bytes>) -> Self {
        Self::new(stream_id, FrameBody::Syn { address: address.into() })
    }

    /// Create an ACK frame
    pub fn ack(stream_id: u16, window: u32) -> Self {
        Self::new(stream_id, FrameBody::Ack { window })
    }

    /// Create a FIN frame
    pub fn fin(stream_id: u16) -> Self {
        Self::new(stream_id, FrameBody::Fin)
    }

    /// Create an RST frame
    pub fn rst(stream_id: u16) -> Self {
        Self::new(stream_id, FrameBody::Rst)
    }

    /// Create a PING frame on the connection-level stream
    pub fn ping() -> Self {
        Self::new(CONNECTION_STREAM_ID, FrameBody::Ping)
    }

    /// Split `data` into as many DATA frames as needed.
    ///
    /// Empty input yields no frames.
    pub fn split_data(stream_id: u16, data: impl Into<Bytes>) -> Vec<Self> {
        let mut data = data.into();
        let mut frames = Vec::with_capacity(data.len().div_ceil(MAX_PAYLOAD_LEN));
        while !data.is_empty() {
            let chunk = data.split_to(data.len().min(MAX_PAYLOAD_LEN));
            frames.push(Self::data(stream_id, chunk));
        }
        frames
    }

    /// Stream this frame belongs to
    pub fn stream_id(&self) -> u16 {
        self.stream_id
    }

    /// Kind of this frame
    pub fn frame_type(&self) -> FrameType {
        self.body.frame_type()
    }

    /// Frame payload
    pub fn body(&self) -> &FrameBody {
        &self.body
    }

    /// Consume the frame, returning its payload
    pub fn into_body(self) -> FrameBody {
        self.body
    }

    /// Whether the frame is bound to the connection rather than a stream
    pub fn is_connection_level(&self) -> bool {
        self.stream_id == CONNECTION_STREAM_ID
    }

    /// Checked payload length
    pub fn payload_len(&self) -> Result<u16> {
        self.body.payload_len()
    }

    /// Total encoded size including the header
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.payload_size()
    }

    /// Header this frame encodes with
    pub fn header(&self) -> Result<FrameHeader> {
        Ok(FrameHeader::new(
            self.frame_type().code(),
            self.payload_len()?,
            self.stream_id,
        ))
    }

    /// Known error code of a FAILED frame
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self.body {
            FrameBody::Failed { errno } => ErrorCode::try_from(errno).ok(),
            _ => None,
        }
    }

    /// SYN target address as text, invalid UTF-8 replaced
    pub fn address_lossy(&self) -> Option<Cow<'_, str>> {
        match &self.body {
            FrameBody::Syn { address } => Some(String::from_utf8_lossy(address)),
            _ => None,
        }
    }

    /// AUTH username as text, invalid UTF-8 replaced
    pub fn username_lossy(&self) -> Option<Cow<'_, str>> {
        match &self.body {
            FrameBody::Auth { username, .. } => Some(String::from_utf8_lossy(username)),
            _ => None,
        }
    }

    /// Append the encoded frame to `dst`.
    ///
    /// Sizes are checked first; on error nothing is written.
    pub fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        let header = self.header()?;
        dst.reserve(header.frame_len());
        header.encode_to(dst);
        self.body.encode_payload(dst)
    }

    /// Encode the frame into a new buffer
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode the payload that follows an already-read header.
    ///
    /// The full declared payload is taken from `src` before its shape is
    /// validated, so a mismatch never leaves part of the payload unread.
    pub fn decode_body<B: Buf>(header: FrameHeader, src: &mut B) -> Result<Self> {
        let kind = header.kind().ok_or(ProtocolError::UnknownFrameType {
            frame_type: header.frame_type,
            length: header.length,
            stream_id: header.stream_id,
        })?;
        let payload = wire::take_bytes(src, header.length as usize)?;
        let body = FrameBody::decode(kind, &header, payload)?;
        Ok(Self::new(header.stream_id, body))
    }

    /// Emit a one-line debug summary of this frame
    pub fn log_debug(&self) {
        let frame_type = self.frame_type().name();
        let length = self.body.payload_size();
        match &self.body {
            FrameBody::Syn { .. } => debug!(
                frame_type,
                stream_id = self.stream_id,
                length,
                address = %self.address_lossy().unwrap_or_default(),
                "frame"
            ),
            FrameBody::Ack { window } => debug!(
                frame_type,
                stream_id = self.stream_id,
                length,
                window = *window,
                "frame"
            ),
            FrameBody::Failed { errno } => debug!(
                frame_type,
                stream_id = self.stream_id,
                length,
                errno = *errno,
                "frame"
            ),
            _ => debug!(frame_type, stream_id = self.stream_id, length, "frame"),
        }
    }
}
