//! Error types for protocol operations

use thiserror::Error;
use crate::header::FrameHeader;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Fewer bytes were available than a declared length demands
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Bytes the decoder needed
        needed: usize,
        /// Bytes the source actually provided
        available: usize,
    },

    /// Declared payload length disagrees with the shape of the variant
    #[error("Length mismatch in frame type {frame_type} on stream {stream_id}: declared {declared}, computed {actual}")]
    LengthMismatch {
        /// Raw frame type byte
        frame_type: u8,
        /// Stream the frame was addressed to
        stream_id: u16,
        /// Payload length from the header
        declared: u16,
        /// Payload length implied by the decoded fields
        actual: usize,
    },

    /// Header type byte matches no known frame kind
    #[error("Unknown frame: type({frame_type}), length({length}), streamid({stream_id})")]
    UnknownFrameType {
        /// Raw frame type byte
        frame_type: u8,
        /// Declared payload length
        length: u16,
        /// Declared stream id
        stream_id: u16,
    },

    /// Field too long for its 16-bit length prefix
    #[error("Field `{field}` too large: {size} bytes (max: {max})")]
    OversizedField {
        /// Name of the offending field
        field: &'static str,
        /// Actual size
        size: usize,
        /// Maximum representable size
        max: usize,
    },

    /// Inbound header declares more payload than the codec accepts
    #[error("Payload too large: {declared} bytes (max: {max})")]
    PayloadTooLarge {
        /// Declared payload length
        declared: u16,
        /// Configured limit
        max: u16,
    },

    /// Invalid codec configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error from the underlying source or sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether this error reports a source that ran out of bytes
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedInput { .. })
    }

    /// Whether the byte stream can no longer be trusted after this error.
    ///
    /// Partial frames cannot be un-read, so every decode failure leaves the
    /// connection at an unknown position. Encode-side and configuration
    /// errors write nothing and leave the connection usable.
    pub fn is_fatal_to_connection(&self) -> bool {
        !matches!(self, Self::OversizedField { .. } | Self::Config(_))
    }

    /// Header context carried by the error, if any
    pub fn header(&self) -> Option<FrameHeader> {
        match *self {
            Self::UnknownFrameType { frame_type, length, stream_id } => {
                Some(FrameHeader::new(frame_type, length, stream_id))
            }
            Self::LengthMismatch { frame_type, stream_id, declared, .. } => {
                Some(FrameHeader::new(frame_type, declared, stream_id))
            }
            _ => None,
        }
    }
}

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
