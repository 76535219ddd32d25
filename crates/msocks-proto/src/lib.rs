//! # msocks protocol
//!
//! Frame codec for the msocks multiplexed tunneling protocol: many logical
//! streams carried over one connection, each frame tagged with a stream id.
//!
//! ```text
//! Frame   := Header Payload
//! Header  := type:u8 payload_length:u16 stream_id:u16
//! LString := length:u16 bytes[length]
//! ```
//!
//! All integers are big-endian.

#![warn(missing_docs)]

/// Primitive wire codecs
pub mod wire;

/// Fixed frame header
pub mod header;

/// Frame variants and payload codecs
pub mod frame;

/// Stateless frame dispatch
pub mod dispatch;

/// Error codes carried by FAILED frames
pub mod error_code;

/// Frame codec for async streams
pub mod codec;

/// Codec configuration
pub mod config;

/// Error types for protocol operations
pub mod error;

pub use frame::{Frame, FrameBody, MAX_PAYLOAD_LEN};
pub use header::{FrameHeader, FrameType, HEADER_LEN};
pub use dispatch::{decode_one, encode};
pub use error_code::ErrorCode;
pub use codec::{FrameCodec, FrameSender, FrameWriter};
pub use config::CodecConfig;
pub use error::{ProtocolError, Result};
