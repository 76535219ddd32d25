//! Codec configuration

use serde::{Deserialize, Serialize};
use crate::error::{ProtocolError, Result};
use crate::header::HEADER_LEN;

/// Configuration for [`FrameCodec`](crate::FrameCodec)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest inbound payload accepted
    pub max_payload_len: u16,
    /// Initial capacity of the read buffer
    pub read_buffer_capacity: usize,
    /// Flush the writer after every frame
    pub flush_on_write: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_len: u16::MAX,
            read_buffer_capacity: 8192,
            flush_on_write: true,
        }
    }
}

impl CodecConfig {
    /// Check the configuration for values the codec cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_capacity < HEADER_LEN {
            return Err(ProtocolError::Config(format!(
                "read_buffer_capacity must be at least {} bytes, got {}",
                HEADER_LEN, self.read_buffer_capacity
            )));
        }
        Ok(())
    }

    /// Set the inbound payload limit
    pub fn with_max_payload_len(mut self, max_payload_len: u16) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Set the initial read buffer capacity
    pub fn with_read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    /// Enable or disable flushing after every frame
    pub fn with_flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }
}
