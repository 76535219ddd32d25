//! Frame codec for async streams

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::dispatch;
use crate::error::{ProtocolError, Result};
use crate::frame::Frame;
use crate::header::HEADER_LEN;

/// Frame codec for encoding/decoding frames over async streams.
///
/// Owns the read buffer of one connection. Use one codec per connection and
/// read from it sequentially.
pub struct FrameCodec {
    /// Read buffer for incoming data
    read_buf: BytesMut,
    /// Codec settings
    config: CodecConfig,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a new frame codec with default settings
    pub fn new() -> Self {
        let config = CodecConfig::default();
        Self {
            read_buf: BytesMut::with_capacity(config.read_buffer_capacity),
            config,
        }
    }

    /// Create a new frame codec with custom settings
    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            read_buf: BytesMut::with_capacity(config.read_buffer_capacity),
            config,
        })
    }

    /// Codec settings
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a frame to bytes
    pub fn encode_frame(&self, frame: &Frame) -> Result<Bytes> {
        dispatch::encode(frame)
    }

    /// Write a frame to an async writer.
    ///
    /// The frame is fully encoded before the first write, so a frame that
    /// fails to encode leaves the writer untouched.
    pub async fn write_frame<W>(&self, writer: &mut W, frame: &Frame) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let encoded = self.encode_frame(frame)?;
        write_encoded(writer, &encoded, self.config.flush_on_write).await?;
        trace!(
            frame_type = frame.frame_type().name(),
            stream_id = frame.stream_id(),
            length = encoded.len() - HEADER_LEN,
            "frame written"
        );
        Ok(())
    }

    /// Read a frame from an async reader.
    ///
    /// Returns `Ok(None)` at a clean end of stream between frames. End of
    /// stream inside a frame is [`ProtocolError::TruncatedInput`].
    pub async fn read_frame<R>(&mut self, reader: &mut R) -> Result<Option<Frame>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            // Try to decode a frame from the buffer
            if let Some(frame) = self.try_decode_frame()? {
                return Ok(Some(frame));
            }

            let n = reader.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                if self.read_buf.is_empty() {
                    debug!("end of stream");
                    return Ok(None);
                }
                let needed = dispatch::peek_header(&self.read_buf)
                    .map_or(HEADER_LEN, |header| header.frame_len());
                return Err(ProtocolError::TruncatedInput {
                    needed,
                    available: self.read_buf.len(),
                });
            }
        }
    }

    /// Try to decode a frame from the internal buffer.
    ///
    /// Returns `Ok(None)` without consuming anything while the header or the
    /// declared payload is incomplete. A header that cannot be accepted is
    /// consumed on its own and reported; the bytes behind it are left in
    /// place for the caller to deal with.
    pub fn try_decode_frame(&mut self) -> Result<Option<Frame>> {
        let Some(header) = dispatch::peek_header(&self.read_buf) else {
            return Ok(None);
        };

        if header.kind().is_none() {
            self.read_buf.advance(HEADER_LEN);
            return Err(ProtocolError::UnknownFrameType {
                frame_type: header.frame_type,
                length: header.length,
                stream_id: header.stream_id,
            });
        }

        if header.length > self.config.max_payload_len {
            self.read_buf.advance(HEADER_LEN);
            return Err(ProtocolError::PayloadTooLarge {
                declared: header.length,
                max: self.config.max_payload_len,
            });
        }

        if self.read_buf.len() < header.frame_len() {
            return Ok(None);
        }

        let mut frame_data = self.read_buf.split_to(header.frame_len()).freeze();
        let frame = dispatch::decode_one(&mut frame_data)?;
        trace!(
            frame_type = frame.frame_type().name(),
            stream_id = frame.stream_id(),
            length = header.length,
            "frame read"
        );
        Ok(Some(frame))
    }

    /// Append raw bytes to the read buffer
    pub fn feed(&mut self, data: &[u8]) {
        self.read_buf.extend_from_slice(data);
    }

    /// Get the current buffer size
    pub fn buffer_size(&self) -> usize {
        self.read_buf.len()
    }

    /// Clear the internal buffer
    pub fn clear_buffer(&mut self) {
        self.read_buf.clear();
    }
}

async fn write_encoded<W>(writer: &mut W, encoded: &[u8], flush: bool) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encoded).await?;
    if flush {
        writer.flush().await?;
    }
    Ok(())
}

/// Outbound side of a connection, as seen by a session
#[async_trait]
pub trait FrameSender: Send {
    /// Send one frame
    async fn send_frame(&mut self, frame: Frame) -> Result<()>;

    /// Stop sending and release the underlying writer
    async fn close(&mut self) -> Result<()>;
}

/// [`FrameSender`] over an async writer
pub struct FrameWriter<W> {
    writer: W,
    config: CodecConfig,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer with default settings
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            config: CodecConfig::default(),
        }
    }

    /// Wrap a writer with custom settings
    pub fn with_config(writer: W, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { writer, config })
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> FrameSender for FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: Frame) -> Result<()> {
        let encoded = dispatch::encode(&frame)?;
        write_encoded(&mut self.writer, &encoded, self.config.flush_on_write).await?;
        trace!(
            frame_type = frame.frame_type().name(),
            stream_id = frame.stream_id(),
            "frame sent"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        debug!("frame writer closed");
        Ok(())
    }
}
