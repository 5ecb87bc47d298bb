//! Frame codec
//!
//! Wire layout of one frame:
//!
//! ```text
//! [len: u32 big-endian][body: len bytes of JSON ApiMessage]
//! ```
//!
//! The declared length is checked against `max_frame_bytes` before any
//! body bytes are buffered.

use crate::error::CodecError;
use crate::message::ApiMessage;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default upper bound on a single frame body
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Length-prefixed JSON framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_bytes: usize,
}

impl FrameCodec {
    /// Codec with a frame size limit
    #[inline]
    #[must_use]
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    /// Configured frame size limit
    #[inline]
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Encode one envelope into a complete frame
    ///
    /// # Errors
    /// `CodecError::FrameTooLarge` if the body exceeds the limit.
    pub fn encode(&self, message: &ApiMessage) -> Result<Vec<u8>, CodecError> {
        let body = serde_json::to_vec(message)?;
        let len = self.check_len(body.len())?;

        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Write one envelope and flush
    ///
    /// # Errors
    /// `CodecError::Io` on stream failure, `FrameTooLarge` on oversize body.
    pub async fn write_frame<W>(&self, writer: &mut W, message: &ApiMessage) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let frame = self.encode(message)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read one envelope
    ///
    /// # Errors
    /// - `CodecError::Closed` on EOF before the length prefix
    /// - `CodecError::Io` on EOF inside a frame or other stream failure
    /// - `CodecError::FrameTooLarge` if the declared length is over the limit
    /// - `CodecError::Malformed` if the body is not an envelope
    pub async fn read_frame<R>(&self, reader: &mut R) -> Result<ApiMessage, CodecError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut prefix = [0u8; 4];
        match reader.read_exact(&mut prefix).await {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(CodecError::Closed);
            }
            Err(err) => return Err(CodecError::Io(err)),
        }

        let len = u32::from_be_bytes(prefix) as usize;
        if len > self.max_frame_bytes {
            return Err(CodecError::FrameTooLarge {
                len,
                max: self.max_frame_bytes,
            });
        }

        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await?;

        Ok(serde_json::from_slice(&body)?)
    }

    fn check_len(&self, len: usize) -> Result<u32, CodecError> {
        let too_large = || CodecError::FrameTooLarge {
            len,
            max: self.max_frame_bytes,
        };

        if len > self.max_frame_bytes {
            return Err(too_large());
        }
        u32::try_from(len).map_err(|_| too_large())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}
