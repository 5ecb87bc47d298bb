//! Duplex transports carrying framed envelopes
//!
//! [`Transport`] is the seam between the client and the byte stream.
//! [`StreamTransport`] frames any `AsyncRead + AsyncWrite` stream; TCP is
//! the production case, in-memory duplex pipes the test case.

use crate::codec::FrameCodec;
use crate::error::{ClientError, CodecError};
use crate::message::ApiMessage;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Bidirectional envelope channel
#[async_trait]
pub trait Transport: Send {
    /// Send one envelope
    async fn send(&mut self, message: &ApiMessage) -> Result<(), CodecError>;

    /// Receive the next envelope
    async fn receive(&mut self) -> Result<ApiMessage, CodecError>;
}

/// Framed transport over a byte stream
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    codec: FrameCodec,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream
    #[inline]
    #[must_use]
    pub fn new(stream: S, codec: FrameCodec) -> Self {
        Self { stream, codec }
    }

    /// Unwrap the stream
    #[inline]
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &ApiMessage) -> Result<(), CodecError> {
        self.codec.write_frame(&mut self.stream, message).await
    }

    async fn receive(&mut self) -> Result<ApiMessage, CodecError> {
        self.codec.read_frame(&mut self.stream).await
    }
}

/// Transport over TCP
pub type TcpTransport = StreamTransport<TcpStream>;

impl TcpTransport {
    /// Connect to the specification engine
    ///
    /// # Errors
    /// `ClientError::Connection` if the engine is unreachable or the
    /// connect deadline passes.
    pub async fn connect<A>(
        addr: A,
        connect_timeout: Duration,
        codec: FrameCodec,
    ) -> Result<Self, ClientError>
    where
        A: ToSocketAddrs + std::fmt::Display,
    {
        let target = addr.to_string();
        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::Connection {
                    message: format!("failed to connect to {target}: {source}"),
                    source: Some(source),
                })
            }
            Err(_) => {
                return Err(ClientError::connection(format!(
                    "connecting to {target} timed out after {}ms",
                    connect_timeout.as_millis()
                )))
            }
        };

        stream
            .set_nodelay(true)
            .map_err(|source| ClientError::Connection {
                message: format!("failed to configure socket: {source}"),
                source: Some(source),
            })?;

        tracing::debug!(engine = %target, "connected to specification engine");
        Ok(Self::new(stream, codec))
    }
}
