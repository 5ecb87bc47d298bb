//! Specification source client
//!
//! One request, one correlated response, one exchange at a time.
//!
//! # Exchange rules
//! - The connection is held behind an async mutex for the whole exchange
//! - Responses whose message id differs from the request are skipped
//! - Every exchange is bounded by the request timeout and the caller's
//!   cancellation token
//! - An exchange abandoned mid-stream marks the connection unusable

use crate::error::{ClientError, CodecError};
use crate::ids::MessageIdSource;
use crate::message::{ApiMessage, MessageType};
use crate::transport::Transport;
use async_trait::async_trait;
use specgen_model::Specification;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Default deadline for one request/response exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce the complete specification set
#[async_trait]
pub trait SpecificationSource: Send + Sync {
    /// Fetch every specification, in engine order
    async fn fetch_all_specifications(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Specification>, ClientError>;
}

#[derive(Debug)]
struct Connection<T> {
    transport: T,
    desynchronized: bool,
}

/// Client for the specification engine
#[derive(Debug)]
pub struct SpecSourceClient<T> {
    connection: Mutex<Connection<T>>,
    ids: Arc<dyn MessageIdSource>,
    request_timeout: Duration,
}

impl<T: Transport> SpecSourceClient<T> {
    /// Create client over an established transport
    #[must_use]
    pub fn new(transport: T, ids: Arc<dyn MessageIdSource>) -> Self {
        Self {
            connection: Mutex::new(Connection {
                transport,
                desynchronized: false,
            }),
            ids,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send `request` and wait for the response carrying the same id
    ///
    /// # Errors
    /// - `ClientError::Cancelled` if `cancel` fires first
    /// - `ClientError::Timeout` if the deadline passes
    /// - `ClientError::Connection` on transport failure or a previously
    ///   abandoned exchange
    /// - `ClientError::Protocol` on an undecodable frame
    ///
    /// Cancellation, timeouts, transport failures and oversize frames leave
    /// the stream at an unknown position and poison the connection. A
    /// cancellation observed before sending and a complete frame that fails
    /// to decode do not.
    pub async fn exchange(
        &self,
        request: ApiMessage,
        cancel: &CancellationToken,
    ) -> Result<ApiMessage, ClientError> {
        let mut connection = self.connection.lock().await;

        if connection.desynchronized {
            return Err(ClientError::connection(
                "connection left mid-frame by an abandoned exchange; reconnect",
            ));
        }

        // Nothing has been written yet, so the stream stays usable
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let message_id = request.message_id;
        let timeout = self.request_timeout;

        let (outcome, aligned) = tokio::select! {
            biased;
            () = cancel.cancelled() => (Err(ClientError::Cancelled), false),
            result = tokio::time::timeout(timeout, round_trip(&mut connection.transport, &request)) => {
                match result {
                    Ok(Ok(response)) => (Ok(response), true),
                    Ok(Err(err)) => {
                        let aligned = err.leaves_stream_aligned();
                        (Err(err.into()), aligned)
                    }
                    Err(_) => (Err(ClientError::Timeout { message_id, timeout }), false),
                }
            }
        };

        if !aligned {
            connection.desynchronized = true;
        }

        outcome
    }
}

#[async_trait]
impl<T: Transport> SpecificationSource for SpecSourceClient<T> {
    #[tracing::instrument(skip_all, fields(message_id))]
    async fn fetch_all_specifications(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Specification>, ClientError> {
        let message_id = self.ids.next_id();
        tracing::Span::current().record("message_id", message_id);

        let response = self
            .exchange(ApiMessage::get_all_specs(message_id), cancel)
            .await?;
        let specifications = parse_all_specs_response(response)?;

        tracing::info!(
            specifications = specifications.len(),
            "fetched specifications from engine"
        );
        Ok(specifications)
    }
}

/// Interpret a correlated response to `GetAllSpecsRequest`
///
/// # Errors
/// `ClientError::Protocol` if the response is not an `AllSpecsResponse`
/// or lacks required fields.
pub fn parse_all_specs_response(response: ApiMessage) -> Result<Vec<Specification>, ClientError> {
    match response.message_type {
        MessageType::AllSpecsResponse => {}
        MessageType::ErrorResponse => {
            let detail = response
                .error_response
                .map(|e| e.message)
                .unwrap_or_default();
            return Err(ClientError::protocol(format!(
                "engine answered with ErrorResponse: {detail}"
            )));
        }
        other => {
            return Err(ClientError::protocol(format!(
                "expected AllSpecsResponse, got {other}"
            )));
        }
    }

    response
        .all_specs_response
        .ok_or_else(|| ClientError::protocol("AllSpecsResponse without payload"))?
        .into_specifications()
}

async fn round_trip<T: Transport>(
    transport: &mut T,
    request: &ApiMessage,
) -> Result<ApiMessage, CodecError> {
    transport.send(request).await?;

    loop {
        let response = transport.receive().await?;
        if response.message_id == request.message_id {
            tracing::debug!(message_type = %response.message_type, "received response");
            return Ok(response);
        }

        tracing::warn!(
            expected = request.message_id,
            received = response.message_id,
            message_type = %response.message_type,
            "skipping uncorrelated message"
        );
    }
}
