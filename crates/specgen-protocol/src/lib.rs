//! specgen Protocol
//!
//! Request/response client for the specification engine.
//!
//! # Architecture
//!
//! ```text
//! SpecSourceClient ──> Transport ──> FrameCodec ──> TCP stream ──> engine
//!        │                                                           │
//!        └──────────── correlated ApiMessage (same id) <─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use specgen_protocol::prelude::*;
//!
//! let transport = TcpTransport::connect("127.0.0.1:1234", timeout, FrameCodec::default()).await?;
//! let client = SpecSourceClient::new(transport, MessageIdStrategy::Monotonic.build());
//! let specs = client.fetch_all_specifications(&CancellationToken::new()).await?;
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod client;
pub mod codec;
pub mod error;
pub mod ids;
pub mod message;
pub mod transport;

// Re-exports for convenience
pub use client::{
    parse_all_specs_response, SpecSourceClient, SpecificationSource, DEFAULT_REQUEST_TIMEOUT,
};
pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_BYTES};
pub use error::{ClientError, CodecError};
pub use ids::{MessageIdSource, MessageIdStrategy, MonotonicIds, RandomIds};
pub use message::{
    AllSpecsResponse, ApiMessage, ErrorResponse, GetAllSpecsRequest, MessageType, ScenarioRecord,
    SpecRecord,
};
pub use transport::{StreamTransport, TcpTransport, Transport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for talking to the specification engine
    pub use crate::{
        ClientError, FrameCodec, MessageIdStrategy, SpecSourceClient, SpecificationSource,
        TcpTransport, Transport,
    };
    pub use tokio_util::sync::CancellationToken;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
