//! Testing utilities for specgen workspace
//!
//! Shared fixtures, an in-memory specification source, an in-process fake
//! engine speaking the framed protocol over TCP, and output inspection
//! helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use specgen_model::Specification;
use specgen_protocol::{
    AllSpecsResponse, ApiMessage, ClientError, CodecError, FrameCodec, MessageType,
    SpecificationSource,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn login_flow() -> Specification {
    Specification::new("Login Flow").with_scenarios(["Valid login", "Invalid password"])
}

pub fn checkout() -> Specification {
    Specification::new("Checkout: Basket").with_scenarios(["Pay by card", "Pay [later]"])
}

pub fn blank_named() -> Specification {
    Specification::new("   ").with_scenario("Orphan")
}

pub fn sample_specifications() -> Vec<Specification> {
    vec![login_flow(), checkout()]
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Specification source answering from memory
#[derive(Debug, Clone)]
pub struct InMemorySource {
    reply: Result<Vec<Specification>, String>,
    calls: Arc<Mutex<usize>>,
}

impl InMemorySource {
    pub fn new(specifications: Vec<Specification>) -> Self {
        Self {
            reply: Ok(specifications),
            calls: Arc::default(),
        }
    }

    /// Source failing every fetch with a protocol error
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SpecificationSource for InMemorySource {
    async fn fetch_all_specifications(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Specification>, ClientError> {
        *self.calls.lock().unwrap() += 1;
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.reply.clone().map_err(ClientError::protocol)
    }
}

// ---------------------------------------------------------------------------
// Fake engine
// ---------------------------------------------------------------------------

/// How the fake engine answers each request
#[derive(Debug, Clone)]
pub enum EngineScript {
    /// Correlated `AllSpecsResponse`
    Specs(Vec<Specification>),
    /// Correlated response with a tag the client does not recognize
    WrongType,
    /// Correlated `ErrorResponse`
    EngineError(String),
    /// An uncorrelated message, then the correlated `AllSpecsResponse`
    StaleThenSpecs(Vec<Specification>),
    /// Read the request and never answer
    Silent,
    /// Read the request and close the connection
    Disconnect,
}

/// In-process engine on an ephemeral localhost port
///
/// Stops serving when dropped.
#[derive(Debug)]
pub struct FakeEngine {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<ApiMessage>>>,
    task: JoinHandle<()>,
}

impl FakeEngine {
    pub async fn start(script: EngineScript) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = script.clone();
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    if let Err(e) = serve(stream, script, recorded).await {
                        tracing::debug!("fake engine connection ended: {}", e);
                    }
                });
            }
        });

        Ok(Self {
            addr,
            requests,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every request received so far, across connections
    pub fn requests(&self) -> Vec<ApiMessage> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    script: EngineScript,
    recorded: Arc<Mutex<Vec<ApiMessage>>>,
) -> Result<(), CodecError> {
    let codec = FrameCodec::default();

    loop {
        let request = codec.read_frame(&mut stream).await?;
        let id = request.message_id;
        recorded.lock().unwrap().push(request);

        match &script {
            EngineScript::Specs(specs) => {
                codec.write_frame(&mut stream, &all_specs(id, specs)).await?;
            }
            EngineScript::WrongType => {
                let reply = ApiMessage::empty(id, MessageType::Unknown);
                codec.write_frame(&mut stream, &reply).await?;
            }
            EngineScript::EngineError(message) => {
                codec
                    .write_frame(&mut stream, &ApiMessage::error(id, message.clone()))
                    .await?;
            }
            EngineScript::StaleThenSpecs(specs) => {
                let stale = ApiMessage::empty(id.wrapping_add(1_000), MessageType::Unknown);
                codec.write_frame(&mut stream, &stale).await?;
                codec.write_frame(&mut stream, &all_specs(id, specs)).await?;
            }
            EngineScript::Silent => std::future::pending::<()>().await,
            EngineScript::Disconnect => return Ok(()),
        }
    }
}

fn all_specs(id: i64, specs: &[Specification]) -> ApiMessage {
    ApiMessage::all_specs(id, AllSpecsResponse::from_specifications(specs))
}

// ---------------------------------------------------------------------------
// Output inspection
// ---------------------------------------------------------------------------

/// Sorted entry names of a directory
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Sorted `(name, contents)` of every file in a directory
pub fn snapshot(dir: &Path) -> Vec<(String, String)> {
    entry_names(dir)
        .into_iter()
        .map(|name| {
            let text = std::fs::read_to_string(dir.join(&name)).unwrap();
            (name, text)
        })
        .collect()
}
