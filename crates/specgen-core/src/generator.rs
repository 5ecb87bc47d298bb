//! Host entry point
//!
//! [`Generator::create_or_update`] fetches every specification from the
//! engine and regenerates the project's output directory. The fetch runs
//! first, so an unreachable or misbehaving engine leaves existing output
//! untouched.

use crate::config::GeneratorConfig;
use crate::coordinator::OutputCoordinator;
use crate::error::GeneratorError;
use specgen_protocol::{SpecSourceClient, SpecificationSource, TcpTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Fetch-then-write regeneration
pub struct Generator {
    source: Arc<dyn SpecificationSource>,
    coordinator: OutputCoordinator,
    gate: Mutex<()>,
}

impl Generator {
    /// Create generator from parts
    #[must_use]
    pub fn new(source: Arc<dyn SpecificationSource>, coordinator: OutputCoordinator) -> Self {
        Self {
            source,
            coordinator,
            gate: Mutex::new(()),
        }
    }

    /// Connect to the configured engine and build the filesystem pipeline
    ///
    /// # Errors
    /// - `GeneratorError::Config` if the configuration is invalid
    /// - `GeneratorError::Fetch` if the engine cannot be reached
    pub async fn connect(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;

        let engine = &config.engine;
        let transport =
            TcpTransport::connect(engine.address.as_str(), engine.connect_timeout(), engine.codec())
                .await?;
        let client = SpecSourceClient::new(transport, engine.message_ids.build())
            .with_request_timeout(engine.request_timeout());

        tracing::info!("Connected to specification engine at {}", engine.address);
        Ok(Self::new(Arc::new(client), config.coordinator()))
    }

    /// Coordinator used for writing
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &OutputCoordinator {
        &self.coordinator
    }

    /// Regenerate output for `project_path`, returning the output directory
    ///
    /// Concurrent calls on one generator run one at a time.
    ///
    /// # Errors
    /// - `GeneratorError::Fetch` if the engine fails; nothing is deleted
    /// - `GeneratorError::Write` if regeneration fails
    #[tracing::instrument(skip_all, fields(project = %project_path.display()))]
    pub async fn create_or_update(
        &self,
        project_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, GeneratorError> {
        let _running = self.gate.lock().await;

        let result = self.run(project_path, cancel).await;
        match &result {
            Ok(output) => tracing::info!("Regenerated {}", output.display()),
            Err(e) => tracing::error!("Regeneration failed: {}", e),
        }
        result
    }

    async fn run(
        &self,
        project_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, GeneratorError> {
        let specifications = self.source.fetch_all_specifications(cancel).await?;
        tracing::info!("Fetched {} specifications", specifications.len());

        let output = self
            .coordinator
            .write_specifications(specifications, project_path, cancel)
            .await?;
        Ok(output)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
