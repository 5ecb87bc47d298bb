//! Generator configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [engine]
//! address = "127.0.0.1:1234"
//! request_timeout_ms = 30000
//!
//! [output]
//! mode = "staged"
//!
//! [synthesis]
//! framework = "nunit"
//! ```

use crate::coordinator::{default_parallelism, OutputCoordinator, OutputMode};
use crate::error::ConfigError;
use crate::services::{FsDeletion, FsSaving, SiblingDirectoryNaming, DEFAULT_DIRECTORY_NAME};
use serde::{Deserialize, Serialize};
use specgen_protocol::{FrameCodec, MessageIdStrategy, DEFAULT_MAX_FRAME_BYTES};
use specgen_synth::{
    CodeSynthesizer, FixedNamespace, TargetLanguage, TestFramework, DEFAULT_RUNNER_NAMESPACE,
};
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Duration;

/// Default engine address
pub const DEFAULT_ENGINE_ADDRESS: &str = "127.0.0.1:1234";

/// Default namespace of generated code
pub const DEFAULT_NAMESPACE: &str = "Specs.Generated";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Specification engine connection
    pub engine: EngineConfig,
    /// Output directory handling
    pub output: OutputConfig,
    /// Code synthesis
    pub synthesis: SynthesisConfig,
}

/// Engine connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `host:port` of the engine
    pub address: String,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Largest accepted frame body
    pub max_frame_bytes: usize,
    /// Message id generation
    pub message_ids: MessageIdStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ENGINE_ADDRESS.to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            message_ids: MessageIdStrategy::default(),
        }
    }
}

impl EngineConfig {
    /// Connect timeout
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Frame codec honouring `max_frame_bytes`
    #[inline]
    #[must_use]
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.max_frame_bytes)
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory created next to the project file
    pub directory_name: String,
    /// In-place or staged regeneration
    pub mode: OutputMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory_name: DEFAULT_DIRECTORY_NAME.to_string(),
            mode: OutputMode::default(),
        }
    }
}

/// Synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Namespace of generated classes
    pub namespace: String,
    /// Namespace imported for the scenario runner
    pub runner_namespace: String,
    /// Test framework whose attribute marks methods
    pub framework: TestFramework,
    /// Output language
    pub language: TargetLanguage,
    /// Concurrent synthesis tasks; available parallelism when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallelism: Option<usize>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            runner_namespace: DEFAULT_RUNNER_NAMESPACE.to_string(),
            framework: TestFramework::default(),
            language: TargetLanguage::default(),
            max_parallelism: None,
        }
    }
}

impl SynthesisConfig {
    /// Effective parallelism
    #[inline]
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.max_parallelism.unwrap_or_else(default_parallelism)
    }
}

/// Exactly one normal path component
///
/// The output directory is cleared recursively, so `.`, `..`, roots and
/// multi-component paths would point it at the project or above.
fn is_plain_directory_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl GeneratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML or unknown keys,
    /// `ConfigError::Invalid` on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`GeneratorConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `ConfigError::Serialize` if TOML serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.address.trim().is_empty() {
            return Err(ConfigError::invalid("engine.address", "must not be empty"));
        }
        if self.engine.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid("engine.connect_timeout_ms", "must be positive"));
        }
        if self.engine.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("engine.request_timeout_ms", "must be positive"));
        }
        if self.engine.max_frame_bytes == 0 {
            return Err(ConfigError::invalid("engine.max_frame_bytes", "must be positive"));
        }
        if self.output.directory_name.trim().is_empty() {
            return Err(ConfigError::invalid("output.directory_name", "must not be empty"));
        }
        if !is_plain_directory_name(&self.output.directory_name) {
            return Err(ConfigError::invalid(
                "output.directory_name",
                "must be a single plain directory name, not `.`, `..` or a path",
            ));
        }
        if self.synthesis.namespace.trim().is_empty() {
            return Err(ConfigError::invalid("synthesis.namespace", "must not be empty"));
        }
        if self.synthesis.runner_namespace.trim().is_empty() {
            return Err(ConfigError::invalid(
                "synthesis.runner_namespace",
                "must not be empty",
            ));
        }
        if self.synthesis.max_parallelism == Some(0) {
            return Err(ConfigError::invalid("synthesis.max_parallelism", "must be positive"));
        }
        Ok(())
    }

    /// With engine address
    #[inline]
    #[must_use]
    pub fn with_engine_address(mut self, address: impl Into<String>) -> Self {
        self.engine.address = address.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.engine.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With output mode
    #[inline]
    #[must_use]
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output.mode = mode;
        self
    }

    /// With output directory name
    #[inline]
    #[must_use]
    pub fn with_directory_name(mut self, name: impl Into<String>) -> Self {
        self.output.directory_name = name.into();
        self
    }

    /// With test framework
    #[inline]
    #[must_use]
    pub fn with_framework(mut self, framework: TestFramework) -> Self {
        self.synthesis.framework = framework;
        self
    }

    /// With namespace of generated code
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.synthesis.namespace = namespace.into();
        self
    }

    /// With maximum synthesis parallelism
    #[inline]
    #[must_use]
    pub fn with_max_parallelism(mut self, max: usize) -> Self {
        self.synthesis.max_parallelism = Some(max);
        self
    }

    /// Synthesizer configured by `[synthesis]`
    #[must_use]
    pub fn synthesizer(&self) -> CodeSynthesizer {
        CodeSynthesizer::new(
            Arc::new(FixedNamespace::new(&self.synthesis.namespace)),
            Arc::new(self.synthesis.framework),
        )
        .with_runner_namespace(&self.synthesis.runner_namespace)
    }

    /// Filesystem-backed coordinator configured by `[output]` and `[synthesis]`
    #[must_use]
    pub fn coordinator(&self) -> OutputCoordinator {
        OutputCoordinator::new(
            Arc::new(SiblingDirectoryNaming::new(&self.output.directory_name)),
            Arc::new(self.synthesizer()),
            Arc::new(FsDeletion),
            Arc::new(FsSaving::for_language(self.synthesis.language)),
        )
        .with_mode(self.output.mode)
        .with_max_parallelism(self.synthesis.parallelism())
    }
}
