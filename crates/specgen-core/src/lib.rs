//! specgen Core
//!
//! Regenerates a project's test sources from the specification engine.
//!
//! # Architecture
//!
//! ```text
//! Generator::create_or_update
//!     ├── SpecificationSource (engine client)   fetch first, nothing deleted on failure
//!     └── OutputCoordinator
//!             ├── NamingService      project -> output directory
//!             ├── DeletionService    clear output (or staging) directory
//!             ├── CodeSynthesizer    JoinSet fan-out, structured join
//!             ├── SavingService      sequential saves
//!             └── PromotionService   staged mode only
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use specgen_core::prelude::*;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), GeneratorError> {
//! let config = GeneratorConfig::from_file(Path::new("specgen.toml"))?;
//! let generator = Generator::connect(&config).await?;
//! let output = generator
//!     .create_or_update(Path::new("App/App.csproj"), &CancellationToken::new())
//!     .await?;
//! println!("wrote {}", output.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod services;
pub mod telemetry;

// Re-exports for convenience
pub use config::{EngineConfig, GeneratorConfig, OutputConfig, SynthesisConfig};
pub use coordinator::{OutputCoordinator, OutputMode};
pub use error::{ConfigError, GeneratorError, SpecFailure, WriteError};
pub use generator::Generator;
pub use services::{
    DeletionService, FsDeletion, FsPromotion, FsSaving, NamingService, PromotionService,
    SavingService, SiblingDirectoryNaming,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting the generator
    pub use crate::{
        GeneratorConfig, Generator, GeneratorError, OutputCoordinator, OutputMode, WriteError,
    };
    pub use specgen_model::{Scenario, Specification};
    pub use tokio_util::sync::CancellationToken;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
