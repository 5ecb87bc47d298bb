//! specgen Synthesis
//!
//! Turns specifications into test source.
//!
//! # Architecture
//!
//! ```text
//! Specification ──> CodeSynthesizer ──> SourceUnit (IR) ──> SourceRenderer ──> text
//!                      ↑        ↑
//!      NamespaceProvider        InvariantTestAttributor (TestFramework)
//! ```
//!
//! Synthesis decides *what* to generate; rendering decides *how* it is
//! printed. Neither touches the filesystem.
//!
//! # Example
//!
//! ```rust
//! use specgen_model::Specification;
//! use specgen_synth::{CodeSynthesizer, CSharpRenderer, FixedNamespace, SourceRenderer, TestFramework};
//! use std::sync::Arc;
//!
//! let synthesizer = CodeSynthesizer::new(
//!     Arc::new(FixedNamespace::new("Specs.Generated")),
//!     Arc::new(TestFramework::XUnit),
//! );
//! let spec = Specification::new("Login Flow").with_scenario("Valid login");
//! let unit = synthesizer.generate_code(&spec).unwrap();
//!
//! let text = CSharpRenderer::default().render(&unit);
//! assert!(text.contains("public void Validlogin()"));
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod ir;
pub mod providers;
pub mod render;
pub mod synthesizer;

// Re-exports for convenience
pub use error::SynthesisError;
pub use ir::{Attribute, Class, Import, Method, Namespace, SourceUnit, Statement};
pub use providers::{
    AttributeType, FixedNamespace, InvariantTestAttributor, NamespaceProvider, TestFramework,
};
pub use render::{CSharpRenderer, SourceRenderer, TargetLanguage};
pub use synthesizer::{CodeSynthesizer, DEFAULT_RUNNER_NAMESPACE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
