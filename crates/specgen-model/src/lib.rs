//! specgen Model
//!
//! Leaf types shared by every other specgen crate.
//!
//! # Core Concepts
//!
//! - [`Specification`] / [`Scenario`]: what the specification engine serves
//! - [`Identifier`]: a sanitized, non-empty source identifier
//! - [`sanitize`]: name → identifier by deleting non-word characters
//!
//! # Example
//!
//! ```rust
//! use specgen_model::{sanitize, Specification};
//!
//! let spec = Specification::new("Login Flow").with_scenario("Valid login");
//! assert_eq!(sanitize(&spec.name).unwrap(), "LoginFlow");
//! ```

#![warn(unreachable_pub)]

// Core modules
mod identifier;
mod specification;

// Re-exports
pub use identifier::{is_word_char, sanitize, Identifier, InvalidNameError};
pub use specification::{Scenario, Specification};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
