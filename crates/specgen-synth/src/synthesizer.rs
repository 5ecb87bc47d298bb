//! Code synthesizer
//!
//! Pure mapping from one [`Specification`] to one [`SourceUnit`]:
//! - namespace from the [`NamespaceProvider`]
//! - one import of the runner namespace
//! - one class named after the sanitized specification name
//! - one attributed method per scenario, in scenario order

use crate::error::SynthesisError;
use crate::ir::{Attribute, Class, Import, Method, Namespace, SourceUnit, Statement};
use crate::providers::{InvariantTestAttributor, NamespaceProvider};
use specgen_model::{Identifier, Specification};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default namespace of the scenario runner bridge
pub const DEFAULT_RUNNER_NAMESPACE: &str = "Specgen.Runner";

/// Synthesizes source units from specifications
///
/// Shares no mutable state, so one instance behind an `Arc` serves any
/// number of concurrent callers.
#[derive(Clone)]
pub struct CodeSynthesizer {
    namespace_provider: Arc<dyn NamespaceProvider>,
    attributor: Arc<dyn InvariantTestAttributor>,
    runner_namespace: String,
}

impl CodeSynthesizer {
    /// Create synthesizer
    #[must_use]
    pub fn new(
        namespace_provider: Arc<dyn NamespaceProvider>,
        attributor: Arc<dyn InvariantTestAttributor>,
    ) -> Self {
        Self {
            namespace_provider,
            attributor,
            runner_namespace: DEFAULT_RUNNER_NAMESPACE.to_string(),
        }
    }

    /// With runner namespace
    #[inline]
    #[must_use]
    pub fn with_runner_namespace(mut self, runner_namespace: impl Into<String>) -> Self {
        self.runner_namespace = runner_namespace.into();
        self
    }

    /// Runner namespace imported by every unit
    #[inline]
    #[must_use]
    pub fn runner_namespace(&self) -> &str {
        &self.runner_namespace
    }

    /// Generate the source unit for one specification
    ///
    /// # Errors
    /// - `SynthesisError::Argument` (parameter `specification`) if the name
    ///   is empty or whitespace
    /// - `SynthesisError::InvalidName` if a name has no identifier characters
    /// - `SynthesisError::DuplicateIdentifier` if two scenarios collide
    pub fn generate_code(&self, specification: &Specification) -> Result<SourceUnit, SynthesisError> {
        if specification.has_blank_name() {
            return Err(SynthesisError::argument(
                "specification",
                "specification name must not be empty or whitespace",
            ));
        }

        let class_name = Identifier::sanitize(&specification.name)?;
        let attribute_type = self.attributor.attribute_type();

        let mut seen: HashMap<Identifier, &str> = HashMap::with_capacity(specification.scenarios.len());
        let mut methods = Vec::with_capacity(specification.scenarios.len());

        for scenario in &specification.scenarios {
            let name = Identifier::sanitize(&scenario.name)?;

            if let Some(first) = seen.insert(name.clone(), &scenario.name) {
                return Err(SynthesisError::DuplicateIdentifier {
                    specification: specification.name.clone(),
                    identifier: name.into_string(),
                    first: first.to_string(),
                    second: scenario.name.clone(),
                });
            }

            methods.push(Method {
                name,
                attributes: vec![Attribute {
                    attribute_type: attribute_type.clone(),
                }],
                body: vec![Statement::RunScenario {
                    specification: specification.name.clone(),
                    scenario: scenario.name.clone(),
                }],
            });
        }

        Ok(SourceUnit {
            source_name: specification.name.clone(),
            namespace: Namespace {
                name: self.namespace_provider.namespace(),
                imports: vec![Import {
                    namespace: self.runner_namespace.clone(),
                }],
                classes: vec![Class {
                    name: class_name,
                    methods,
                }],
            },
        })
    }
}

impl fmt::Debug for CodeSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeSynthesizer")
            .field("runner_namespace", &self.runner_namespace)
            .finish_non_exhaustive()
    }
}
