//! Language-neutral source IR
//!
//! What to generate, independent of how it is printed:
//!
//! ```text
//! SourceUnit
//! └── Namespace
//!     ├── Import*
//!     └── Class*
//!         └── Method*
//!             ├── Attribute*
//!             └── Statement*
//! ```
//!
//! Units built by [`crate::CodeSynthesizer`] always hold one import and
//! one class; the IR itself does not enforce that.

use crate::providers::AttributeType;
use specgen_model::Identifier;

/// One generated file's worth of code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Name of the specification this unit was synthesized from
    pub source_name: String,
    /// The single namespace of the unit
    pub namespace: Namespace,
}

impl SourceUnit {
    /// First class of the unit
    #[inline]
    #[must_use]
    pub fn primary_class(&self) -> Option<&Class> {
        self.namespace.classes.first()
    }

    /// Name of the first class, used for file naming
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> Option<&Identifier> {
        self.primary_class().map(|class| &class.name)
    }

    /// All methods across all classes
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.namespace.classes.iter().flat_map(|c| c.methods.iter())
    }
}

/// Namespace declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Dotted namespace name
    pub name: String,
    /// Imported namespaces
    pub imports: Vec<Import>,
    /// Declared classes
    pub classes: Vec<Class>,
}

/// Namespace import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Dotted name of the imported namespace
    pub namespace: String,
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    /// Class name
    pub name: Identifier,
    /// Methods in declaration order
    pub methods: Vec<Method>,
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name
    pub name: Identifier,
    /// Attributes attached to the method
    pub attributes: Vec<Attribute>,
    /// Method body
    pub body: Vec<Statement>,
}

/// Attribute (annotation) instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type
    pub attribute_type: AttributeType,
}

/// Body statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create a runner for one scenario through the runner bridge and run it
    RunScenario {
        /// Unsanitized specification name
        specification: String,
        /// Unsanitized scenario name
        scenario: String,
    },
}
