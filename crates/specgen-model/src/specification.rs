//! Specification model
//!
//! The in-memory shape of what the specification engine serves:
//! named specifications, each an ordered list of named scenarios.
//! Fetched fresh on every run and never persisted as-is.

use serde::{Deserialize, Serialize};

/// A single named test case within a specification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    /// Human-readable scenario name
    pub name: String,
}

impl Scenario {
    /// Create scenario
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named, ordered collection of scenarios
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specification {
    /// Human-readable specification name
    pub name: String,
    /// Scenarios in engine order
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl Specification {
    /// Create specification without scenarios
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, name: impl Into<String>) -> Self {
        self.scenarios.push(Scenario::new(name));
        self
    }

    /// Replace scenarios
    #[inline]
    #[must_use]
    pub fn with_scenarios<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenarios = names.into_iter().map(Scenario::new).collect();
        self
    }

    /// Whether the name is blank (empty or whitespace only)
    #[inline]
    #[must_use]
    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Number of scenarios
    #[inline]
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }
}
