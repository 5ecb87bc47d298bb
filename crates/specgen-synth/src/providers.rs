//! Pluggable synthesis inputs
//!
//! - [`NamespaceProvider`]: which namespace generated code lives in
//! - [`InvariantTestAttributor`]: which attribute marks a method as a test
//!
//! The attribute choice is a closed set ([`TestFramework`]) selected once
//! at startup, so swapping xUnit for NUnit needs no synthesizer change.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Supplies the namespace of generated code
#[cfg_attr(test, mockall::automock)]
pub trait NamespaceProvider: Send + Sync {
    /// Namespace name
    fn namespace(&self) -> String;
}

/// Supplies the test-invariant attribute type
#[cfg_attr(test, mockall::automock)]
pub trait InvariantTestAttributor: Send + Sync {
    /// Attribute type marking a method as an invariant test
    fn attribute_type(&self) -> AttributeType;
}

/// Fully qualified attribute type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeType {
    /// Declaring namespace
    pub namespace: String,
    /// Type name
    pub name: String,
}

impl AttributeType {
    /// Create descriptor
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// `Namespace.Name`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Namespace fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedNamespace(String);

impl FixedNamespace {
    /// Create provider
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }
}

impl NamespaceProvider for FixedNamespace {
    fn namespace(&self) -> String {
        self.0.clone()
    }
}

/// Supported target test frameworks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    /// xUnit.net `[Fact]`
    #[default]
    XUnit,
    /// NUnit `[Test]`
    NUnit,
    /// MSTest `[TestMethod]`
    MsTest,
}

impl TestFramework {
    /// All frameworks
    pub const ALL: [TestFramework; 3] = [Self::XUnit, Self::NUnit, Self::MsTest];

    /// Config name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::XUnit => "xunit",
            Self::NUnit => "nunit",
            Self::MsTest => "mstest",
        }
    }
}

impl InvariantTestAttributor for TestFramework {
    fn attribute_type(&self) -> AttributeType {
        match self {
            Self::XUnit => AttributeType::new("Xunit", "FactAttribute"),
            Self::NUnit => AttributeType::new("NUnit.Framework", "TestAttribute"),
            Self::MsTest => AttributeType::new(
                "Microsoft.VisualStudio.TestTools.UnitTesting",
                "TestMethodAttribute",
            ),
        }
    }
}

impl Display for TestFramework {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TestFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|framework| framework.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown test framework: {s} (expected xunit, nunit or mstest)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xunit_uses_fact_attribute() {
        assert_eq!(
            TestFramework::XUnit.attribute_type().qualified_name(),
            "Xunit.FactAttribute"
        );
    }

    #[test]
    fn every_framework_has_distinct_attribute() {
        let mut names: Vec<_> = TestFramework::ALL
            .iter()
            .map(|f| f.attribute_type().qualified_name())
            .collect();
        names.dedup();
        assert_eq!(names.len(), TestFramework::ALL.len());
    }

    #[test]
    fn framework_parses_case_insensitively() {
        assert_eq!("NUnit".parse::<TestFramework>().unwrap(), TestFramework::NUnit);
        assert!("junit".parse::<TestFramework>().is_err());
    }

    #[test]
    fn framework_serde_uses_config_names() {
        let json = serde_json::to_string(&TestFramework::MsTest).unwrap();
        assert_eq!(json, "\"mstest\"");
    }

    #[test]
    fn qualified_name_without_namespace() {
        assert_eq!(AttributeType::new("", "Test").qualified_name(), "Test");
    }
}
