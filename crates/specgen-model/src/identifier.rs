//! Identifier sanitization
//!
//! Turns human-readable specification and scenario names into source
//! identifiers by deleting every character outside the word class
//! (letters, digits, underscore). Nothing is substituted, collapsed or
//! escaped: `"Test: Something"` becomes `"TestSomething"`.

use std::fmt::{self, Display, Formatter};

/// Sanitization produced an empty identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("name {name:?} contains no identifier characters")]
pub struct InvalidNameError {
    /// The offending input name
    pub name: String,
}

/// A non-empty identifier made only of letters, digits and underscores
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Sanitize a name into an identifier
    ///
    /// # Errors
    /// Returns [`InvalidNameError`] if no character of `name` survives.
    pub fn sanitize(name: &str) -> Result<Self, InvalidNameError> {
        let retained: String = name.chars().filter(|c| is_word_char(*c)).collect();

        if retained.is_empty() {
            return Err(InvalidNameError {
                name: name.to_string(),
            });
        }

        Ok(Self(retained))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitize a name, returning the plain string form
///
/// # Errors
/// Returns [`InvalidNameError`] if the result would be empty.
#[inline]
pub fn sanitize(name: &str) -> Result<String, InvalidNameError> {
    Identifier::sanitize(name).map(Identifier::into_string)
}

/// Word characters: Unicode letters and digits plus underscore
#[inline]
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
