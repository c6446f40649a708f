//! Primitive types

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Symbolic values from a constrained domain
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    /// Creates a new [`Symbol`]
    pub fn new(val: impl Into<String>) -> Self {
        Self(val.into())
    }

    /// Get a reference to the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the symbol holds an empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Symbol {
    fn from(val: String) -> Self {
        Self(val)
    }
}

impl From<&str> for Symbol {
    fn from(val: &str) -> Self {
        Self(val.to_string())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
