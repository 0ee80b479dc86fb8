//! Identifiers shared by both stores, plus root probes.

pub mod probe;

use std::fmt;

/// Layer identifier; the same directory name is used in the aufs and overlay2 stores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for LayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Short indirection identifier naming a layer's entry under `overlay2/l/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRef(String);

impl LinkRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LinkRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LinkRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
