//! Mount context supplied by the host.

use std::fmt;

/// Identifier of a node in the host document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reconciliation key attached to a rendered root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Where and how rendered output is attached.
///
/// Constructed by the host when it mounts a page; page modules only read it.
/// Two contexts are equivalent when they target the same container with the
/// same key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountContext {
    container: NodeId,
    key: Option<Key>,
}

impl MountContext {
    #[must_use]
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            key: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Container the output will be inserted into.
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}
