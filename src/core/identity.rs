// src/core/identity.rs

//! Stable node keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, unique identifier of a command node.
///
/// Fresh keys are random UUIDs in their 32-character simple form. Keys read back from a
/// catalog document are kept verbatim, whatever their shape, so older documents keep
/// their identities across saves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Wraps an existing key string without validation.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// A placeholder for nodes whose key is not known yet. It is replaced by the
    /// post-load back-fill pass and never reaches a tree store.
    pub(crate) fn unassigned() -> Self {
        Self(String::new())
    }

    /// Whether this key is the placeholder produced by [`NodeKey::unassigned`].
    pub fn is_unassigned(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` characters, used for display and short references.
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => self.0.get(..idx).unwrap_or(&self.0),
            None => &self.0,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

/// Issues a new key. v4 UUIDs carry 122 random bits, so a collision with any key issued
/// during the process lifetime is not a practical concern.
pub fn new_key() -> NodeKey {
    NodeKey(Uuid::new_v4().simple().to_string())
}
