//! Node identifiers.
//!
//! An [`Id`] is the stable, wire-level identity of a node. A [`NodeHandle`]
//! is its position in the arena of the [`Graph`](crate::Graph) holding it;
//! handles are only meaningful for the graph that issued them.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::limits::MAX_ID_LEN;

/// A stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered identifier (UUIDv7, simple format).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Index of a node in the arena of its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Validates an identifier string.
///
/// Identifiers must:
/// - Not be empty
/// - Only contain characters 0-9, A-Z, a-z, `-` and `_`
/// - Not exceed [`MAX_ID_LEN`] characters
pub fn validate_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("id cannot be empty");
    }
    if id.len() > MAX_ID_LEN {
        return Err("id exceeds maximum length");
    }
    for c in id.chars() {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err("id contains invalid character");
        }
    }
    Ok(())
}

/// Derives a deterministic identifier from another identifier and a salt.
///
/// ```text
/// derived = hex(SHA-256(base || 0x00 || salt)[0:16])
/// ```
pub fn derived_id(base: &Id, salt: &str) -> Id {
    let mut hasher = Sha256::new();
    hasher.update(base.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(salt.as_bytes());
    let hash = hasher.finalize();

    let mut s = String::with_capacity(32);
    for byte in &hash[..16] {
        s.push_str(&format!("{:02x}", byte));
    }
    Id(s)
}
