//! Principals supplied by the external identity/session system.
//!
//! The core never authenticates anyone. A `UserId` handed to submission
//! and a `ReviewerId` handed to review are trusted as already validated,
//! including the reviewer privilege.
//!
//! This module also mints the opaque identifiers the core generates for
//! its own records.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier of the user who owns a set of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an administrator holding reviewer privilege.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerId(pub String);

impl ReviewerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ReviewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mint a new identifier: `{prefix}_` + base58 of the first 16 bytes of
/// SHA-256(seed || timestamp || 16 random bytes).
pub(crate) fn mint_id(prefix: &str, seed: &str) -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(crate::time::now_micros().to_be_bytes());
    hasher.update(nonce);
    let hash = hasher.finalize();

    format!("{prefix}_{}", bs58::encode(&hash[..16]).into_string())
}
