//! Stored secret forms

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DIGEST_PREFIX: &str = "sha256$";

/// The comparison form of a secret: `sha256$<base64url digest>`
///
/// Plaintext secrets are never stored; lookups digest the presented value and
/// compare digests. Two secrets collide exactly when their digests do, so
/// uniqueness over digests is uniqueness over secrets.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretDigest(String);

impl SecretDigest {
    /// Digest a plaintext secret
    pub fn of(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self(format!(
            "{}{}",
            DIGEST_PREFIX,
            URL_SAFE_NO_PAD.encode(hasher.finalize())
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Digests are not secrets, but they identify one; keep them out of logs anyway.
impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretDigest(..)")
    }
}

/// Which of a credential's two secrets a presented value matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSlot {
    /// The secret issued by the latest rotation
    Current,
    /// The secret superseded by the latest rotation
    Previous,
}

impl SecretSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Previous => "previous",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "current" => Some(Self::Current),
            "previous" => Some(Self::Previous),
            _ => None,
        }
    }
}

impl std::fmt::Display for SecretSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
