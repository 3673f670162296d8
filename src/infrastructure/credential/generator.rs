//! Secret generation
//!
//! Generates cryptographically random secrets. Only the plaintext is produced
//! here; the stored form is [`SecretDigest`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::domain::credential::SecretDigest;

/// A freshly generated secret, shown to the operator exactly once
#[derive(Clone)]
pub struct GeneratedSecret {
    /// The plaintext secret
    pub secret: String,
    /// The form that gets stored
    pub digest: SecretDigest,
}

impl std::fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Generator for opaque secrets
#[derive(Debug, Clone)]
pub struct SecretGenerator {
    /// Number of random bytes per secret
    secret_bytes: usize,
}

impl SecretGenerator {
    /// 30 random bytes, which encode to exactly 40 characters
    pub const DEFAULT_SECRET_BYTES: usize = 30;

    /// Smallest secret the server or the CLI will issue
    pub const MIN_SECRET_BYTES: usize = 16;

    pub fn new() -> Self {
        Self {
            secret_bytes: Self::DEFAULT_SECRET_BYTES,
        }
    }

    /// Set the number of random bytes
    pub fn with_secret_bytes(mut self, bytes: usize) -> Self {
        self.secret_bytes = bytes;
        self
    }

    /// Generate a new secret
    pub fn generate(&self) -> GeneratedSecret {
        let mut random_bytes = vec![0u8; self.secret_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let secret = URL_SAFE_NO_PAD.encode(&random_bytes);
        let digest = SecretDigest::of(&secret);

        GeneratedSecret { secret, digest }
    }
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::new()
    }
}
