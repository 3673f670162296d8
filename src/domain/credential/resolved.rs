//! A presented secret resolved against the store

use chrono::NaiveDate;

use super::entity::Credential;
use super::secret::SecretSlot;
use crate::domain::key_owner::KeyOwner;

/// Why a resolved credential does not authorize a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidity {
    /// The credential references no owner (or an owner that no longer exists)
    NoOwner,
    /// The owner's path rule does not match the request path
    PathMismatch,
    /// The previous secret was presented after its expiration date
    PreviousExpired,
}

impl Invalidity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOwner => "no_owner",
            Self::PathMismatch => "path_mismatch",
            Self::PreviousExpired => "previous_expired",
        }
    }
}

/// The credential a secret resolved to, which of its slots matched, and its owner
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    credential: Credential,
    slot: SecretSlot,
    owner: Option<KeyOwner>,
}

impl ResolvedCredential {
    pub fn new(credential: Credential, slot: SecretSlot, owner: Option<KeyOwner>) -> Self {
        Self {
            credential,
            slot,
            owner,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn slot(&self) -> SecretSlot {
        self.slot
    }

    pub fn owner(&self) -> Option<&KeyOwner> {
        self.owner.as_ref()
    }

    /// Whether the matched secret is still honoured on `today`, paths aside
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.credential.accepts(self.slot, today)
    }

    /// Check the credential against a request path on a given day
    pub fn check(&self, path: &str, today: NaiveDate) -> Result<(), Invalidity> {
        let owner = self.owner.as_ref().ok_or(Invalidity::NoOwner)?;

        if !owner.allows_path(path) {
            return Err(Invalidity::PathMismatch);
        }

        if !self.is_active(today) {
            return Err(Invalidity::PreviousExpired);
        }

        Ok(())
    }

    /// Whether the credential authorizes a request to `path` on `today`
    pub fn is_valid(&self, path: &str, today: NaiveDate) -> bool {
        self.check(path, today).is_ok()
    }
}
