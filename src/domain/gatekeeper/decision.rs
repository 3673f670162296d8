//! Gatekeeper outcomes

use crate::domain::credential::{Invalidity, ResolvedCredential};

/// Why a request was turned away. Only ever logged; callers see one uniform
/// rejection regardless of the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingSecret,
    UnknownSecret,
    LookupFailed,
    Invalid(Invalidity),
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::UnknownSecret => "unknown_secret",
            Self::LookupFailed => "lookup_failed",
            Self::Invalid(invalidity) => invalidity.as_str(),
        }
    }
}

/// Result of inspecting one request
#[derive(Debug, Clone)]
pub enum Decision {
    /// Let the request through. `credential` is the attributed identity, if any.
    Admit {
        credential: Option<ResolvedCredential>,
        bypassed: bool,
    },
    Reject(RejectReason),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit { .. })
    }

    pub fn credential(&self) -> Option<&ResolvedCredential> {
        match self {
            Self::Admit { credential, .. } => credential.as_ref(),
            Self::Reject(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Reject(reason) => Some(*reason),
            Self::Admit { .. } => None,
        }
    }
}
