//! Domain layer - Core business logic and entities

pub mod clock;
pub mod credential;
pub mod error;
pub mod gatekeeper;
pub mod key_owner;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credential::{
    Credential, CredentialId, CredentialKind, CredentialName, CredentialRepository,
    CredentialResolver, CredentialValidationError, Invalidity, ResolvedCredential, SecretDigest,
    SecretSlot,
};
pub use error::DomainError;
pub use gatekeeper::{BypassPolicy, BypassRule, Decision, Gatekeeper, RejectReason, RequestFacts};
pub use key_owner::{KeyOwner, OwnerName, OwnerRepository, OwnerValidationError, PathPattern};
