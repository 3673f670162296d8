//! Credential entity and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::secret::{SecretDigest, SecretSlot};
use super::validation::{validate_credential_name, CredentialValidationError};
use crate::domain::key_owner::OwnerName;

/// Credential identifier, generated at creation and never changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, CredentialValidationError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| CredentialValidationError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for CredentialId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential label - unique and immutable; the stable handle across rotations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialName(String);

impl CredentialName {
    pub fn new(name: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let name = name.into();
        validate_credential_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CredentialName {
    type Error = CredentialValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CredentialName> for String {
    fn from(name: CredentialName) -> Self {
        name.0
    }
}

impl std::fmt::Display for CredentialName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class of caller a credential is issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Short API key presented by application clients
    #[default]
    ApiKey,
    /// Opaque client secret presented by server-side callers
    ClientSecret,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::ClientSecret => "client_secret",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CredentialValidationError> {
        match value {
            "api_key" => Ok(Self::ApiKey),
            "client_secret" => Ok(Self::ClientSecret),
            other => Err(CredentialValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rotatable credential: a current secret, optionally the previous one with
/// the last day it is still honoured, and the owner whose path rule applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    kind: CredentialKind,
    name: CredentialName,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<SecretDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<SecretDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_expires_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<OwnerName>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Count of accepted writes; an update must carry the stored value
    #[serde(default)]
    version: u64,
}

impl Credential {
    /// Create a credential with no secret yet; the first save issues one
    pub fn new(kind: CredentialKind, name: CredentialName, owner: Option<OwnerName>) -> Self {
        let now = Utc::now();

        Self {
            id: CredentialId::generate(),
            kind,
            name,
            current: None,
            previous: None,
            previous_expires_on: None,
            owner,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn id(&self) -> CredentialId {
        self.id
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn name(&self) -> &CredentialName {
        &self.name
    }

    pub fn current(&self) -> Option<&SecretDigest> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&SecretDigest> {
        self.previous.as_ref()
    }

    pub fn previous_expires_on(&self) -> Option<NaiveDate> {
        self.previous_expires_on
    }

    pub fn owner(&self) -> Option<&OwnerName> {
        self.owner.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record an accepted write. Repositories call this when they store an update.
    pub fn advance_version(&mut self) {
        self.version += 1;
    }

    pub fn has_secret(&self) -> bool {
        self.current.is_some()
    }

    /// Every stored digest with the slot it occupies
    pub fn digests(&self) -> impl Iterator<Item = (SecretSlot, &SecretDigest)> {
        self.current
            .iter()
            .map(|d| (SecretSlot::Current, d))
            .chain(self.previous.iter().map(|d| (SecretSlot::Previous, d)))
    }

    /// Which slot holds `digest`, if any
    pub fn slot_of(&self, digest: &SecretDigest) -> Option<SecretSlot> {
        self.digests()
            .find(|(_, stored)| *stored == digest)
            .map(|(slot, _)| slot)
    }

    /// Whether the previous secret is still honoured on `today`.
    ///
    /// The window closes once `today` is strictly after the expiration date;
    /// the expiration day itself is still inside it. No date means the window
    /// stays open until the next rotation.
    pub fn previous_window_open(&self, today: NaiveDate) -> bool {
        match self.previous_expires_on {
            Some(expires_on) => expires_on >= today,
            None => true,
        }
    }

    /// Whether a value matching `slot` is honoured on `today`, ignoring paths
    pub fn accepts(&self, slot: SecretSlot, today: NaiveDate) -> bool {
        match slot {
            SecretSlot::Current => self.current.is_some(),
            SecretSlot::Previous => self.previous.is_some() && self.previous_window_open(today),
        }
    }

    /// Install a new current secret.
    ///
    /// On first issuance the digest simply becomes current. Afterwards the
    /// existing current secret moves to the previous slot (replacing whatever
    /// was there) and `previous_expires_on` starts its clock.
    pub fn rotate_to(&mut self, digest: SecretDigest, previous_expires_on: Option<NaiveDate>) {
        if let Some(old) = self.current.take() {
            self.previous = Some(old);
            self.previous_expires_on = previous_expires_on;
        }

        self.current = Some(digest);
        self.touch();
    }

    pub fn set_owner(&mut self, owner: Option<OwnerName>) {
        self.owner = owner;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn credential(name: &str) -> Credential {
        Credential::new(
            CredentialKind::ApiKey,
            CredentialName::new(name).unwrap(),
            Some(OwnerName::new("orders").unwrap()),
        )
    }

    #[test]
    fn test_new_credential_has_no_secret() {
        let c = credential("ios");

        assert!(!c.has_secret());
        assert_eq!(c.digests().count(), 0);
        assert_eq!(c.kind(), CredentialKind::ApiKey);
        assert_eq!(c.owner().unwrap().as_str(), "orders");
    }

    #[test]
    fn test_first_issue_does_not_fill_previous() {
        let mut c = credential("ios");
        c.rotate_to(SecretDigest::of("k1"), Some(date(2025, 1, 1)));

        assert_eq!(c.current(), Some(&SecretDigest::of("k1")));
        assert!(c.previous().is_none());
        assert!(c.previous_expires_on().is_none());
    }

    #[test]
    fn test_rotation_moves_current_to_previous() {
        let mut c = credential("ios");
        c.rotate_to(SecretDigest::of("k1"), None);
        c.rotate_to(SecretDigest::of("k2"), Some(date(2025, 1, 1)));

        assert_eq!(c.slot_of(&SecretDigest::of("k2")), Some(SecretSlot::Current));
        assert_eq!(c.slot_of(&SecretDigest::of("k1")), Some(SecretSlot::Previous));
        assert_eq!(c.previous_expires_on(), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_second_rotation_drops_oldest_secret() {
        let mut c = credential("ios");
        c.rotate_to(SecretDigest::of("k1"), None);
        c.rotate_to(SecretDigest::of("k2"), None);
        c.rotate_to(SecretDigest::of("k3"), Some(date(2030, 1, 1)));

        assert_eq!(c.slot_of(&SecretDigest::of("k1")), None);
        assert_eq!(c.slot_of(&SecretDigest::of("k2")), Some(SecretSlot::Previous));
        assert_eq!(c.slot_of(&SecretDigest::of("k3")), Some(SecretSlot::Current));
    }

    #[test]
    fn test_previous_window_boundaries() {
        let mut c = credential("ios");
        c.rotate_to(SecretDigest::of("k1"), None);
        c.rotate_to(SecretDigest::of("k2"), Some(date(2025, 1, 1)));

        assert!(c.previous_window_open(date(2024, 12, 31)));
        assert!(c.previous_window_open(date(2025, 1, 1)));
        assert!(!c.previous_window_open(date(2025, 1, 2)));

        assert!(c.accepts(SecretSlot::Previous, date(2025, 1, 1)));
        assert!(!c.accepts(SecretSlot::Previous, date(2025, 1, 2)));
        assert!(c.accepts(SecretSlot::Current, date(2025, 1, 2)));
    }

    #[test]
    fn test_previous_without_expiry_stays_open() {
        let mut c = credential("ios");
        c.rotate_to(SecretDigest::of("k1"), None);
        c.rotate_to(SecretDigest::of("k2"), None);

        assert!(c.accepts(SecretSlot::Previous, date(2999, 1, 1)));
    }

    #[test]
    fn test_credential_id_parse() {
        let id = CredentialId::generate();
        assert_eq!(CredentialId::parse(&id.to_string()).unwrap(), id);
        assert!(CredentialId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(CredentialKind::parse("api_key").unwrap(), CredentialKind::ApiKey);
        assert_eq!(
            CredentialKind::parse("client_secret").unwrap(),
            CredentialKind::ClientSecret
        );
        assert!(CredentialKind::parse("token").is_err());
    }

    #[test]
    fn test_serialization_omits_empty_slots() {
        let c = credential("ios");
        let json = serde_json::to_string(&c).unwrap();

        assert!(!json.contains("current"));
        assert!(!json.contains("previous"));
        assert!(json.contains("\"kind\":\"api_key\""));
    }
}
