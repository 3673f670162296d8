//! Key owner entity and related types

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::{compile_path_pattern, validate_owner_name, OwnerValidationError};

/// Owner name - unique, human-readable, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerName(String);

impl OwnerName {
    /// Create a new OwnerName after validation
    pub fn new(name: impl Into<String>) -> Result<Self, OwnerValidationError> {
        let name = name.into();
        validate_owner_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerName {
    type Error = OwnerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerName> for String {
    fn from(name: OwnerName) -> Self {
        name.0
    }
}

impl std::fmt::Display for OwnerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A compiled path rule
///
/// The expression is compiled when the pattern is built (including on
/// deserialization), so a stored owner can never carry a pattern that fails
/// at request time. Matching is an unanchored search: the expression may match
/// anywhere in the path unless it anchors itself.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    compiled: Regex,
}

impl PathPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, OwnerValidationError> {
        let source = source.into();
        let compiled = compile_path_pattern(&source)?;
        Ok(Self { source, compiled })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern matches anywhere in `path`
    pub fn matches(&self, path: &str) -> bool {
        self.compiled.is_match(path)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PathPattern {}

impl Serialize for PathPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(source).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The party a set of keys is issued to, with the single path rule all of
/// its keys are restricted to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyOwner {
    name: OwnerName,
    path_re: PathPattern,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KeyOwner {
    pub fn new(name: OwnerName, path_re: PathPattern) -> Self {
        let now = Utc::now();

        Self {
            name,
            path_re,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &OwnerName {
        &self.name
    }

    pub fn path_re(&self) -> &PathPattern {
        &self.path_re
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether this owner's keys may be used on `path`
    pub fn allows_path(&self, path: &str) -> bool {
        self.path_re.matches(path)
    }

    pub fn set_path_re(&mut self, path_re: PathPattern) {
        self.path_re = path_re;
        self.updated_at = Utc::now();
    }
}
