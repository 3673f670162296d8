//! Bypass rules: which requests are exempt from key enforcement

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// The parts of a request the bypass rules look at
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Client-identifying header (user agent), if sent
    pub client: Option<&'a str>,
}

impl<'a> RequestFacts<'a> {
    pub fn new(method: &'a str, path: &'a str, client: Option<&'a str>) -> Self {
        Self {
            method,
            path,
            client,
        }
    }

    fn client(&self) -> &'a str {
        self.client.unwrap_or("")
    }
}

/// A single exemption rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BypassRule {
    /// Method equals this one exactly; methods are case-sensitive
    Method { method: String },
    /// Path does not contain this marker
    PathLacks { marker: String },
    /// Path equals one of these exactly
    PathEquals { paths: Vec<String> },
    /// Client header contains any of these
    ClientContains { values: Vec<String> },
    /// Client header starts with any of these
    ClientPrefix { values: Vec<String> },
    /// Client header contains `marker` and none of `exclusions`, ignoring case
    ClientCarveOut {
        marker: String,
        #[serde(default)]
        exclusions: Vec<String>,
    },
}

impl BypassRule {
    pub fn matches(&self, facts: &RequestFacts<'_>) -> bool {
        match self {
            Self::Method { method } => facts.method == method.as_str(),
            Self::PathLacks { marker } => !facts.path.contains(marker.as_str()),
            Self::PathEquals { paths } => paths.iter().any(|p| p == facts.path),
            Self::ClientContains { values } => {
                let client = facts.client();
                values
                    .iter()
                    .any(|v| !v.is_empty() && client.contains(v.as_str()))
            }
            Self::ClientPrefix { values } => {
                let client = facts.client();
                values
                    .iter()
                    .any(|v| !v.is_empty() && client.starts_with(v.as_str()))
            }
            Self::ClientCarveOut { marker, exclusions } => {
                let client = facts.client().to_lowercase();

                client.contains(&marker.to_lowercase())
                    && !exclusions
                        .iter()
                        .any(|e| client.contains(&e.to_lowercase()))
            }
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Method { .. } => "method",
            Self::PathLacks { .. } => "path_lacks",
            Self::PathEquals { .. } => "path_equals",
            Self::ClientContains { .. } => "client_contains",
            Self::ClientPrefix { .. } => "client_prefix",
            Self::ClientCarveOut { .. } => "client_carve_out",
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Method { method } if method.trim().is_empty() => Err(
                DomainError::configuration("bypass rule 'method' needs a method"),
            ),
            Self::PathLacks { marker } if marker.is_empty() => Err(DomainError::configuration(
                "bypass rule 'path_lacks' needs a non-empty marker",
            )),
            Self::ClientCarveOut { marker, .. } if marker.is_empty() => {
                Err(DomainError::configuration(
                    "bypass rule 'client_carve_out' needs a non-empty marker",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Ordered list of exemption rules; a request is exempt when any rule matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassPolicy {
    rules: Vec<BypassRule>,
}

impl BypassPolicy {
    /// Build a policy, rejecting rules that could never be meant
    pub fn new(rules: Vec<BypassRule>) -> Result<Self, DomainError> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// A policy that exempts nothing
    pub fn enforce_all() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[BypassRule] {
        &self.rules
    }

    /// First rule exempting this request
    pub fn matching_rule(&self, facts: &RequestFacts<'_>) -> Option<&BypassRule> {
        self.rules.iter().find(|rule| rule.matches(facts))
    }

    pub fn should_skip(&self, facts: &RequestFacts<'_>) -> bool {
        self.matching_rule(facts).is_some()
    }
}

impl Default for BypassPolicy {
    /// Pre-flight requests, non-API paths, browsers, link-preview bots and the
    /// load balancer health checker
    fn default() -> Self {
        Self {
            rules: vec![
                BypassRule::Method {
                    method: "OPTIONS".to_string(),
                },
                BypassRule::PathLacks {
                    marker: "/api/".to_string(),
                },
                BypassRule::ClientContains {
                    values: vec!["Darwin".to_string()],
                },
                BypassRule::ClientPrefix {
                    values: vec![
                        "Mozilla".to_string(),
                        "Opera".to_string(),
                        "Slackbot".to_string(),
                        "facebook".to_string(),
                        "ELB-HealthChecker".to_string(),
                    ],
                },
            ],
        }
    }
}
