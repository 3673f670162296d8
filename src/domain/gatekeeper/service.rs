//! Per-request admission decision

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, warn};

use super::decision::{Decision, RejectReason};
use super::policy::{BypassPolicy, RequestFacts};
use crate::domain::credential::{CredentialResolver, Invalidity};

/// Decides, per request, whether to bypass, reject, or admit with identity
#[derive(Clone)]
pub struct Gatekeeper {
    resolver: Arc<dyn CredentialResolver>,
    policy: BypassPolicy,
}

impl std::fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Gatekeeper {
    pub fn new(resolver: Arc<dyn CredentialResolver>, policy: BypassPolicy) -> Self {
        Self { resolver, policy }
    }

    pub fn policy(&self) -> &BypassPolicy {
        &self.policy
    }

    /// Inspect a request.
    ///
    /// Exempt requests are always admitted. A presented secret is still
    /// resolved, and the request is attributed only when that credential would
    /// also pass enforcement for the path on `today`; lookup failures are
    /// dropped. Everything else needs a secret that resolves and is valid.
    /// Lookup failures reject.
    ///
    /// The presented value is compared as sent; surrounding whitespace is not
    /// stripped. A value that is only whitespace counts as absent.
    pub async fn inspect(
        &self,
        facts: &RequestFacts<'_>,
        presented: Option<&str>,
        today: NaiveDate,
    ) -> Decision {
        let presented = presented.filter(|s| !s.trim().is_empty());

        if let Some(rule) = self.policy.matching_rule(facts) {
            debug!(rule = rule.name(), path = facts.path, "Key enforcement bypassed");

            let credential = match presented {
                Some(secret) => match self.resolver.resolve(secret).await {
                    Ok(Some(resolved)) => match resolved.check(facts.path, today) {
                        Ok(()) => Some(resolved),
                        Err(invalidity) => {
                            debug!(
                                credential_id = %resolved.credential().id(),
                                reason = invalidity.as_str(),
                                "Bypassed request left unattributed"
                            );
                            None
                        }
                    },
                    Ok(None) => None,
                    Err(e) => {
                        debug!(error = %e, "Attribution lookup failed on bypassed request");
                        None
                    }
                },
                None => None,
            };

            return Decision::Admit {
                credential,
                bypassed: true,
            };
        }

        let Some(secret) = presented else {
            return Decision::Reject(RejectReason::MissingSecret);
        };

        let resolved = match self.resolver.resolve(secret).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return Decision::Reject(RejectReason::UnknownSecret),
            Err(e) => {
                error!(error = %e, path = facts.path, "Credential lookup failed, rejecting");
                return Decision::Reject(RejectReason::LookupFailed);
            }
        };

        match resolved.check(facts.path, today) {
            Ok(()) => Decision::Admit {
                credential: Some(resolved),
                bypassed: false,
            },
            Err(invalidity) => {
                let credential = resolved.credential();

                if invalidity == Invalidity::NoOwner {
                    warn!(
                        credential_id = %credential.id(),
                        credential_name = %credential.name(),
                        "Credential has no usable owner; all of its requests are denied"
                    );
                }

                debug!(
                    credential_id = %credential.id(),
                    slot = %resolved.slot(),
                    reason = invalidity.as_str(),
                    "Credential not valid for request"
                );

                Decision::Reject(RejectReason::Invalid(invalidity))
            }
        }
    }
}
