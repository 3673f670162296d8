//! Request gatekeeper domain
//!
//! Bypass policy plus the admit/reject decision made for every request.

mod decision;
mod policy;
mod service;

pub use decision::{Decision, RejectReason};
pub use policy::{BypassPolicy, BypassRule, RequestFacts};
pub use service::Gatekeeper;
