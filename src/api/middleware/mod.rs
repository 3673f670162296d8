//! API middleware components

pub mod admin_auth;
pub mod gatekeeper;
pub mod logging;

pub use admin_auth::RequireAdmin;
pub use gatekeeper::{
    gatekeeper_middleware, AuthenticatedCredential, GatekeeperHeaders, RequireCredential,
};
pub use logging::logging_middleware;
