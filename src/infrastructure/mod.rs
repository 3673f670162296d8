//! Infrastructure layer - Storage backends and service implementations

pub mod credential;
pub mod key_owner;
pub mod logging;
pub mod storage;
