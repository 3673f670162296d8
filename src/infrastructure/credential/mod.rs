//! Credential infrastructure: secret generation, storage backends and the
//! registry that ties them together

mod generator;
mod in_memory;
mod postgres;
mod registry;

pub use generator::{GeneratedSecret, SecretGenerator};
pub use in_memory::InMemoryCredentialRepository;
pub use postgres::PostgresCredentialRepository;
pub use registry::{CredentialRegistry, IssuedSecret, RegistryConfig};
