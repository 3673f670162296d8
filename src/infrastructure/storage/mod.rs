//! Storage infrastructure - backend selection and PostgreSQL pooling

mod factory;
mod postgres;

pub use factory::{Repositories, StorageConfig, StorageFactory, StorageType};
pub use postgres::{map_sqlx_error, PostgresConfig};
