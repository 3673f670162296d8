//! PostgreSQL key owner repository

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::key_owner::{KeyOwner, OwnerName, OwnerRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_sqlx_error;

const OWNERS_TABLE: &str = "key_owners";

/// PostgreSQL implementation of OwnerRepository
///
/// Owners are stored as JSON keyed by name. The path rule is recompiled when a
/// row is read back.
#[derive(Debug, Clone)]
pub struct PostgresOwnerRepository {
    pool: PgPool,
}

impl PostgresOwnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensures the owner table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {OWNERS_TABLE} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }
}

fn deserialize(data: serde_json::Value) -> Result<KeyOwner, DomainError> {
    serde_json::from_value(data)
        .map_err(|e| DomainError::storage(format!("Failed to deserialize owner: {}", e)))
}

fn serialize(owner: &KeyOwner) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(owner)
        .map_err(|e| DomainError::storage(format!("Failed to serialize owner: {}", e)))
}

#[async_trait]
impl OwnerRepository for PostgresOwnerRepository {
    async fn get(&self, name: &OwnerName) -> Result<Option<KeyOwner>, DomainError> {
        let query = format!("SELECT data FROM {OWNERS_TABLE} WHERE key = $1");

        let row = sqlx::query(&query)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get owner: {}", e)))?;

        row.map(|row| deserialize(row.get("data"))).transpose()
    }

    async fn list(&self) -> Result<Vec<KeyOwner>, DomainError> {
        let query = format!("SELECT data FROM {OWNERS_TABLE} ORDER BY key");

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list owners: {}", e)))?;

        rows.into_iter()
            .map(|row| deserialize(row.get("data")))
            .collect()
    }

    async fn create(&self, owner: KeyOwner) -> Result<KeyOwner, DomainError> {
        let query = format!(
            r#"
            INSERT INTO {OWNERS_TABLE} (key, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#
        );

        sqlx::query(&query)
            .bind(owner.name().as_str())
            .bind(serialize(&owner)?)
            .bind(owner.created_at())
            .bind(owner.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("Owner '{}' already exists", owner.name())))?;

        Ok(owner)
    }

    async fn update(&self, owner: &KeyOwner) -> Result<KeyOwner, DomainError> {
        let query = format!(
            "UPDATE {OWNERS_TABLE} SET data = $2, updated_at = $3 WHERE key = $1"
        );

        let result = sqlx::query(&query)
            .bind(owner.name().as_str())
            .bind(serialize(owner)?)
            .bind(owner.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update owner: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Owner '{}' not found",
                owner.name()
            )));
        }

        Ok(owner.clone())
    }
}
