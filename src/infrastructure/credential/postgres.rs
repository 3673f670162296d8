//! PostgreSQL credential repository
//!
//! Credentials are stored as JSON documents. Every digest a credential holds
//! also gets a row in `credential_secrets`, whose primary key is the digest,
//! written in the same transaction as the credential. The database therefore
//! refuses any write that would put one digest in two slots.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Row, Transaction};

use crate::domain::credential::{
    Credential, CredentialId, CredentialKind, CredentialName, CredentialRepository, SecretDigest,
    SecretSlot,
};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_sqlx_error;

const CREDENTIALS_TABLE: &str = "credentials";
const SECRETS_TABLE: &str = "credential_secrets";

/// PostgreSQL implementation of CredentialRepository
#[derive(Debug, Clone)]
pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensures the credential tables exist
    pub async fn ensure_tables(&self) -> Result<(), DomainError> {
        let credentials = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {CREDENTIALS_TABLE} (
                id UUID PRIMARY KEY,
                name VARCHAR(50) NOT NULL UNIQUE,
                kind VARCHAR(32) NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        );

        let secrets = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {SECRETS_TABLE} (
                digest VARCHAR(128) PRIMARY KEY,
                credential_id UUID NOT NULL REFERENCES {CREDENTIALS_TABLE}(id),
                slot VARCHAR(16) NOT NULL
            )
            "#
        );

        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{SECRETS_TABLE}_credential ON {SECRETS_TABLE} (credential_id)"
        );

        for query in [credentials, secrets, index] {
            sqlx::query(&query)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;
        }

        Ok(())
    }

    async fn insert_digests(
        tx: &mut Transaction<'_, Postgres>,
        credential: &Credential,
    ) -> Result<(), DomainError> {
        let query = format!(
            "INSERT INTO {SECRETS_TABLE} (digest, credential_id, slot) VALUES ($1, $2, $3)"
        );

        for (slot, digest) in credential.digests() {
            sqlx::query(&query)
                .bind(digest.as_str())
                .bind(credential.id().as_uuid())
                .bind(slot.as_str())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(e, "Secret is already in use"))?;
        }

        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))
    }
}

fn serialize(credential: &Credential) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(credential)
        .map_err(|e| DomainError::storage(format!("Failed to serialize credential: {}", e)))
}

fn deserialize(data: serde_json::Value) -> Result<Credential, DomainError> {
    serde_json::from_value(data)
        .map_err(|e| DomainError::storage(format!("Failed to deserialize credential: {}", e)))
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn get(&self, id: &CredentialId) -> Result<Option<Credential>, DomainError> {
        let query = format!("SELECT data FROM {CREDENTIALS_TABLE} WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get credential: {}", e)))?;

        row.map(|row| deserialize(row.get("data"))).transpose()
    }

    async fn get_by_name(&self, name: &CredentialName) -> Result<Option<Credential>, DomainError> {
        let query = format!("SELECT data FROM {CREDENTIALS_TABLE} WHERE name = $1");

        let row = sqlx::query(&query)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get credential: {}", e)))?;

        row.map(|row| deserialize(row.get("data"))).transpose()
    }

    async fn find_by_digest(
        &self,
        digest: &SecretDigest,
    ) -> Result<Option<(Credential, SecretSlot)>, DomainError> {
        let query = format!(
            r#"
            SELECT c.data, s.slot
            FROM {SECRETS_TABLE} s
            JOIN {CREDENTIALS_TABLE} c ON c.id = s.credential_id
            WHERE s.digest = $1
            "#
        );

        let Some(row) = sqlx::query(&query)
            .bind(digest.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up secret: {}", e)))?
        else {
            return Ok(None);
        };

        let credential = deserialize(row.get("data"))?;
        let slot: String = row.get("slot");
        let slot = SecretSlot::from_str(&slot)
            .ok_or_else(|| DomainError::storage(format!("Unknown secret slot '{}'", slot)))?;

        Ok(Some((credential, slot)))
    }

    async fn create(&self, credential: Credential) -> Result<Credential, DomainError> {
        let data = serialize(&credential)?;
        let mut tx = self.begin().await?;

        let query = format!(
            r#"
            INSERT INTO {CREDENTIALS_TABLE} (id, name, kind, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        );

        sqlx::query(&query)
            .bind(credential.id().as_uuid())
            .bind(credential.name().as_str())
            .bind(credential.kind().as_str())
            .bind(&data)
            .bind(credential.created_at())
            .bind(credential.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_sqlx_error(
                    e,
                    format!("Credential with name '{}' already exists", credential.name()),
                )
            })?;

        Self::insert_digests(&mut tx, &credential).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Secret is already in use"))?;

        Ok(credential)
    }

    async fn update(&self, credential: &Credential) -> Result<Credential, DomainError> {
        let mut tx = self.begin().await?;

        let select = format!("SELECT data FROM {CREDENTIALS_TABLE} WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&select)
            .bind(credential.id().as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get credential: {}", e)))?
            .ok_or_else(|| {
                DomainError::not_found(format!("Credential '{}' not found", credential.id()))
            })?;
        let existing = deserialize(row.get("data"))?;

        if existing.name() != credential.name() {
            return Err(DomainError::validation("Credential name cannot be changed"));
        }

        if existing.version() != credential.version() {
            return Err(DomainError::stale_write(format!(
                "Credential '{}' was modified concurrently",
                credential.id()
            )));
        }

        let mut stored = credential.clone();
        stored.advance_version();
        let data = serialize(&stored)?;

        let delete = format!("DELETE FROM {SECRETS_TABLE} WHERE credential_id = $1");
        sqlx::query(&delete)
            .bind(stored.id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update secrets: {}", e)))?;

        Self::insert_digests(&mut tx, &stored).await?;

        let update =
            format!("UPDATE {CREDENTIALS_TABLE} SET data = $2, updated_at = $3 WHERE id = $1");
        sqlx::query(&update)
            .bind(stored.id().as_uuid())
            .bind(&data)
            .bind(stored.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update credential: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Secret is already in use"))?;

        Ok(stored)
    }

    async fn list(&self, kind: Option<CredentialKind>) -> Result<Vec<Credential>, DomainError> {
        let rows = match kind {
            Some(kind) => {
                let query = format!(
                    "SELECT data FROM {CREDENTIALS_TABLE} WHERE kind = $1 ORDER BY created_at DESC"
                );
                sqlx::query(&query)
                    .bind(kind.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!("SELECT data FROM {CREDENTIALS_TABLE} ORDER BY created_at DESC");
                sqlx::query(&query).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| DomainError::storage(format!("Failed to list credentials: {}", e)))?;

        rows.into_iter()
            .map(|row| deserialize(row.get("data")))
            .collect()
    }

    async fn count(&self, kind: Option<CredentialKind>) -> Result<usize, DomainError> {
        let row = match kind {
            Some(kind) => {
                let query =
                    format!("SELECT COUNT(*) as count FROM {CREDENTIALS_TABLE} WHERE kind = $1");
                sqlx::query(&query)
                    .bind(kind.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                let query = format!("SELECT COUNT(*) as count FROM {CREDENTIALS_TABLE}");
                sqlx::query(&query).fetch_one(&self.pool).await
            }
        }
        .map_err(|e| DomainError::storage(format!("Failed to count credentials: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
