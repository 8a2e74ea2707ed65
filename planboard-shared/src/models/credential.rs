//! Credential model and database operations
//!
//! A credential is the username/email/password-hash triple used to log in.
//! Passwords are stored as Argon2id hashes, never in plaintext. Everything but
//! the hash is immutable after registration.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE credentials (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     username VARCHAR(255) NOT NULL UNIQUE,
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Login credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Credential {
    /// Unique credential ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across credentials
    pub username: String,

    /// Email address, unique across credentials
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a credential
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Public listing entry for a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: Uuid,
    pub email: String,
}

impl From<&Credential> for CredentialSummary {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            email: credential.email.clone(),
        }
    }
}

impl Credential {
    /// Inserts a new credential
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the username or email already exists
    pub async fn create(conn: &mut PgConnection, data: NewCredential) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM credentials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM credentials
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM credentials
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    /// Lists all credentials, oldest first
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM credentials
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(conn)
        .await
    }

    /// Replaces the stored password hash
    ///
    /// Returns false if no credential has this ID.
    pub async fn update_password_hash(
        conn: &mut PgConnection,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE credentials SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
