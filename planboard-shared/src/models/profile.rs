//! User profile model and database operations
//!
//! A profile holds the non-authentication attributes of a user and is linked
//! one-to-one to a [`Credential`](super::credential::Credential). Projects,
//! tasks and comments reference profiles, never credentials.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE user_profiles (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     credential_id UUID NOT NULL UNIQUE REFERENCES credentials(id),
//!     display_name VARCHAR(255) NOT NULL,
//!     full_name VARCHAR(255) NOT NULL,
//!     birth_date DATE,
//!     avatar_ref VARCHAR(512),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Application user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    /// User ID referenced by projects, tasks and comments
    pub id: Uuid,

    /// Owning credential (unique)
    pub credential_id: Uuid,

    /// Short name shown in the UI
    pub display_name: String,

    pub full_name: String,

    pub birth_date: Option<NaiveDate>,

    /// Opaque reference to an avatar image
    pub avatar_ref: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Profile attributes supplied at creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub display_name: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub avatar_ref: Option<String>,
}

/// Input for inserting a profile
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub credential_id: Uuid,
    pub fields: ProfileFields,
}

/// Profile joined with its credential's username and email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileView {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub avatar_ref: Option<String>,
}

impl UserProfile {
    /// Inserts a profile for an existing credential
    ///
    /// # Errors
    ///
    /// - Unique violation if the credential already has a profile
    /// - Foreign key violation if the credential does not exist
    pub async fn create(conn: &mut PgConnection, data: NewProfile) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (credential_id, display_name, full_name, birth_date, avatar_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, credential_id, display_name, full_name, birth_date, avatar_ref, created_at
            "#,
        )
        .bind(data.credential_id)
        .bind(data.fields.display_name)
        .bind(data.fields.full_name)
        .bind(data.fields.birth_date)
        .bind(data.fields.avatar_ref)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, credential_id, display_name, full_name, birth_date, avatar_ref, created_at
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_credential(
        conn: &mut PgConnection,
        credential_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, credential_id, display_name, full_name, birth_date, avatar_ref, created_at
            FROM user_profiles
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id)
        .fetch_optional(conn)
        .await
    }
}

impl ProfileView {
    pub async fn find(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProfileView>(
            r#"
            SELECT p.id AS user_id, c.username, c.email, p.display_name, p.full_name,
                   p.birth_date, p.avatar_ref
            FROM user_profiles p
            JOIN credentials c ON c.id = p.credential_id
            WHERE p.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields_default() {
        let fields = ProfileFields::default();
        assert!(fields.display_name.is_empty());
        assert!(fields.birth_date.is_none());
        assert!(fields.avatar_ref.is_none());
    }

    #[test]
    fn test_profile_fields_deserialize_with_optional_fields() {
        let fields: ProfileFields = serde_json::from_value(serde_json::json!({
            "display_name": "Al",
            "full_name": "Alice Liddell",
            "birth_date": "1852-05-04",
            "avatar_ref": null
        }))
        .unwrap();

        assert_eq!(fields.birth_date, NaiveDate::from_ymd_opt(1852, 5, 4));
        assert!(fields.avatar_ref.is_none());
    }
}
