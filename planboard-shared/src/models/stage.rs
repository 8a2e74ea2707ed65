//! Stage model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE stages (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     project_id UUID NOT NULL REFERENCES projects(id),
//!     name VARCHAR(255) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// A column of a project board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStage {
    pub project_id: Uuid,
    pub name: String,
}

impl Stage {
    pub async fn create(conn: &mut PgConnection, data: NewStage) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"
            INSERT INTO stages (project_id, name)
            VALUES ($1, $2)
            RETURNING id, project_id, name, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"
            SELECT id, project_id, name, created_at
            FROM stages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"
            SELECT id, project_id, name, created_at
            FROM stages
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(conn)
        .await
    }

    /// Deletes every stage of a project; tasks must already be gone
    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stages WHERE project_id = $1")
            .bind(project_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
