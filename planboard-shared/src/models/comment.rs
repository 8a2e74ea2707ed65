//! Comment model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE comments (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     task_id UUID NOT NULL REFERENCES tasks(id),
//!     creator_user_id UUID NOT NULL REFERENCES user_profiles(id),
//!     description TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Comment on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub creator_user_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: Uuid,
    pub creator_user_id: Uuid,
    pub description: String,
}

impl Comment {
    pub async fn create(conn: &mut PgConnection, data: NewComment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, creator_user_id, description)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, creator_user_id, description, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.creator_user_id)
        .bind(data.description)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, creator_user_id, description, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_by_task(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, creator_user_id, description, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(conn)
        .await
    }

    pub async fn update_description(
        conn: &mut PgConnection,
        id: Uuid,
        description: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET description = $2
            WHERE id = $1
            RETURNING id, task_id, creator_user_id, description, created_at
            "#,
        )
        .bind(id)
        .bind(description)
        .fetch_optional(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every comment on every task of a project
    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE task_id IN (
                SELECT t.id FROM tasks t
                JOIN stages s ON s.id = t.stage_id
                WHERE s.project_id = $1
            )
            "#,
        )
        .bind(project_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}
