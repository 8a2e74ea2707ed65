//! Task model and database operations
//!
//! Tasks live inside a stage. Both the creator and the assignee reference
//! user profiles; reassignment is the only way the assignee changes.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     stage_id UUID NOT NULL REFERENCES stages(id),
//!     creator_user_id UUID NOT NULL REFERENCES user_profiles(id),
//!     assignee_user_id UUID NOT NULL REFERENCES user_profiles(id),
//!     description TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning stage
    pub stage_id: Uuid,

    pub creator_user_id: Uuid,
    pub assignee_user_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub stage_id: Uuid,
    pub creator_user_id: Uuid,
    pub assignee_user_id: Uuid,
    pub description: String,
}

/// Partial task update; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub description: Option<String>,
    pub assignee_user_id: Option<Uuid>,
}

impl TaskChanges {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn assignee(user_id: Uuid) -> Self {
        Self {
            assignee_user_id: Some(user_id),
            ..Default::default()
        }
    }
}

impl Task {
    /// Inserts a task
    ///
    /// # Errors
    ///
    /// Foreign key violation if the stage, creator or assignee does not exist
    pub async fn create(conn: &mut PgConnection, data: NewTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (stage_id, creator_user_id, assignee_user_id, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, stage_id, creator_user_id, assignee_user_id, description, created_at
            "#,
        )
        .bind(data.stage_id)
        .bind(data.creator_user_id)
        .bind(data.assignee_user_id)
        .bind(data.description)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, stage_id, creator_user_id, assignee_user_id, description, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_by_stage(
        conn: &mut PgConnection,
        stage_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, stage_id, creator_user_id, assignee_user_id, description, created_at
            FROM tasks
            WHERE stage_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(stage_id)
        .fetch_all(conn)
        .await
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET description = COALESCE($2, description),
                assignee_user_id = COALESCE($3, assignee_user_id)
            WHERE id = $1
            RETURNING id, stage_id, creator_user_id, assignee_user_id, description, created_at
            "#,
        )
        .bind(id)
        .bind(changes.description)
        .bind(changes.assignee_user_id)
        .fetch_optional(conn)
        .await
    }

    /// Deletes a single task; its comments must already be gone
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task in every stage of a project
    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE stage_id IN (SELECT id FROM stages WHERE project_id = $1)
            "#,
        )
        .bind(project_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_changes_constructors() {
        let changes = TaskChanges::description("Write docs");
        assert_eq!(changes.description.as_deref(), Some("Write docs"));
        assert!(changes.assignee_user_id.is_none());

        let user_id = Uuid::new_v4();
        let changes = TaskChanges::assignee(user_id);
        assert_eq!(changes.assignee_user_id, Some(user_id));
        assert!(changes.description.is_none());
    }
}
