//! Project and participant models and database operations
//!
//! A project owns its stages and its participant links. Participant links are
//! a many-to-many join between projects and user profiles; the creator is
//! linked as a participant when the project is created.
//!
//! Foreign keys are `RESTRICT`: a project row can only be removed after its
//! participant links and stages are gone.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     creator_user_id UUID NOT NULL REFERENCES user_profiles(id),
//!     name VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE project_participants (
//!     project_id UUID NOT NULL REFERENCES projects(id),
//!     user_id UUID NOT NULL REFERENCES user_profiles(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (project_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::comment::Comment;
use super::stage::Stage;
use super::task::Task;

/// Project record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// Profile that created the project
    pub creator_user_id: Uuid,

    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub creator_user_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Partial project update; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Membership of a user in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipantLink {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A project the user participates in, with its creator's email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipantProject {
    pub project_id: Uuid,
    pub project_name: String,
    pub creator_email: String,
}

/// Full project tree: stages, their tasks, and the tasks' comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOutline {
    pub project: Project,
    pub stages: Vec<StageOutline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutline {
    pub stage: Stage,
    pub tasks: Vec<TaskOutline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutline {
    pub task: Task,
    pub comments: Vec<Comment>,
}

impl Project {
    pub async fn create(conn: &mut PgConnection, data: NewProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (creator_user_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, creator_user_id, name, description, created_at
            "#,
        )
        .bind(data.creator_user_id)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, creator_user_id, name, description, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Lists every project, oldest first
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, creator_user_id, name, description, created_at
            FROM projects
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(conn)
        .await
    }

    pub async fn list_by_creator(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, creator_user_id, name, description, created_at
            FROM projects
            WHERE creator_user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    /// Applies the non-empty fields of `changes`
    ///
    /// Returns None if the project does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, creator_user_id, name, description, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(conn)
        .await
    }

    /// Deletes the project row only
    ///
    /// Fails with a foreign key violation while participants or stages remain.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ParticipantLink {
    /// Links a user to a project
    ///
    /// # Errors
    ///
    /// Unique violation if the link exists, foreign key violation if either side is missing
    pub async fn create(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ParticipantLink>(
            r#"
            INSERT INTO project_participants (project_id, user_id)
            VALUES ($1, $2)
            RETURNING project_id, user_id, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    pub async fn list_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantLink>(
            r#"
            SELECT project_id, user_id, created_at
            FROM project_participants
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(conn)
        .await
    }

    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_participants WHERE project_id = $1")
            .bind(project_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}

impl ParticipantProject {
    /// Projects the user is linked to, with each project's creator email
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantProject>(
            r#"
            SELECT p.id AS project_id, p.name AS project_name, c.email AS creator_email
            FROM project_participants pp
            JOIN projects p ON p.id = pp.project_id
            JOIN user_profiles u ON u.id = p.creator_user_id
            JOIN credentials c ON c.id = u.credential_id
            WHERE pp.user_id = $1
            ORDER BY pp.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }
}
