//! Storage access seam
//!
//! Services never talk to a database directly. They open a [`Transaction`]
//! from a [`Store`], run every read and write of one operation through it, and
//! then either commit or roll back. Two implementations exist:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, one database transaction per operation
//! - [`MemoryStore`]: in-process tables with the same constraint semantics,
//!   used by tests and `STORE=memory` runs
//!
//! # Constraint Semantics
//!
//! Both implementations report violated uniqueness constraints as
//! [`StoreError::UniqueViolation`] and missing or still-referenced parents as
//! [`StoreError::ForeignKeyViolation`]. Foreign keys never cascade; callers
//! delete children before parents.
//!
//! # Example
//!
//! ```no_run
//! use planboard_shared::store::{MemoryStore, SharedStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), planboard_shared::store::StoreError> {
//! let store: SharedStore = Arc::new(MemoryStore::new());
//!
//! let mut tx = store.begin().await?;
//! let credentials = tx.list_credentials().await?;
//! tx.commit().await?;
//!
//! assert!(credentials.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Comment, Credential, NewComment, NewCredential, NewProfile, NewProject, NewStage, NewTask,
    ParticipantLink, ParticipantProject, ProfileView, Project, ProjectChanges, Stage, Task,
    TaskChanges, UserProfile,
};

pub use memory::{FailPoint, MemoryStore, RowCounts};
pub use postgres::{PgStore, PgTransaction};

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated; carries the constraint name
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row is missing, or a row is still referenced
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Failure injected by [`MemoryStore::fail_after`]
    #[error("Injected failure at {0}")]
    Injected(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }

            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }

        StoreError::Database(err)
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to a store, held by every service
pub type SharedStore = Arc<dyn Store>;

/// Factory for transactions
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transaction; nothing it writes is visible until commit
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;

    /// Verifies the backing storage is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

/// One unit of work against the store
///
/// Dropping a transaction without calling [`commit`](Transaction::commit)
/// discards its writes.
#[async_trait]
pub trait Transaction: Send {
    // Credentials

    async fn insert_credential(&mut self, data: NewCredential) -> StoreResult<Credential>;

    async fn find_credential(&mut self, id: Uuid) -> StoreResult<Option<Credential>>;

    async fn find_credential_by_username(
        &mut self,
        username: &str,
    ) -> StoreResult<Option<Credential>>;

    async fn find_credential_by_email(&mut self, email: &str) -> StoreResult<Option<Credential>>;

    async fn list_credentials(&mut self) -> StoreResult<Vec<Credential>>;

    /// Returns false if the credential does not exist
    async fn update_password_hash(&mut self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    // Profiles

    async fn insert_profile(&mut self, data: NewProfile) -> StoreResult<UserProfile>;

    async fn find_profile(&mut self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn find_profile_by_credential(
        &mut self,
        credential_id: Uuid,
    ) -> StoreResult<Option<UserProfile>>;

    async fn find_profile_view(&mut self, user_id: Uuid) -> StoreResult<Option<ProfileView>>;

    // Projects

    async fn insert_project(&mut self, data: NewProject) -> StoreResult<Project>;

    async fn find_project(&mut self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn list_projects(&mut self) -> StoreResult<Vec<Project>>;

    async fn list_projects_by_creator(&mut self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn list_participant_projects(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ParticipantProject>>;

    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>>;

    async fn delete_project(&mut self, id: Uuid) -> StoreResult<bool>;

    // Participants

    async fn insert_participant(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<ParticipantLink>;

    async fn list_participants(&mut self, project_id: Uuid) -> StoreResult<Vec<ParticipantLink>>;

    async fn delete_participants(&mut self, project_id: Uuid) -> StoreResult<u64>;

    // Stages

    async fn insert_stage(&mut self, data: NewStage) -> StoreResult<Stage>;

    async fn find_stage(&mut self, id: Uuid) -> StoreResult<Option<Stage>>;

    async fn list_stages(&mut self, project_id: Uuid) -> StoreResult<Vec<Stage>>;

    async fn delete_stages(&mut self, project_id: Uuid) -> StoreResult<u64>;

    // Tasks

    async fn insert_task(&mut self, data: NewTask) -> StoreResult<Task>;

    async fn find_task(&mut self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_tasks(&mut self, stage_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(&mut self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    async fn delete_task(&mut self, id: Uuid) -> StoreResult<bool>;

    /// Deletes every task under the project's stages
    async fn delete_project_tasks(&mut self, project_id: Uuid) -> StoreResult<u64>;

    // Comments

    async fn insert_comment(&mut self, data: NewComment) -> StoreResult<Comment>;

    async fn find_comment(&mut self, id: Uuid) -> StoreResult<Option<Comment>>;

    async fn list_comments(&mut self, task_id: Uuid) -> StoreResult<Vec<Comment>>;

    async fn update_comment(&mut self, id: Uuid, description: &str)
        -> StoreResult<Option<Comment>>;

    async fn delete_comment(&mut self, id: Uuid) -> StoreResult<bool>;

    /// Deletes every comment on the project's tasks
    async fn delete_project_comments(&mut self, project_id: Uuid) -> StoreResult<u64>;

    // Lifecycle

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
