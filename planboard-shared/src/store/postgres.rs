//! PostgreSQL store
//!
//! Each [`PgTransaction`] wraps one sqlx transaction and delegates to the
//! query functions on the model types. Dropping it without commit rolls the
//! database transaction back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{Store, StoreResult, Transaction};
use crate::db::pool::health_check;
use crate::models::{
    Comment, Credential, NewComment, NewCredential, NewProfile, NewProject, NewStage, NewTask,
    ParticipantLink, ParticipantProject, ProfileView, Project, ProjectChanges, Stage, Task,
    TaskChanges, UserProfile,
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

/// An open database transaction
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn insert_credential(&mut self, data: NewCredential) -> StoreResult<Credential> {
        Ok(Credential::create(&mut *self.tx, data).await?)
    }

    async fn find_credential(&mut self, id: Uuid) -> StoreResult<Option<Credential>> {
        Ok(Credential::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_credential_by_username(
        &mut self,
        username: &str,
    ) -> StoreResult<Option<Credential>> {
        Ok(Credential::find_by_username(&mut *self.tx, username).await?)
    }

    async fn find_credential_by_email(&mut self, email: &str) -> StoreResult<Option<Credential>> {
        Ok(Credential::find_by_email(&mut *self.tx, email).await?)
    }

    async fn list_credentials(&mut self) -> StoreResult<Vec<Credential>> {
        Ok(Credential::list(&mut *self.tx).await?)
    }

    async fn update_password_hash(&mut self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        Ok(Credential::update_password_hash(&mut *self.tx, id, password_hash).await?)
    }

    async fn insert_profile(&mut self, data: NewProfile) -> StoreResult<UserProfile> {
        Ok(UserProfile::create(&mut *self.tx, data).await?)
    }

    async fn find_profile(&mut self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(UserProfile::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_profile_by_credential(
        &mut self,
        credential_id: Uuid,
    ) -> StoreResult<Option<UserProfile>> {
        Ok(UserProfile::find_by_credential(&mut *self.tx, credential_id).await?)
    }

    async fn find_profile_view(&mut self, user_id: Uuid) -> StoreResult<Option<ProfileView>> {
        Ok(ProfileView::find(&mut *self.tx, user_id).await?)
    }

    async fn insert_project(&mut self, data: NewProject) -> StoreResult<Project> {
        Ok(Project::create(&mut *self.tx, data).await?)
    }

    async fn find_project(&mut self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_projects(&mut self) -> StoreResult<Vec<Project>> {
        Ok(Project::list(&mut *self.tx).await?)
    }

    async fn list_projects_by_creator(&mut self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_by_creator(&mut *self.tx, user_id).await?)
    }

    async fn list_participant_projects(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ParticipantProject>> {
        Ok(ParticipantProject::list_for_user(&mut *self.tx, user_id).await?)
    }

    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::update(&mut *self.tx, id, changes).await?)
    }

    async fn delete_project(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&mut *self.tx, id).await?)
    }

    async fn insert_participant(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<ParticipantLink> {
        Ok(ParticipantLink::create(&mut *self.tx, project_id, user_id).await?)
    }

    async fn list_participants(&mut self, project_id: Uuid) -> StoreResult<Vec<ParticipantLink>> {
        Ok(ParticipantLink::list_by_project(&mut *self.tx, project_id).await?)
    }

    async fn delete_participants(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(ParticipantLink::delete_by_project(&mut *self.tx, project_id).await?)
    }

    async fn insert_stage(&mut self, data: NewStage) -> StoreResult<Stage> {
        Ok(Stage::create(&mut *self.tx, data).await?)
    }

    async fn find_stage(&mut self, id: Uuid) -> StoreResult<Option<Stage>> {
        Ok(Stage::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_stages(&mut self, project_id: Uuid) -> StoreResult<Vec<Stage>> {
        Ok(Stage::list_by_project(&mut *self.tx, project_id).await?)
    }

    async fn delete_stages(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(Stage::delete_by_project(&mut *self.tx, project_id).await?)
    }

    async fn insert_task(&mut self, data: NewTask) -> StoreResult<Task> {
        Ok(Task::create(&mut *self.tx, data).await?)
    }

    async fn find_task(&mut self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_tasks(&mut self, stage_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_stage(&mut *self.tx, stage_id).await?)
    }

    async fn update_task(&mut self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        Ok(Task::update(&mut *self.tx, id, changes).await?)
    }

    async fn delete_task(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&mut *self.tx, id).await?)
    }

    async fn delete_project_tasks(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(Task::delete_by_project(&mut *self.tx, project_id).await?)
    }

    async fn insert_comment(&mut self, data: NewComment) -> StoreResult<Comment> {
        Ok(Comment::create(&mut *self.tx, data).await?)
    }

    async fn find_comment(&mut self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_comments(&mut self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        Ok(Comment::list_by_task(&mut *self.tx, task_id).await?)
    }

    async fn update_comment(
        &mut self,
        id: Uuid,
        description: &str,
    ) -> StoreResult<Option<Comment>> {
        Ok(Comment::update_description(&mut *self.tx, id, description).await?)
    }

    async fn delete_comment(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(Comment::delete(&mut *self.tx, id).await?)
    }

    async fn delete_project_comments(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(Comment::delete_by_project(&mut *self.tx, project_id).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
