//! In-memory store
//!
//! Tables are plain vectors behind one async mutex. A transaction takes the
//! lock for its whole lifetime and works on a copy of the tables; commit
//! writes the copy back, rollback or drop throws it away. Transactions are
//! therefore serialized, and a task must never open a second transaction while
//! holding the first.
//!
//! Unique and foreign key constraints mirror the PostgreSQL schema, including
//! the refusal to delete rows that are still referenced.
//!
//! # Failure Injection
//!
//! [`MemoryStore::fail_after`] makes a chosen write fail with
//! [`StoreError::Injected`] after a number of successful calls, which lets
//! tests observe rollback of multi-step writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, Transaction};
use crate::models::{
    Comment, Credential, NewComment, NewCredential, NewProfile, NewProject, NewStage, NewTask,
    ParticipantLink, ParticipantProject, ProfileView, Project, ProjectChanges, Stage, Task,
    TaskChanges, UserProfile,
};

/// Writes that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertCredential,
    UpdatePasswordHash,
    InsertProfile,
    InsertProject,
    UpdateProject,
    DeleteProject,
    InsertParticipant,
    DeleteParticipants,
    InsertStage,
    DeleteStages,
    InsertTask,
    UpdateTask,
    DeleteTask,
    DeleteProjectTasks,
    InsertComment,
    UpdateComment,
    DeleteComment,
    DeleteProjectComments,
    Commit,
}

/// Row counts per table, for asserting that nothing was left behind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub credentials: usize,
    pub profiles: usize,
    pub projects: usize,
    pub participants: usize,
    pub stages: usize,
    pub tasks: usize,
    pub comments: usize,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    credentials: Vec<Credential>,
    profiles: Vec<UserProfile>,
    projects: Vec<Project>,
    participants: Vec<ParticipantLink>,
    stages: Vec<Stage>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
}

type Faults = Arc<StdMutex<HashMap<FailPoint, usize>>>;

/// Store holding all rows in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `point` succeed `successes` times, then fails every later call
    /// until [`clear_faults`](Self::clear_faults)
    pub fn fail_after(&self, point: FailPoint, successes: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(point, successes);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    async fn transaction(&self) -> MemoryTransaction {
        let guard = Arc::clone(&self.tables).lock_owned().await;

        MemoryTransaction {
            guard,
            working: None,
            faults: Arc::clone(&self.faults),
        }
    }

    /// Committed row counts
    pub async fn row_counts(&self) -> RowCounts {
        let tables = self.tables.lock().await;
        RowCounts {
            credentials: tables.credentials.len(),
            profiles: tables.profiles.len(),
            projects: tables.projects.len(),
            participants: tables.participants.len(),
            stages: tables.stages.len(),
            tasks: tables.tasks.len(),
            comments: tables.comments.len(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        Ok(Box::new(self.transaction().await))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Transaction holding the table lock
///
/// Reads go to the committed tables until the first write, which takes a
/// private copy. Commit publishes the copy; dropping the transaction discards it.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Option<Tables>,
    faults: Faults,
}

fn fk(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation(constraint.to_string())
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation(constraint.to_string())
}

impl MemoryTransaction {
    fn trip(&self, point: FailPoint) -> StoreResult<()> {
        let mut faults = match self.faults.lock() {
            Ok(faults) => faults,
            Err(poisoned) => poisoned.into_inner(),
        };

        match faults.get_mut(&point) {
            Some(0) => Err(StoreError::Injected(format!("{:?}", point))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let guard = &self.guard;
        self.working.get_or_insert_with(|| Tables::clone(guard))
    }

    /// Whether a write has forked the tables
    #[cfg(test)]
    fn is_dirty(&self) -> bool {
        self.working.is_some()
    }

    fn profile_exists(&self, id: Uuid) -> bool {
        self.tables().profiles.iter().any(|p| p.id == id)
    }

    fn project_stage_ids(&self, project_id: Uuid) -> Vec<Uuid> {
        self.tables()
            .stages
            .iter()
            .filter(|s| s.project_id == project_id)
            .map(|s| s.id)
            .collect()
    }

    fn project_task_ids(&self, project_id: Uuid) -> Vec<Uuid> {
        let stage_ids = self.project_stage_ids(project_id);
        self.tables()
            .tasks
            .iter()
            .filter(|t| stage_ids.contains(&t.stage_id))
            .map(|t| t.id)
            .collect()
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn insert_credential(&mut self, data: NewCredential) -> StoreResult<Credential> {
        self.trip(FailPoint::InsertCredential)?;

        if self.tables().credentials.iter().any(|c| c.username == data.username) {
            return Err(unique("credentials_username_key"));
        }
        if self.tables().credentials.iter().any(|c| c.email == data.email) {
            return Err(unique("credentials_email_key"));
        }

        let credential = Credential {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        self.tables_mut().credentials.push(credential.clone());
        Ok(credential)
    }

    async fn find_credential(&mut self, id: Uuid) -> StoreResult<Option<Credential>> {
        Ok(self.tables().credentials.iter().find(|c| c.id == id).cloned())
    }

    async fn find_credential_by_username(
        &mut self,
        username: &str,
    ) -> StoreResult<Option<Credential>> {
        Ok(self
            .tables()
            .credentials
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn find_credential_by_email(&mut self, email: &str) -> StoreResult<Option<Credential>> {
        Ok(self
            .tables()
            .credentials
            .iter()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn list_credentials(&mut self) -> StoreResult<Vec<Credential>> {
        Ok(self.tables().credentials.clone())
    }

    async fn update_password_hash(&mut self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        self.trip(FailPoint::UpdatePasswordHash)?;

        match self.tables_mut().credentials.iter_mut().find(|c| c.id == id) {
            Some(credential) => {
                credential.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_profile(&mut self, data: NewProfile) -> StoreResult<UserProfile> {
        self.trip(FailPoint::InsertProfile)?;

        if !self.tables().credentials.iter().any(|c| c.id == data.credential_id) {
            return Err(fk("user_profiles_credential_id_fkey"));
        }
        if self
            .tables()
            .profiles
            .iter()
            .any(|p| p.credential_id == data.credential_id)
        {
            return Err(unique("user_profiles_credential_id_key"));
        }

        let profile = UserProfile {
            id: Uuid::new_v4(),
            credential_id: data.credential_id,
            display_name: data.fields.display_name,
            full_name: data.fields.full_name,
            birth_date: data.fields.birth_date,
            avatar_ref: data.fields.avatar_ref,
            created_at: Utc::now(),
        };
        self.tables_mut().profiles.push(profile.clone());
        Ok(profile)
    }

    async fn find_profile(&mut self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.tables().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_profile_by_credential(
        &mut self,
        credential_id: Uuid,
    ) -> StoreResult<Option<UserProfile>> {
        Ok(self
            .tables()
            .profiles
            .iter()
            .find(|p| p.credential_id == credential_id)
            .cloned())
    }

    async fn find_profile_view(&mut self, user_id: Uuid) -> StoreResult<Option<ProfileView>> {
        let Some(profile) = self.tables().profiles.iter().find(|p| p.id == user_id) else {
            return Ok(None);
        };
        let Some(credential) = self
            .tables()
            .credentials
            .iter()
            .find(|c| c.id == profile.credential_id)
        else {
            return Ok(None);
        };

        Ok(Some(ProfileView {
            user_id: profile.id,
            username: credential.username.clone(),
            email: credential.email.clone(),
            display_name: profile.display_name.clone(),
            full_name: profile.full_name.clone(),
            birth_date: profile.birth_date,
            avatar_ref: profile.avatar_ref.clone(),
        }))
    }

    async fn insert_project(&mut self, data: NewProject) -> StoreResult<Project> {
        self.trip(FailPoint::InsertProject)?;

        if !self.profile_exists(data.creator_user_id) {
            return Err(fk("projects_creator_user_id_fkey"));
        }

        let project = Project {
            id: Uuid::new_v4(),
            creator_user_id: data.creator_user_id,
            name: data.name,
            description: data.description,
            created_at: Utc::now(),
        };
        self.tables_mut().projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&mut self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.tables().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&mut self) -> StoreResult<Vec<Project>> {
        Ok(self.tables().projects.clone())
    }

    async fn list_projects_by_creator(&mut self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(self
            .tables()
            .projects
            .iter()
            .filter(|p| p.creator_user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_participant_projects(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ParticipantProject>> {
        let tables = self.tables();
        let rows = tables
            .participants
            .iter()
            .filter(|link| link.user_id == user_id)
            .filter_map(|link| {
                let project = tables.projects.iter().find(|p| p.id == link.project_id)?;
                let creator = tables
                    .profiles
                    .iter()
                    .find(|p| p.id == project.creator_user_id)?;
                let credential = tables
                    .credentials
                    .iter()
                    .find(|c| c.id == creator.credential_id)?;

                Some(ParticipantProject {
                    project_id: project.id,
                    project_name: project.name.clone(),
                    creator_email: credential.email.clone(),
                })
            })
            .collect();

        Ok(rows)
    }

    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        self.trip(FailPoint::UpdateProject)?;

        let Some(project) = self.tables_mut().projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        Ok(Some(project.clone()))
    }

    async fn delete_project(&mut self, id: Uuid) -> StoreResult<bool> {
        self.trip(FailPoint::DeleteProject)?;

        if self.tables().participants.iter().any(|l| l.project_id == id) {
            return Err(fk("project_participants_project_id_fkey"));
        }
        if self.tables().stages.iter().any(|s| s.project_id == id) {
            return Err(fk("stages_project_id_fkey"));
        }

        let before = self.tables().projects.len();
        self.tables_mut().projects.retain(|p| p.id != id);
        Ok(self.tables().projects.len() < before)
    }

    async fn insert_participant(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<ParticipantLink> {
        self.trip(FailPoint::InsertParticipant)?;

        if !self.tables().projects.iter().any(|p| p.id == project_id) {
            return Err(fk("project_participants_project_id_fkey"));
        }
        if !self.profile_exists(user_id) {
            return Err(fk("project_participants_user_id_fkey"));
        }
        if self
            .tables()
            .participants
            .iter()
            .any(|l| l.project_id == project_id && l.user_id == user_id)
        {
            return Err(unique("project_participants_pkey"));
        }

        let link = ParticipantLink {
            project_id,
            user_id,
            created_at: Utc::now(),
        };
        self.tables_mut().participants.push(link.clone());
        Ok(link)
    }

    async fn list_participants(&mut self, project_id: Uuid) -> StoreResult<Vec<ParticipantLink>> {
        Ok(self
            .tables()
            .participants
            .iter()
            .filter(|l| l.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_participants(&mut self, project_id: Uuid) -> StoreResult<u64> {
        self.trip(FailPoint::DeleteParticipants)?;

        let before = self.tables().participants.len();
        self.tables_mut().participants.retain(|l| l.project_id != project_id);
        Ok((before - self.tables().participants.len()) as u64)
    }

    async fn insert_stage(&mut self, data: NewStage) -> StoreResult<Stage> {
        self.trip(FailPoint::InsertStage)?;

        if !self.tables().projects.iter().any(|p| p.id == data.project_id) {
            return Err(fk("stages_project_id_fkey"));
        }

        let stage = Stage {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            name: data.name,
            created_at: Utc::now(),
        };
        self.tables_mut().stages.push(stage.clone());
        Ok(stage)
    }

    async fn find_stage(&mut self, id: Uuid) -> StoreResult<Option<Stage>> {
        Ok(self.tables().stages.iter().find(|s| s.id == id).cloned())
    }

    async fn list_stages(&mut self, project_id: Uuid) -> StoreResult<Vec<Stage>> {
        Ok(self
            .tables()
            .stages
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_stages(&mut self, project_id: Uuid) -> StoreResult<u64> {
        self.trip(FailPoint::DeleteStages)?;

        let stage_ids = self.project_stage_ids(project_id);
        if self.tables().tasks.iter().any(|t| stage_ids.contains(&t.stage_id)) {
            return Err(fk("tasks_stage_id_fkey"));
        }

        let before = self.tables().stages.len();
        self.tables_mut().stages.retain(|s| s.project_id != project_id);
        Ok((before - self.tables().stages.len()) as u64)
    }

    async fn insert_task(&mut self, data: NewTask) -> StoreResult<Task> {
        self.trip(FailPoint::InsertTask)?;

        if !self.tables().stages.iter().any(|s| s.id == data.stage_id) {
            return Err(fk("tasks_stage_id_fkey"));
        }
        if !self.profile_exists(data.creator_user_id) {
            return Err(fk("tasks_creator_user_id_fkey"));
        }
        if !self.profile_exists(data.assignee_user_id) {
            return Err(fk("tasks_assignee_user_id_fkey"));
        }

        let task = Task {
            id: Uuid::new_v4(),
            stage_id: data.stage_id,
            creator_user_id: data.creator_user_id,
            assignee_user_id: data.assignee_user_id,
            description: data.description,
            created_at: Utc::now(),
        };
        self.tables_mut().tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&mut self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tables().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&mut self, stage_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(self
            .tables()
            .tasks
            .iter()
            .filter(|t| t.stage_id == stage_id)
            .cloned()
            .collect())
    }

    async fn update_task(&mut self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        self.trip(FailPoint::UpdateTask)?;

        if let Some(assignee) = changes.assignee_user_id {
            if !self.profile_exists(assignee) {
                return Err(fk("tasks_assignee_user_id_fkey"));
            }
        }

        let Some(task) = self.tables_mut().tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(assignee) = changes.assignee_user_id {
            task.assignee_user_id = assignee;
        }
        Ok(Some(task.clone()))
    }

    async fn delete_task(&mut self, id: Uuid) -> StoreResult<bool> {
        self.trip(FailPoint::DeleteTask)?;

        if self.tables().comments.iter().any(|c| c.task_id == id) {
            return Err(fk("comments_task_id_fkey"));
        }

        let before = self.tables().tasks.len();
        self.tables_mut().tasks.retain(|t| t.id != id);
        Ok(self.tables().tasks.len() < before)
    }

    async fn delete_project_tasks(&mut self, project_id: Uuid) -> StoreResult<u64> {
        self.trip(FailPoint::DeleteProjectTasks)?;

        let task_ids = self.project_task_ids(project_id);
        if self.tables().comments.iter().any(|c| task_ids.contains(&c.task_id)) {
            return Err(fk("comments_task_id_fkey"));
        }

        let before = self.tables().tasks.len();
        self.tables_mut().tasks.retain(|t| !task_ids.contains(&t.id));
        Ok((before - self.tables().tasks.len()) as u64)
    }

    async fn insert_comment(&mut self, data: NewComment) -> StoreResult<Comment> {
        self.trip(FailPoint::InsertComment)?;

        if !self.tables().tasks.iter().any(|t| t.id == data.task_id) {
            return Err(fk("comments_task_id_fkey"));
        }
        if !self.profile_exists(data.creator_user_id) {
            return Err(fk("comments_creator_user_id_fkey"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            task_id: data.task_id,
            creator_user_id: data.creator_user_id,
            description: data.description,
            created_at: Utc::now(),
        };
        self.tables_mut().comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&mut self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.tables().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&mut self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        Ok(self
            .tables()
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn update_comment(
        &mut self,
        id: Uuid,
        description: &str,
    ) -> StoreResult<Option<Comment>> {
        self.trip(FailPoint::UpdateComment)?;

        let Some(comment) = self.tables_mut().comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.description = description.to_string();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&mut self, id: Uuid) -> StoreResult<bool> {
        self.trip(FailPoint::DeleteComment)?;

        let before = self.tables().comments.len();
        self.tables_mut().comments.retain(|c| c.id != id);
        Ok(self.tables().comments.len() < before)
    }

    async fn delete_project_comments(&mut self, project_id: Uuid) -> StoreResult<u64> {
        self.trip(FailPoint::DeleteProjectComments)?;

        let task_ids = self.project_task_ids(project_id);
        let before = self.tables().comments.len();
        self.tables_mut().comments.retain(|c| !task_ids.contains(&c.task_id));
        Ok((before - self.tables().comments.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.trip(FailPoint::Commit)?;

        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileFields;

    fn new_credential(username: &str, email: &str) -> NewCredential {
        NewCredential {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    async fn seed_user(store: &MemoryStore, username: &str) -> UserProfile {
        let mut tx = store.begin().await.unwrap();
        let credential = tx
            .insert_credential(new_credential(username, &format!("{}@x.com", username)))
            .await
            .unwrap();
        let profile = tx
            .insert_profile(NewProfile {
                credential_id: credential.id,
                fields: ProfileFields {
                    display_name: username.to_string(),
                    full_name: username.to_string(),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        profile
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_credential(new_credential("alice", "a@x.com"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.row_counts().await.credentials, 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_credential(new_credential("alice", "a@x.com"))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_credential(new_credential("bob", "b@x.com"))
                .await
                .unwrap();
        }

        assert_eq!(store.row_counts().await, RowCounts::default());
    }

    #[tokio::test]
    async fn test_reads_do_not_copy_tables() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;

        let mut tx = store.transaction().await;
        assert!(tx.find_profile(user.id).await.unwrap().is_some());
        assert_eq!(tx.list_credentials().await.unwrap().len(), 1);
        assert!(tx
            .insert_credential(new_credential("alice", "other@x.com"))
            .await
            .is_err());
        assert!(!tx.is_dirty());

        tx.insert_credential(new_credential("bob", "b@x.com"))
            .await
            .unwrap();
        assert!(tx.is_dirty());
        assert_eq!(tx.list_credentials().await.unwrap().len(), 2);
        Box::new(tx).rollback().await.unwrap();

        let tx = store.transaction().await;
        Box::new(tx).commit().await.unwrap();
        assert_eq!(store.row_counts().await.credentials, 1);
        assert_eq!(store.row_counts().await.profiles, 1);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        tx.insert_credential(new_credential("alice", "a@x.com"))
            .await
            .unwrap();

        let err = tx
            .insert_credential(new_credential("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(c) if c == "credentials_username_key"));

        let err = tx
            .insert_credential(new_credential("other", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(c) if c == "credentials_email_key"));
    }

    #[tokio::test]
    async fn test_profile_requires_existing_credential() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let err = tx
            .insert_profile(NewProfile {
                credential_id: Uuid::new_v4(),
                fields: ProfileFields::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_delete_restricted_while_children_exist() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;

        let mut tx = store.begin().await.unwrap();
        let project = tx
            .insert_project(NewProject {
                creator_user_id: user.id,
                name: "P".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let stage = tx
            .insert_stage(NewStage {
                project_id: project.id,
                name: "Todo".to_string(),
            })
            .await
            .unwrap();
        let task = tx
            .insert_task(NewTask {
                stage_id: stage.id,
                creator_user_id: user.id,
                assignee_user_id: user.id,
                description: "T".to_string(),
            })
            .await
            .unwrap();
        tx.insert_comment(NewComment {
            task_id: task.id,
            creator_user_id: user.id,
            description: "c".to_string(),
        })
        .await
        .unwrap();

        assert!(matches!(
            tx.delete_task(task.id).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));
        assert!(matches!(
            tx.delete_stages(project.id).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));
        assert!(matches!(
            tx.delete_project(project.id).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));

        assert_eq!(tx.delete_project_comments(project.id).await.unwrap(), 1);
        assert_eq!(tx.delete_project_tasks(project.id).await.unwrap(), 1);
        assert_eq!(tx.delete_stages(project.id).await.unwrap(), 1);
        assert!(tx.delete_project(project.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_after_counts_successes() {
        let store = MemoryStore::new();
        store.fail_after(FailPoint::InsertCredential, 1);

        let mut tx = store.begin().await.unwrap();
        tx.insert_credential(new_credential("alice", "a@x.com"))
            .await
            .unwrap();

        let err = tx
            .insert_credential(new_credential("bob", "b@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Injected(_)));

        store.clear_faults();
        tx.insert_credential(new_credential("bob", "b@x.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_participant_projects_carry_creator_email() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;

        let mut tx = store.begin().await.unwrap();
        let project = tx
            .insert_project(NewProject {
                creator_user_id: alice.id,
                name: "Shared".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        tx.insert_participant(project.id, bob.id).await.unwrap();

        let rows = tx.list_participant_projects(bob.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_name, "Shared");
        assert_eq!(rows[0].creator_email, "alice@x.com");

        assert!(matches!(
            tx.insert_participant(project.id, bob.id).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }
}
