//! Project hierarchy
//!
//! Projects own stages, stages own tasks, tasks own comments. Every write
//! validates the chain of owners first, failing with `NotFound` for the first
//! missing link. Deletes remove children before parents inside one
//! transaction:
//!
//! ```text
//! delete_project: participants -> comments -> tasks -> stages -> project
//! delete_task:    comments (one by one) -> task
//! ```
//!
//! A store failure partway through a multi-step write rolls back every step
//! and surfaces as [`Error::Transaction`].

use tracing::{debug, info};
use uuid::Uuid;

use super::{aborted, finish, lookup};
use crate::error::{Entity, Error, Result};
use crate::models::{
    Comment, NewComment, NewProject, NewStage, NewTask, ParticipantLink, ParticipantProject,
    Project, ProjectChanges, ProjectOutline, Stage, StageOutline, Task, TaskChanges, TaskOutline,
};
use crate::store::{SharedStore, Transaction};

const CREATE_PROJECT: &str = "create project";
const DELETE_TASK: &str = "delete task";
const DELETE_PROJECT: &str = "delete project";

/// Access layer for projects and everything beneath them
#[derive(Clone)]
pub struct ProjectTree {
    store: SharedStore,
}

impl ProjectTree {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Creates a project and links its creator as the first participant
    ///
    /// # Errors
    ///
    /// - `NotFound` if the creator has no profile
    /// - `Transaction` if either insert fails; neither row is kept
    pub async fn create_project(
        &self,
        creator_user_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::user(tx.as_mut(), creator_user_id).await?;

            let project = tx
                .insert_project(NewProject {
                    creator_user_id,
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .await
                .map_err(aborted(CREATE_PROJECT))?;

            tx.insert_participant(project.id, creator_user_id)
                .await
                .map_err(aborted(CREATE_PROJECT))?;

            Ok::<_, Error>(project.id)
        }
        .await;

        let project_id = finish(tx, outcome, aborted(CREATE_PROJECT)).await?;

        info!(project_id = %project_id, creator_user_id = %creator_user_id, "Project created");
        Ok(project_id)
    }

    pub async fn rename_project(&self, project_id: Uuid, name: &str) -> Result<Project> {
        self.update_project(
            project_id,
            ProjectChanges {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_project_description(
        &self,
        project_id: Uuid,
        description: &str,
    ) -> Result<Project> {
        self.update_project(
            project_id,
            ProjectChanges {
                description: Some(description.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Applies name and/or description changes
    pub async fn update_project(&self, project_id: Uuid, changes: ProjectChanges) -> Result<Project> {
        let mut tx = self.store.begin().await?;
        let outcome = match tx.update_project(project_id, changes).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(Error::not_found(Entity::Project, project_id)),
            Err(e) => Err(e.into()),
        };
        let project = finish(tx, outcome, Error::Store).await?;

        info!(project_id = %project_id, "Project updated");
        Ok(project)
    }

    /// Deletes a project and everything beneath it
    pub async fn delete_project(&self, project_id: Uuid) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;

            let participants = tx
                .delete_participants(project_id)
                .await
                .map_err(aborted(DELETE_PROJECT))?;
            let comments = tx
                .delete_project_comments(project_id)
                .await
                .map_err(aborted(DELETE_PROJECT))?;
            let tasks = tx
                .delete_project_tasks(project_id)
                .await
                .map_err(aborted(DELETE_PROJECT))?;
            let stages = tx
                .delete_stages(project_id)
                .await
                .map_err(aborted(DELETE_PROJECT))?;
            tx.delete_project(project_id)
                .await
                .map_err(aborted(DELETE_PROJECT))?;

            debug!(participants, comments, tasks, stages, "Project children removed");
            Ok::<_, Error>(())
        }
        .await;

        finish(tx, outcome, aborted(DELETE_PROJECT)).await?;

        info!(project_id = %project_id, "Project deleted");
        Ok(())
    }

    /// Every project with its stages, tasks and comments
    pub async fn list_projects(&self) -> Result<Vec<ProjectOutline>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            let mut outlines = Vec::new();
            for project in tx.list_projects().await? {
                outlines.push(outline(tx.as_mut(), project).await?);
            }
            Ok::<_, Error>(outlines)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    /// Projects `user_id` participates in, with each creator's email
    pub async fn list_participant_projects(&self, user_id: Uuid) -> Result<Vec<ParticipantProject>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::user(tx.as_mut(), user_id).await?;
            Ok::<_, Error>(tx.list_participant_projects(user_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    /// Projects created by `user_id`
    pub async fn list_created_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::user(tx.as_mut(), user_id).await?;
            Ok::<_, Error>(tx.list_projects_by_creator(user_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    /// Adds `user_id` to a project
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown project or user
    /// - `Conflict` if the user already participates
    pub async fn link_participant(&self, project_id: Uuid, user_id: Uuid) -> Result<ParticipantLink> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            lookup::user(tx.as_mut(), user_id).await?;

            tx.insert_participant(project_id, user_id)
                .await
                .map_err(|e| Error::conflict_or_store(e, "User already participates in project"))
        }
        .await;
        let link = finish(tx, outcome, Error::Store).await?;

        info!(project_id = %project_id, user_id = %user_id, "Participant linked");
        Ok(link)
    }

    pub async fn list_participants(&self, project_id: Uuid) -> Result<Vec<ParticipantLink>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            Ok::<_, Error>(tx.list_participants(project_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    pub async fn add_stage(&self, project_id: Uuid, name: &str) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            let stage = tx
                .insert_stage(NewStage {
                    project_id,
                    name: name.to_string(),
                })
                .await?;
            Ok::<_, Error>(stage.id)
        }
        .await;
        let stage_id = finish(tx, outcome, Error::Store).await?;

        info!(project_id = %project_id, stage_id = %stage_id, "Stage added");
        Ok(stage_id)
    }

    pub async fn list_stages(&self, project_id: Uuid) -> Result<Vec<Stage>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            Ok::<_, Error>(tx.list_stages(project_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    /// Tasks of a stage; the project and then the stage must resolve
    pub async fn list_tasks(&self, project_id: Uuid, stage_id: Uuid) -> Result<Vec<Task>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            lookup::stage_in(tx.as_mut(), project_id, stage_id).await?;
            Ok::<_, Error>(tx.list_tasks(stage_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    /// Adds a task to a stage
    ///
    /// # Errors
    ///
    /// `NotFound` naming the first of project, stage, creator or assignee that
    /// does not resolve
    pub async fn add_task(
        &self,
        project_id: Uuid,
        stage_id: Uuid,
        creator_user_id: Uuid,
        assignee_user_id: Uuid,
        description: &str,
    ) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::project(tx.as_mut(), project_id).await?;
            lookup::stage_in(tx.as_mut(), project_id, stage_id).await?;
            lookup::user(tx.as_mut(), creator_user_id).await?;
            lookup::user(tx.as_mut(), assignee_user_id).await?;

            let task = tx
                .insert_task(NewTask {
                    stage_id,
                    creator_user_id,
                    assignee_user_id,
                    description: description.to_string(),
                })
                .await?;
            Ok::<_, Error>(task.id)
        }
        .await;
        let task_id = finish(tx, outcome, Error::Store).await?;

        info!(task_id = %task_id, stage_id = %stage_id, "Task added");
        Ok(task_id)
    }

    pub async fn edit_task_description(&self, task_id: Uuid, description: &str) -> Result<Task> {
        self.update_task(task_id, TaskChanges::description(description))
            .await
    }

    /// Moves a task to another assignee
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task or assignee
    pub async fn reassign_task(&self, task_id: Uuid, assignee_user_id: Uuid) -> Result<Task> {
        self.update_task(task_id, TaskChanges::assignee(assignee_user_id))
            .await
    }

    async fn update_task(&self, task_id: Uuid, changes: TaskChanges) -> Result<Task> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::task(tx.as_mut(), task_id).await?;
            if let Some(assignee) = changes.assignee_user_id {
                lookup::user(tx.as_mut(), assignee).await?;
            }

            tx.update_task(task_id, changes)
                .await?
                .ok_or_else(|| Error::not_found(Entity::Task, task_id))
        }
        .await;
        let task = finish(tx, outcome, Error::Store).await?;

        info!(task_id = %task_id, assignee_user_id = %task.assignee_user_id, "Task updated");
        Ok(task)
    }

    /// Deletes a task after deleting its comments one by one
    pub async fn delete_task(&self, task_id: Uuid) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::task(tx.as_mut(), task_id).await?;

            let comments = tx
                .list_comments(task_id)
                .await
                .map_err(aborted(DELETE_TASK))?;
            for comment in &comments {
                tx.delete_comment(comment.id)
                    .await
                    .map_err(aborted(DELETE_TASK))?;
            }

            tx.delete_task(task_id)
                .await
                .map_err(aborted(DELETE_TASK))?;

            Ok::<_, Error>(comments.len())
        }
        .await;
        let comments = finish(tx, outcome, aborted(DELETE_TASK)).await?;

        info!(task_id = %task_id, comments, "Task deleted");
        Ok(())
    }

    /// Comments on a task; project, stage and task must resolve in that order
    pub async fn list_comments(
        &self,
        project_id: Uuid,
        stage_id: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<Comment>> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::task_path(tx.as_mut(), project_id, stage_id, task_id).await?;
            Ok::<_, Error>(tx.list_comments(task_id).await?)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    pub async fn add_comment(
        &self,
        task_id: Uuid,
        creator_user_id: Uuid,
        description: &str,
    ) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::task(tx.as_mut(), task_id).await?;
            lookup::user(tx.as_mut(), creator_user_id).await?;

            let comment = tx
                .insert_comment(NewComment {
                    task_id,
                    creator_user_id,
                    description: description.to_string(),
                })
                .await?;
            Ok::<_, Error>(comment.id)
        }
        .await;
        let comment_id = finish(tx, outcome, Error::Store).await?;

        info!(comment_id = %comment_id, task_id = %task_id, "Comment added");
        Ok(comment_id)
    }

    pub async fn edit_comment(&self, comment_id: Uuid, description: &str) -> Result<Comment> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::comment(tx.as_mut(), comment_id).await?;
            tx.update_comment(comment_id, description)
                .await?
                .ok_or_else(|| Error::not_found(Entity::Comment, comment_id))
        }
        .await;
        let comment = finish(tx, outcome, Error::Store).await?;

        info!(comment_id = %comment_id, "Comment edited");
        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            lookup::comment(tx.as_mut(), comment_id).await?;
            tx.delete_comment(comment_id).await?;
            Ok::<_, Error>(())
        }
        .await;
        finish(tx, outcome, Error::Store).await?;

        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}

async fn outline(tx: &mut dyn Transaction, project: Project) -> Result<ProjectOutline> {
    let mut stages = Vec::new();

    for stage in tx.list_stages(project.id).await? {
        let mut tasks = Vec::new();
        for task in tx.list_tasks(stage.id).await? {
            let comments = tx.list_comments(task.id).await?;
            tasks.push(TaskOutline { task, comments });
        }
        stages.push(StageOutline { stage, tasks });
    }

    Ok(ProjectOutline { project, stages })
}
