//! Hierarchy lookups
//!
//! Each lookup loads one row or fails with a typed `NotFound`. The scoped
//! variants also require the row to belong to the given parent, so a stage id
//! from another project reads as absent.

use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::models::{Comment, Credential, Project, Stage, Task, UserProfile};
use crate::store::Transaction;

pub(crate) async fn credential(tx: &mut dyn Transaction, id: Uuid) -> Result<Credential> {
    tx.find_credential(id)
        .await?
        .ok_or_else(|| Error::not_found(Entity::Credential, id))
}

pub(crate) async fn user(tx: &mut dyn Transaction, id: Uuid) -> Result<UserProfile> {
    tx.find_profile(id)
        .await?
        .ok_or_else(|| Error::not_found(Entity::User, id))
}

pub(crate) async fn project(tx: &mut dyn Transaction, id: Uuid) -> Result<Project> {
    tx.find_project(id)
        .await?
        .ok_or_else(|| Error::not_found(Entity::Project, id))
}

pub(crate) async fn task(tx: &mut dyn Transaction, id: Uuid) -> Result<Task> {
    tx.find_task(id)
        .await?
        .ok_or_else(|| Error::not_found(Entity::Task, id))
}

pub(crate) async fn comment(tx: &mut dyn Transaction, id: Uuid) -> Result<Comment> {
    tx.find_comment(id)
        .await?
        .ok_or_else(|| Error::not_found(Entity::Comment, id))
}

/// Stage `stage_id` of project `project_id`
pub(crate) async fn stage_in(
    tx: &mut dyn Transaction,
    project_id: Uuid,
    stage_id: Uuid,
) -> Result<Stage> {
    match tx.find_stage(stage_id).await? {
        Some(stage) if stage.project_id == project_id => Ok(stage),
        _ => Err(Error::not_found(Entity::Stage, stage_id)),
    }
}

/// Task `task_id` of stage `stage_id`
pub(crate) async fn task_in(tx: &mut dyn Transaction, stage_id: Uuid, task_id: Uuid) -> Result<Task> {
    match tx.find_task(task_id).await? {
        Some(task) if task.stage_id == stage_id => Ok(task),
        _ => Err(Error::not_found(Entity::Task, task_id)),
    }
}

/// Resolves project, then stage, then task
pub(crate) async fn task_path(
    tx: &mut dyn Transaction,
    project_id: Uuid,
    stage_id: Uuid,
    task_id: Uuid,
) -> Result<Task> {
    project(tx, project_id).await?;
    stage_in(tx, project_id, stage_id).await?;
    task_in(tx, stage_id, task_id).await
}
