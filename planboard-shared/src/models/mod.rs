//! Database records and their PostgreSQL queries
//!
//! Every query function takes a `&mut PgConnection` so it can run inside the
//! transaction owned by [`PgTransaction`](crate::store::postgres::PgTransaction).
//!
//! # Models
//!
//! - `credential`: login credentials (username, email, password hash)
//! - `profile`: user profiles, one per credential
//! - `project`: projects, participant links and the read models built on them
//! - `stage`: project stages
//! - `task`: tasks within a stage
//! - `comment`: comments on a task

pub mod comment;
pub mod credential;
pub mod profile;
pub mod project;
pub mod stage;
pub mod task;

pub use comment::{Comment, NewComment};
pub use credential::{Credential, CredentialSummary, NewCredential};
pub use profile::{NewProfile, ProfileFields, ProfileView, UserProfile};
pub use project::{
    NewProject, ParticipantLink, ParticipantProject, Project, ProjectChanges, ProjectOutline,
    StageOutline, TaskOutline,
};
pub use stage::{NewStage, Stage};
pub use task::{NewTask, Task, TaskChanges};
