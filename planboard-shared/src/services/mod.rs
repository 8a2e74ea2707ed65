//! Core services
//!
//! Each service holds a [`SharedStore`] and runs every operation in exactly
//! one store transaction. A failed operation rolls its transaction back, so
//! multi-step writes are all-or-nothing.
//!
//! - [`CredentialStore`]: registration, password verification and change
//! - [`UserDirectory`]: profiles and the profile/credential mapping
//! - [`ProjectTree`]: projects, stages, tasks, comments and participants
//! - [`Sessions`]: login, logout and token authentication
//!
//! [`Services`] wires all four over one store.

pub mod credentials;
pub mod directory;
pub(crate) mod lookup;
pub mod projects;
pub mod sessions;

use tracing::warn;

use crate::auth::password::HashingConfig;
use crate::auth::token::{TokenConfig, TokenService};
use crate::error::{Error, Result};
use crate::store::{SharedStore, StoreError, Transaction};

pub use credentials::CredentialStore;
pub use directory::UserDirectory;
pub use projects::ProjectTree;
pub use sessions::{LoginSession, Sessions};

/// All services over a single store
#[derive(Clone)]
pub struct Services {
    pub credentials: CredentialStore,
    pub directory: UserDirectory,
    pub projects: ProjectTree,
    pub sessions: Sessions,
}

impl Services {
    /// # Errors
    ///
    /// Fails if the token configuration names a non-HMAC algorithm
    pub fn new(store: SharedStore, hashing: HashingConfig, tokens: TokenConfig) -> Result<Self> {
        let tokens = TokenService::new(tokens)?;
        let credentials = CredentialStore::new(store.clone(), hashing);
        let directory = UserDirectory::new(store.clone());

        Ok(Self {
            sessions: Sessions::new(credentials.clone(), directory.clone(), tokens),
            projects: ProjectTree::new(store),
            credentials,
            directory,
        })
    }
}

/// Commits on success, rolls back on failure
///
/// `on_commit` classifies a failed commit; multi-step writes report it as the
/// operation's [`Error::Transaction`].
pub(crate) async fn finish<T, F>(
    tx: Box<dyn Transaction>,
    outcome: Result<T>,
    on_commit: F,
) -> Result<T>
where
    F: FnOnce(StoreError) -> Error,
{
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(on_commit)?;
            Ok(value)
        }
        Err(err) => {
            rollback_quietly(tx).await;
            Err(err)
        }
    }
}

/// Rolls back, logging instead of returning a rollback failure
pub(crate) async fn rollback_quietly(tx: Box<dyn Transaction>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Transaction rollback failed");
    }
}

/// Maps a store failure inside a multi-step write to [`Error::Transaction`]
pub(crate) fn aborted(operation: &'static str) -> impl FnOnce(StoreError) -> Error {
    move |source| {
        warn!(operation, error = %source, "Multi-step write aborted");
        Error::Transaction { operation, source }
    }
}
