//! User profiles and their link to credentials

use tracing::{debug, info};
use uuid::Uuid;

use super::{finish, lookup};
use crate::error::{Entity, Error, Result};
use crate::models::{NewProfile, ProfileFields, ProfileView, UserProfile};
use crate::store::SharedStore;

/// Maps application users to their credentials
#[derive(Clone)]
pub struct UserDirectory {
    store: SharedStore,
}

impl UserDirectory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Creates the profile for a credential and returns the new user id
    ///
    /// # Errors
    ///
    /// `Conflict` if the credential already has a profile or does not exist
    pub async fn create_profile(&self, credential_id: Uuid, fields: ProfileFields) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = tx
            .insert_profile(NewProfile {
                credential_id,
                fields,
            })
            .await
            .map_err(|e| Error::conflict_or_store(e, "Credential is missing or already linked"));

        let profile = finish(tx, outcome, Error::Store).await?;

        info!(user_id = %profile.id, credential_id = %credential_id, "Profile created");
        Ok(profile.id)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let mut tx = self.store.begin().await?;
        let outcome = lookup::user(tx.as_mut(), user_id).await;
        finish(tx, outcome, Error::Store).await
    }

    /// Profile together with its credential's username and email
    pub async fn get_profile_view(&self, user_id: Uuid) -> Result<ProfileView> {
        let mut tx = self.store.begin().await?;
        let outcome = match tx.find_profile_view(user_id).await {
            Ok(Some(view)) => Ok(view),
            Ok(None) => Err(Error::not_found(Entity::User, user_id)),
            Err(e) => Err(e.into()),
        };
        finish(tx, outcome, Error::Store).await
    }

    /// User id linked to a credential
    ///
    /// # Errors
    ///
    /// `Auth` when the credential has no profile: a login without a profile is
    /// not a usable session
    pub async fn resolve_user_id_by_credential(&self, credential_id: Uuid) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = match tx.find_profile_by_credential(credential_id).await {
            Ok(Some(profile)) => Ok(profile.id),
            Ok(None) => {
                debug!(credential_id = %credential_id, "Credential has no profile");
                Err(Error::invalid_credentials())
            }
            Err(e) => Err(e.into()),
        };
        finish(tx, outcome, Error::Store).await
    }

    pub async fn resolve_credential_id(&self, user_id: Uuid) -> Result<Uuid> {
        self.get_profile(user_id)
            .await
            .map(|profile| profile.credential_id)
    }

    pub async fn resolve_user_id_by_email(&self, email: &str) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            let credential = tx
                .find_credential_by_email(email)
                .await?
                .ok_or_else(|| Error::not_found(Entity::User, email))?;

            let profile = tx
                .find_profile_by_credential(credential.id)
                .await?
                .ok_or_else(|| Error::not_found(Entity::User, email))?;

            Ok::<_, Error>(profile.id)
        }
        .await;
        finish(tx, outcome, Error::Store).await
    }

    pub async fn ensure_exists(&self, user_id: Uuid) -> Result<()> {
        self.get_profile(user_id).await.map(|_| ())
    }
}
