//! Credential registration and password checks
//!
//! Password hashing runs on the blocking pool before a transaction is opened,
//! so no store lock is held while Argon2 works.

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{finish, lookup};
use crate::auth::password::{hash_password_blocking, verify_password_blocking, HashingConfig};
use crate::error::{Entity, Error, Result};
use crate::models::{Credential, CredentialSummary, NewCredential};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Validate)]
struct EmailAddress {
    #[validate(email)]
    value: String,
}

/// Checks email syntax only; deliverability is never checked
pub fn is_valid_email(email: &str) -> bool {
    EmailAddress {
        value: email.to_string(),
    }
    .validate()
    .is_ok()
}

/// Persists login credentials and validates passwords against them
#[derive(Clone)]
pub struct CredentialStore {
    store: SharedStore,
    hashing: HashingConfig,
}

impl CredentialStore {
    pub fn new(store: SharedStore, hashing: HashingConfig) -> Self {
        Self { store, hashing }
    }

    /// Registers a credential and returns its id
    ///
    /// # Errors
    ///
    /// - `Validation` if the email is not syntactically valid
    /// - `Conflict` if the username or email is already registered
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Uuid> {
        if !is_valid_email(email) {
            return Err(Error::Validation(format!("Invalid email address: {}", email)));
        }

        let password_hash = hash_password_blocking(password.to_string(), self.hashing).await?;

        let mut tx = self.store.begin().await?;
        let outcome = async {
            if tx.find_credential_by_username(username).await?.is_some() {
                return Err(Error::Conflict(format!("Username {} is already taken", username)));
            }
            if tx.find_credential_by_email(email).await?.is_some() {
                return Err(Error::Conflict(format!("Email {} is already registered", email)));
            }

            let credential = tx
                .insert_credential(NewCredential {
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash,
                })
                .await
                .map_err(|e| Error::conflict_or_store(e, "Username or email already registered"))?;

            Ok::<_, Error>(credential.id)
        }
        .await;

        let id = finish(tx, outcome, |e: StoreError| {
            Error::conflict_or_store(e, "Username or email already registered")
        })
        .await?;

        info!(credential_id = %id, username = %username, "Credential registered");
        Ok(id)
    }

    /// Returns the credential if `password` matches its stored hash
    ///
    /// # Errors
    ///
    /// `Auth` with the same message for an unknown username and a wrong password
    pub async fn verify(&self, username: &str, password: &str) -> Result<Credential> {
        let mut tx = self.store.begin().await?;
        let found = tx.find_credential_by_username(username).await;
        finish(tx, Ok(()), Error::Store).await?;

        let Some(credential) = found? else {
            warn!(username = %username, "Login rejected: unknown username");
            return Err(Error::invalid_credentials());
        };

        let matches =
            verify_password_blocking(password.to_string(), credential.password_hash.clone()).await?;

        if !matches {
            warn!(username = %username, "Login rejected: wrong password");
            return Err(Error::invalid_credentials());
        }

        debug!(credential_id = %credential.id, "Password verified");
        Ok(credential)
    }

    /// Replaces the password after checking the current password and email
    ///
    /// # Errors
    ///
    /// `Auth` if the current password is wrong or `email` differs from the
    /// stored one; the stored hash is left untouched in both cases.
    pub async fn change_password(
        &self,
        credential_id: Uuid,
        current: &str,
        new: &str,
        email: &str,
    ) -> Result<()> {
        let credential = self.find(credential_id).await?;

        let current_ok =
            verify_password_blocking(current.to_string(), credential.password_hash.clone()).await?;

        if !current_ok || credential.email != email {
            warn!(credential_id = %credential_id, "Password change rejected");
            return Err(Error::invalid_credentials());
        }

        let password_hash = hash_password_blocking(new.to_string(), self.hashing).await?;

        let mut tx = self.store.begin().await?;
        let outcome = async {
            if !tx.update_password_hash(credential_id, &password_hash).await? {
                return Err(Error::not_found(Entity::Credential, credential_id));
            }
            Ok::<_, Error>(())
        }
        .await;
        finish(tx, outcome, Error::Store).await?;

        info!(credential_id = %credential_id, "Password changed");
        Ok(())
    }

    pub async fn find(&self, credential_id: Uuid) -> Result<Credential> {
        let mut tx = self.store.begin().await?;
        let outcome = lookup::credential(tx.as_mut(), credential_id).await;
        finish(tx, outcome, Error::Store).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Credential>> {
        let mut tx = self.store.begin().await?;
        let outcome = tx.find_credential_by_username(username).await.map_err(Error::from);
        finish(tx, outcome, Error::Store).await
    }

    /// Id and email of every credential, oldest first
    pub async fn list_summaries(&self) -> Result<Vec<CredentialSummary>> {
        let mut tx = self.store.begin().await?;
        let outcome = tx.list_credentials().await.map_err(Error::from);
        let credentials = finish(tx, outcome, Error::Store).await?;

        Ok(credentials.iter().map(CredentialSummary::from).collect())
    }
}
