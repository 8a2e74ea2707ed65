//! Login sessions
//!
//! Sessions tie the three leaf services together: a login verifies the
//! password, resolves the user's profile and issues a token whose subject is
//! the username. Later requests present that token to [`Sessions::authenticate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CredentialStore, UserDirectory};
use crate::auth::token::{IssuedToken, TokenError, TokenService};
use crate::error::{Error, Result};
use crate::models::Credential;

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub credential_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct Sessions {
    credentials: CredentialStore,
    directory: UserDirectory,
    tokens: TokenService,
}

impl Sessions {
    pub fn new(credentials: CredentialStore, directory: UserDirectory, tokens: TokenService) -> Self {
        Self {
            credentials,
            directory,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verifies the password and issues a token with the default lifetime
    ///
    /// # Errors
    ///
    /// `Auth` if the credentials are wrong or the credential has no profile
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
        let credential = self.credentials.verify(username, password).await?;
        let user_id = self
            .directory
            .resolve_user_id_by_credential(credential.id)
            .await?;

        let issued = self.tokens.issue_default(&credential.username)?;

        info!(credential_id = %credential.id, user_id = %user_id, "Login succeeded");
        Ok(LoginSession {
            token: issued.token,
            expires_at: issued.expires_at,
            credential_id: credential.id,
            user_id,
        })
    }

    /// Returns an already-expired copy of `token`
    ///
    /// The original token is not revoked and stays valid until its own expiry.
    pub async fn logout(&self, token: &str) -> Result<IssuedToken> {
        let expired = self.tokens.invalidate(token).map_err(|e| {
            debug!(error = %e, "Logout rejected");
            Error::invalid_token()
        })?;

        info!("Session logged out");
        Ok(expired)
    }

    /// Resolves a token to the credential named by its subject
    ///
    /// # Errors
    ///
    /// `Auth` if the token does not verify or its subject no longer exists
    pub async fn authenticate(&self, token: &str) -> Result<Credential> {
        let username = self.tokens.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => debug!("Rejected expired token"),
                other => warn!(error = %other, "Rejected invalid token"),
            }
            Error::invalid_token()
        })?;

        self.credentials
            .find_by_username(&username)
            .await?
            .ok_or_else(|| {
                warn!(username = %username, "Token subject no longer exists");
                Error::invalid_token()
            })
    }

    /// Changes the password of the credential behind `user_id`
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new: &str,
        email: &str,
    ) -> Result<()> {
        let credential_id = self.directory.resolve_credential_id(user_id).await?;
        self.credentials
            .change_password(credential_id, current, new, email)
            .await
    }
}
