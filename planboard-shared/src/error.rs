//! Error taxonomy for the core services
//!
//! Every service operation returns [`Result<T>`]. Each [`Error`] carries a
//! stable [`ErrorKind`] classification that outer layers (the HTTP API) map to
//! their own status codes without inspecting messages.
//!
//! # Classification
//!
//! | Variant        | Kind         | Meaning                                      |
//! |----------------|--------------|----------------------------------------------|
//! | `Validation`   | `Validation` | Malformed input (e.g. bad email syntax)      |
//! | `Conflict`     | `Conflict`   | Uniqueness or link violation                 |
//! | `NotFound`     | `NotFound`   | Referenced entity absent                     |
//! | `Auth`         | `Auth`       | Bad credentials, invalid or expired token    |
//! | `Transaction`  | `Server`     | Multi-step write failed and was rolled back  |
//! | `Store`        | `Server`     | Storage failure outside a multi-step write   |
//! | `Password`     | `Server`     | Hashing machinery failure                    |
//! | `Token`        | `Server`     | Token signing failure                        |

use std::fmt;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::store::StoreError;

/// Result alias used by every service operation
pub type Result<T> = std::result::Result<T, Error>;

/// Uniform message for failed logins, so unknown usernames are indistinguishable
/// from wrong passwords.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Uniform message for rejected tokens
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Entities of the data model, used to label lookups that came up empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Credential,
    User,
    Project,
    Stage,
    Task,
    Comment,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Credential => "credential",
            Entity::User => "user",
            Entity::Project => "project",
            Entity::Stage => "stage",
            Entity::Task => "task",
            Entity::Comment => "comment",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Auth,
    Server,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Auth => "unauthorized",
            ErrorKind::Server => "internal_error",
        }
    }
}

/// Error type for core service operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input failed a syntax or shape check
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint or link rule was violated
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity does not exist
    #[error("{entity} {key} not found")]
    NotFound { entity: Entity, key: String },

    /// Credentials or token rejected
    #[error("{0}")]
    Auth(String),

    /// A multi-step write failed; every step was rolled back
    #[error("{operation} failed and was rolled back: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Storage failure outside a multi-step write
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),

    /// Password hashing machinery failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token signing failed
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl Error {
    pub fn not_found(entity: Entity, key: impl fmt::Display) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Error::Auth(INVALID_CREDENTIALS.to_string())
    }

    pub fn invalid_token() -> Self {
        Error::Auth(INVALID_TOKEN.to_string())
    }

    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Transaction { .. } | Error::Store(_) | Error::Password(_) | Error::Token(_) => {
                ErrorKind::Server
            }
        }
    }

    /// Maps a unique or foreign-key violation to `Conflict`, anything else to `Store`
    pub(crate) fn conflict_or_store(err: StoreError, message: &str) -> Self {
        match err {
            StoreError::UniqueViolation(_) | StoreError::ForeignKeyViolation(_) => {
                Error::Conflict(message.to_string())
            }
            other => Error::Store(other),
        }
    }
}
