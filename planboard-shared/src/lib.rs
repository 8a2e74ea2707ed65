//! # Planboard Shared Library
//!
//! Core of the Planboard project-management backend: records, the storage
//! seam, authentication primitives and the services that enforce the
//! project hierarchy. The HTTP server in `planboard-api` is a thin layer over
//! [`services::Services`].
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens, axum middleware
//! - `db`: PostgreSQL pool and migrations
//! - `error`: service error taxonomy
//! - `models`: database records and their queries
//! - `services`: credentials, user directory, project tree, sessions
//! - `store`: transactional storage trait with PostgreSQL and in-memory backends

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{Entity, Error, ErrorKind, Result};
pub use services::Services;

/// Current version of the Planboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
