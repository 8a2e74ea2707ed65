//! Authentication primitives
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`token`]: signed session tokens (issue, verify, invalidate)
//! - [`middleware`]: axum Bearer-token middleware built on
//!   [`Sessions`](crate::services::Sessions)

pub mod middleware;
pub mod password;
pub mod token;
