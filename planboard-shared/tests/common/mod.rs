//! Shared fixtures for service tests

#![allow(dead_code)]

use std::sync::Arc;

use planboard_shared::auth::password::HashingConfig;
use planboard_shared::auth::token::TokenConfig;
use planboard_shared::models::ProfileFields;
use planboard_shared::store::MemoryStore;
use planboard_shared::Services;
use uuid::Uuid;

pub const SECRET: &str = "service-test-secret-at-least-32-bytes!";

/// Cheap Argon2 parameters so tests stay fast
pub fn light_hashing() -> HashingConfig {
    HashingConfig {
        memory_kib: 8192,
        iterations: 1,
        parallelism: 1,
    }
}

pub struct TestEnv {
    pub store: MemoryStore,
    pub services: Services,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let services = Services::new(
            Arc::new(store.clone()),
            light_hashing(),
            TokenConfig::new(SECRET),
        )
        .expect("services");

        Self { store, services }
    }

    /// Registers a credential with a profile and returns (credential_id, user_id)
    pub async fn user(&self, username: &str) -> (Uuid, Uuid) {
        let credential_id = self
            .services
            .credentials
            .register(username, &format!("{}@x.com", username), "pw1")
            .await
            .expect("register");

        let user_id = self
            .services
            .directory
            .create_profile(
                credential_id,
                ProfileFields {
                    display_name: username.to_string(),
                    full_name: format!("{} Example", username),
                    ..Default::default()
                },
            )
            .await
            .expect("profile");

        (credential_id, user_id)
    }
}
