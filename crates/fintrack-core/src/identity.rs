//! Credential checks

use std::sync::Arc;

use async_trait::async_trait;
use fintrack_config::UserConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A verified user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier the records API knows the user by
    pub user_id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: &str, display_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Shared handle to an identity provider
pub type IdentityRef = Arc<dyn IdentityProvider>;

/// Something that can turn credentials into an `Identity`
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify the credentials, `CoreError::Unauthorized` when they do not match
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Identity>;
}

/// Users listed under `auth.users` in the config file
#[derive(Debug, Clone, Default)]
pub struct ConfiguredIdentityProvider {
    users: Vec<UserConfig>,
}

impl ConfiguredIdentityProvider {
    pub fn new(users: Vec<UserConfig>) -> Self {
        Self { users }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl IdentityProvider for ConfiguredIdentityProvider {
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Identity> {
        let user = self
            .users
            .iter()
            .find(|u| u.username == username)
            .ok_or(CoreError::Unauthorized)?;

        if !constant_time_eq(user.password.as_bytes(), password.as_bytes()) {
            log::warn!("Rejected sign-in for user {}", username);
            return Err(CoreError::Unauthorized);
        }

        Ok(Identity::new(user.effective_user_id(), user.effective_display_name()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
