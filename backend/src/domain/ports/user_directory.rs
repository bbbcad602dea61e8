//! Driving port for listing and registering users.
use async_trait::async_trait;

use crate::domain::{Error, NewUser, User};

/// Domain use-case port for the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Register a user from a validated draft.
    async fn create_user(&self, user: NewUser) -> Result<User, Error>;
}
