//! User directory service implementing the [`UserDirectory`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{UserDirectory, UserPersistenceError, UserRepository};
use crate::domain::{Error, NewUser, User};

/// Code reported in error details when an e-mail address is already taken.
pub const DUPLICATE_EMAIL_CODE: &str = "duplicate_email";

fn map_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { .. } => {
            warn!(error = %error, "user store unavailable");
            Error::service_unavailable(error.to_string())
        }
        UserPersistenceError::Query { .. } => {
            warn!(error = %error, "user store query failed");
            Error::internal(error.to_string())
        }
        UserPersistenceError::DuplicateEmail { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "email", "code": DUPLICATE_EMAIL_CODE })),
    }
}

/// Lists and registers users through a [`UserRepository`].
#[derive(Clone)]
pub struct UserDirectoryService {
    repository: Arc<dyn UserRepository>,
}

impl UserDirectoryService {
    /// Create the service over a repository.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UserDirectory for UserDirectoryService {
    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.repository.list().await.map_err(map_persistence_error)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let created = self
            .repository
            .insert(&user)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %created.id(), "user created");
        Ok(created)
    }
}
