//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewUser, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already owns the e-mail address.
        DuplicateEmail { email: String } => "a user with email {email} already exists",
    }
}

/// Durable store of registered users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Total number of users.
    async fn count(&self) -> Result<u64, UserPersistenceError>;

    /// Number of users created at or after `since`.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, UserPersistenceError>;

    /// Every user, oldest first. Ties on `created_at` are ordered by id.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Persist a new user, assigning its id and creation time.
    ///
    /// E-mail addresses are unique ignoring case.
    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Check that the store answers.
    async fn ping(&self) -> Result<(), UserPersistenceError>;
}
