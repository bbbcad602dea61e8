//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Every operation checks a connection out of the pool and runs under the
//! pool's timeout, so a hung server surfaces as a connection error instead of
//! a stalled request.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, NewUser, User, UserId, UserName};

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn timed<T, F>(&self, operation: F) -> Result<T, UserPersistenceError>
    where
        F: Future<Output = Result<T, UserPersistenceError>> + Send,
    {
        tokio::time::timeout(self.pool.timeout(), operation)
            .await
            .map_err(|_| UserPersistenceError::connection("database operation timed out"))?
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } => UserPersistenceError::connection(message),
    }
}

/// Map Diesel errors to user persistence errors.
///
/// `duplicate_email` is reported when a unique violation is raised by the
/// insert of that address.
fn map_diesel_error(
    error: diesel::result::Error,
    duplicate_email: Option<&str>,
) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match (error, duplicate_email) {
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(email)) => {
            UserPersistenceError::duplicate_email(email)
        }
        (DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _), _)
        | (DieselError::BrokenTransactionManager, _) => {
            UserPersistenceError::connection("database connection error")
        }
        (DieselError::NotFound, _) => UserPersistenceError::query("record not found"),
        (DieselError::QueryBuilderError(_), _) => {
            UserPersistenceError::query("database query error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

fn to_count(value: i64) -> Result<u64, UserPersistenceError> {
    u64::try_from(value).map_err(|_| UserPersistenceError::query("negative row count"))
}

/// Convert a database row to a domain user, rejecting rows that violate the
/// user invariants.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let UserRow {
        id,
        name,
        email,
        created_at,
    } = row;
    let name = UserName::new(name)
        .map_err(|err| UserPersistenceError::query(format!("stored user {id}: {err}")))?;
    let email = EmailAddress::new(email)
        .map_err(|err| UserPersistenceError::query(format!("stored user {id}: {err}")))?;
    Ok(User::new(UserId::from_uuid(id), name, email, created_at))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn count(&self) -> Result<u64, UserPersistenceError> {
        self.timed(async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let total: i64 = users::table
                .count()
                .get_result(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, None))?;
            to_count(total)
        })
        .await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, UserPersistenceError> {
        self.timed(async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let total: i64 = users::table
                .filter(users::created_at.ge(since))
                .count()
                .get_result(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, None))?;
            to_count(total)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        self.timed(async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<UserRow> = users::table
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, None))?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        self.timed(async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let new_row = NewUserRow {
                id: Uuid::new_v4(),
                name: user.name().as_ref(),
                email: user.email().as_ref(),
            };
            let row: UserRow = diesel::insert_into(users::table)
                .values(&new_row)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, Some(user.email().as_ref())))?;
            row_to_user(row)
        })
        .await
    }

    async fn ping(&self) -> Result<(), UserPersistenceError> {
        self.timed(async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::sql_query("SELECT 1")
                .execute(&mut conn)
                .await
                .map(|_| ())
                .map_err(|err| map_diesel_error(err, None))
        })
        .await
    }
}
