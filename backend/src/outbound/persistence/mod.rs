//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel models and domain types.
//! - **Internal models**: row structs (`models.rs`) and schema definitions
//!   (`schema.rs`) never leave this module.
//! - **Async-safe pooling**: connections are managed by a lazily built `bb8`
//!   pool through `diesel-async`.
//! - **Strongly typed errors**: database failures map to
//!   [`UserPersistenceError`](crate::domain::ports::UserPersistenceError).
//!
//! # Example
//!
//! ```no_run
//! use stats_api::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/stats"));
//! let repo = DieselUserRepository::new(pool);
//! ```

mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
