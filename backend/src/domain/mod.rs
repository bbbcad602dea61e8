//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed entities used by the API and the
//! persistence layers, the services behind each endpoint, and the ports the
//! outbound adapters implement. Nothing here knows about HTTP, Redis or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failures.
//! - User and its value types: the registered user entity.
//! - CounterKey: names a counter in the key/value store.
//! - StatsService / UserDirectoryService: driving port implementations.
//! - LoadGenerator / LoadJobs: synthetic CPU load.

pub mod counter;
pub mod error;
pub mod load;
pub mod ports;
pub mod stats;
pub mod trace_id;
pub mod user;
pub mod users;

pub use self::counter::{CounterKey, VISITS_KEY};
pub use self::error::{Error, ErrorCode};
pub use self::load::{
    CancelFlag, LoadGenerator, LoadJobId, LoadJobState, LoadJobStatus, LoadJobs, LoadLimits,
    LoadReport, LoadRequest, LoadValidationError,
};
pub use self::stats::{
    DependencyStatus, Greeting, HealthReport, HealthStatus, Stats, StatsService, start_of_day,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, NewUser, User, UserId, UserName, UserValidationError};
pub use self::users::{DUPLICATE_EMAIL_CODE, UserDirectoryService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use stats_api::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
