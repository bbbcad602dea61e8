//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`CounterStore`], [`UserRepository`]) are implemented by
//! outbound adapters and expose typed errors. Driving ports
//! ([`StatsQuery`], [`UserDirectory`]) are implemented by domain services and
//! consumed by inbound adapters; they speak [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod counter_store;
mod stats_query;
mod user_directory;
mod user_repository;

#[cfg(test)]
pub use counter_store::MockCounterStore;
pub use counter_store::{CounterStore, CounterStoreError};
#[cfg(test)]
pub use stats_query::MockStatsQuery;
pub use stats_query::StatsQuery;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
