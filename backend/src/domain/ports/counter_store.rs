//! Port abstraction for the key/value store holding counters.
use async_trait::async_trait;

use crate::domain::CounterKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by counter store adapters.
    pub enum CounterStoreError {
        /// The store could not be reached or the command timed out.
        Unavailable { message: String } => "counter store unavailable: {message}",
        /// The store answered with an error or an unexpected reply.
        Command { message: String } => "counter store command failed: {message}",
    }
}

/// Atomic counters held outside the process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add exactly one to `key` and return the new value.
    ///
    /// A missing key counts as zero, so the first call for a key returns 1.
    /// Concurrent callers each observe a distinct value.
    async fn increment_and_get(&self, key: &CounterKey) -> Result<u64, CounterStoreError>;

    /// Check that the store answers.
    async fn ping(&self) -> Result<(), CounterStoreError>;
}
