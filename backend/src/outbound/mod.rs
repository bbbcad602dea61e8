//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **cache**: Redis-backed counters via `bb8-redis`
//! - **persistence**: PostgreSQL-backed users via Diesel
//! - **memory**: in-process stand-ins for both, used without configured URLs
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod memory;
pub mod persistence;
