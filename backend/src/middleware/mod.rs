//! Request middleware.
//!
//! Trace ids and request logs, error disclosure, and response headers.

pub mod disclosure;
pub mod headers;
pub mod trace;

pub use disclosure::Disclosure;
pub use headers::{cors, security_headers};
pub use trace::Trace;
