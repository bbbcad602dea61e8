//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered users. Rows are inserted once and never updated.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name (max 100 characters).
        name -> Varchar,
        /// E-mail address, unique ignoring case (max 254 characters).
        email -> Varchar,
        /// Insert timestamp, defaulted by the database.
        created_at -> Timestamptz,
    }
}
