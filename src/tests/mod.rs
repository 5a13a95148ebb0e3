//! Consolidated test modules.
//!
//! End-to-end retention runs against an in-memory SQLite document store and
//! a recording object store.

#[cfg(feature = "database-sqlite")]
mod support;
