//! Shared database test infrastructure
//!
//! Tests run against an in-memory SQLite database so they stay fast and need
//! no external services.

pub mod harness;
