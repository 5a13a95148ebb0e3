//! Retention job for the diary store.
//!
//! A run purges, in order:
//! 1. Users whose social onboarding stalled past its window
//! 2. Expired temporary users, then stale flagged data of the remaining ones
//! 3. Flagged records across every dependent collection, minus protected ids
//! 4. Flagged images and their stored objects
//!
//! Everything happens inside one document-store transaction.

mod catalog;
mod error;
mod guard;
mod images;
mod owner_cleanup;
mod sweep;
mod worker;

pub use catalog::RetentionCatalog;
pub use error::{RetentionError, RetentionResult};
pub use guard::{ProtectedCategory, ProtectionRegistry};
pub use images::{object_keys, reap_images, reapable_images};
pub use owner_cleanup::{process_inactive_users, process_temp_users};
pub use sweep::{run_global_sweep, sweep_plan};
pub use worker::{JobOutcome, RetentionJob, RetentionRunResult, run_retention};
