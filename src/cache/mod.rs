//! Cache module - Read-ahead and invalidation for paged content
//!
//! Provides:
//! - Per-position entries with idempotent fetch (entry)
//! - The navigation-driven manager (manager)
//! - Window tunables and plans (policy)

pub mod entry;
pub mod error;
pub mod manager;
pub mod policy;

pub use entry::{Entry, EntryStatus};
pub use error::CacheError;
pub use manager::{Origin, ReaderCache};
pub use policy::{Direction, WindowPlan, WindowPolicy};
