//! Backends module - Command implementations
//!
//! Includes:
//! - Sequence discovery (directory scan, manifest files)
//! - Reading a sequence through the read-ahead cache

pub mod read;
pub mod scan;
