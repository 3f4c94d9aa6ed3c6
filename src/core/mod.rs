//! Core module - Shared data structures and utilities
//!
//! This module provides:
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - Hashing and file metadata helpers

pub mod model;
pub mod paths;
pub mod render;
pub mod util;
