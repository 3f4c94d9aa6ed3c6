//! readahead - A direction-aware read-ahead cache for paged content
//!
//! readahead provides:
//! - `ReaderCache`, which keeps a moving window of pages resident around the reading position
//! - Pluggable content sources behind the `ContentResolver` contract
//! - Sequence discovery from directories and manifests
//! - A CLI that walks a sequence and reports each navigation step

pub mod backends;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod sources;

pub use cache::{
    CacheError, Direction, Entry, EntryStatus, Origin, ReaderCache, WindowPlan, WindowPolicy,
};
pub use sources::{
    ByteStream, ContentConsumer, ContentResolver, ContentSource, FileSource, MemorySource,
    SourceError, SourceManager,
};
