//! Content sources - Turn identifiers into byte streams
//!
//! Provides:
//! - The resolver contract the cache fetches through (`ContentResolver`)
//! - Pluggable per-scheme sources (`ContentSource`)
//! - `SourceManager`, which dispatches an identifier to the first source that accepts it

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::debug;

pub mod file;
pub mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

/// A readable byte stream positioned at the start of the content.
pub type ByteStream<'a> = Pin<Box<dyn AsyncRead + Send + 'a>>;

/// Errors raised while resolving content.
#[derive(Error, Debug)]
pub enum SourceError {
    /// I/O error while opening or reading the content.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source accepted the identifier but has nothing stored for it.
    #[error("content not found: {0}")]
    NotFound(String),

    /// The consumer failed while reading the stream.
    #[error("consumer failed: {0}")]
    Consumer(String),
}

/// Receives the byte stream for one resolved identifier.
#[async_trait]
pub trait ContentConsumer: Send {
    /// Reads the stream. Called at most once per resolution.
    async fn consume(&mut self, stream: ByteStream<'_>) -> std::io::Result<()>;
}

/// Locates content for an identifier and hands it to a consumer.
///
/// `Ok(true)` means a handler existed and the consumer has finished reading.
/// `Ok(false)` means nothing could handle the identifier.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(
        &self,
        identifier: &str,
        consumer: &mut dyn ContentConsumer,
    ) -> Result<bool, SourceError>;
}

/// A single kind of content location (local files, in-memory pages, ...).
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this source understands the identifier
    fn can_handle(&self, identifier: &str) -> bool;

    /// Open the content and feed it to the consumer
    async fn handle(
        &self,
        identifier: &str,
        consumer: &mut dyn ContentConsumer,
    ) -> Result<(), SourceError>;
}

/// Ordered set of content sources. The first source that can handle an
/// identifier wins.
#[derive(Clone, Default)]
pub struct SourceManager {
    sources: Vec<Arc<dyn ContentSource>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the built-in file source rooted at `root`.
    pub fn with_builtins(root: impl Into<std::path::PathBuf>) -> Self {
        let mut manager = Self::new();
        manager.register(FileSource::new(root));
        manager
    }

    /// Append a source; earlier sources take precedence.
    pub fn register(&mut self, source: impl ContentSource + 'static) {
        self.sources.push(Arc::new(source));
    }

    /// Builder-style variant of [`SourceManager::register`].
    pub fn with_source(mut self, source: impl ContentSource + 'static) -> Self {
        self.register(source);
        self
    }

    /// Names of the registered sources, in dispatch order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl std::fmt::Debug for SourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceManager")
            .field("sources", &self.source_names())
            .finish()
    }
}

#[async_trait]
impl ContentResolver for SourceManager {
    async fn resolve(
        &self,
        identifier: &str,
        consumer: &mut dyn ContentConsumer,
    ) -> Result<bool, SourceError> {
        for source in &self.sources {
            if source.can_handle(identifier) {
                debug!(source = source.name(), identifier, "resolving content");
                source.handle(identifier, consumer).await?;
                return Ok(true);
            }
        }

        debug!(identifier, "no content source can handle identifier");
        Ok(false)
    }
}
