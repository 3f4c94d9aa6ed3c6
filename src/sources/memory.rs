//! In-memory source for `mem://<key>` locators

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ContentConsumer, ContentSource, SourceError};

const MEMORY_SCHEME: &str = "mem://";

/// Build the locator for a key stored in a [`MemorySource`]
pub fn memory_locator(key: &str) -> String {
    format!("{MEMORY_SCHEME}{key}")
}

/// Pages held in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.pages.write().insert(key.into(), data.into());
    }

    pub fn remove(&self, key: &str) -> Option<Bytes> {
        self.pages.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn can_handle(&self, identifier: &str) -> bool {
        identifier.starts_with(MEMORY_SCHEME)
    }

    async fn handle(
        &self,
        identifier: &str,
        consumer: &mut dyn ContentConsumer,
    ) -> Result<(), SourceError> {
        let key = identifier.strip_prefix(MEMORY_SCHEME).unwrap_or(identifier);
        let data = self.pages.read().get(key).cloned();
        let data = data.ok_or_else(|| SourceError::NotFound(identifier.to_string()))?;

        consumer
            .consume(Box::pin(std::io::Cursor::new(data)))
            .await
            .map_err(|e| SourceError::Consumer(e.to_string()))
    }
}
