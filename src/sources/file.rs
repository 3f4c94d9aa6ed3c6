//! Local file source
//!
//! Handles plain paths and `file://` locators. Relative paths resolve against the
//! source root.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::BufReader;

use super::{ContentConsumer, ContentSource, SourceError};
use crate::core::paths::join_normalized;

const FILE_SCHEME: &str = "file://";

#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an identifier to the path it refers to
    pub fn locate(&self, identifier: &str) -> PathBuf {
        let raw = identifier.strip_prefix(FILE_SCHEME).unwrap_or(identifier);
        if Path::new(raw).is_absolute() {
            PathBuf::from(raw)
        } else {
            join_normalized(&self.root, raw)
        }
    }
}

#[async_trait]
impl ContentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn can_handle(&self, identifier: &str) -> bool {
        identifier.starts_with(FILE_SCHEME) || !identifier.contains("://")
    }

    async fn handle(
        &self,
        identifier: &str,
        consumer: &mut dyn ContentConsumer,
    ) -> Result<(), SourceError> {
        let path = self.locate(identifier);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        consumer
            .consume(Box::pin(BufReader::new(file)))
            .await
            .map_err(|e| SourceError::Consumer(e.to_string()))
    }
}
