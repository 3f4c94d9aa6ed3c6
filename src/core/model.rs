//! Unified Result Model
//!
//! Every command maps what it produced to this model before rendering output.

use serde::{Deserialize, Serialize};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Page,
    Step,
    Policy,
}

/// How the page sequence was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Scan,
    Manifest,
    Cache,
    Config,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Modification time in milliseconds since epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime_ms: Option<i64>,

    /// Content size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Content hash (XXH3 or SHA1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Time the navigation call took, in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadError {
    pub code: String,
    pub message: String,
}

impl ReadError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The kind of this result
    pub kind: Kind,

    /// Position in the page sequence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Content identifier at that position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Navigation step that produced this item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,

    /// Structured payload (window snapshot, policy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// How this result was obtained
    pub source_mode: SourceMode,

    /// Metadata
    pub meta: Meta,

    /// Errors (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReadError>,
}

impl ResultItem {
    fn blank(kind: Kind, source_mode: SourceMode) -> Self {
        Self {
            kind,
            index: None,
            identifier: None,
            step: None,
            data: None,
            source_mode,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create a page listing result
    pub fn page(index: usize, identifier: impl Into<String>, source_mode: SourceMode) -> Self {
        Self {
            index: Some(index),
            identifier: Some(identifier.into()),
            ..Self::blank(Kind::Page, source_mode)
        }
    }

    /// Create a navigation step result
    pub fn step(step: impl Into<String>, index: Option<usize>, identifier: Option<String>) -> Self {
        Self {
            index,
            identifier,
            step: Some(step.into()),
            ..Self::blank(Kind::Step, SourceMode::Cache)
        }
    }

    /// Create a policy result
    pub fn policy(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::blank(Kind::Policy, SourceMode::Config)
        }
    }

    /// Set metadata
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Set structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add an error
    pub fn with_error(mut self, error: ReadError) -> Self {
        self.errors.push(error);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
