//! Reader cache - Direction-aware read-ahead over a fixed page sequence
//!
//! Navigation moves the current index, applies a [`WindowPlan`] to the
//! neighbouring entries without waiting on them, and then awaits only the
//! target entry.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::entry::{Entry, EntryStatus};
use super::error::{CacheError, Result};
use super::policy::{Direction, WindowPlan, WindowPolicy};
use crate::sources::ContentResolver;

/// Reference point for relative navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Start,
    #[default]
    Current,
    End,
}

/// Read-ahead cache over an ordered sequence of content identifiers.
///
/// Construction and navigation spawn fetch tasks and therefore must happen
/// inside a Tokio runtime.
pub struct ReaderCache {
    entries: Vec<Entry>,
    current: usize,
    policy: WindowPolicy,
    disposed: bool,
}

impl ReaderCache {
    /// Cache with the reference window policy.
    pub fn new<I, S>(identifiers: I, resolver: Arc<dyn ContentResolver>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_policy(identifiers, resolver, WindowPolicy::default())
    }

    pub fn with_policy<I, S>(
        identifiers: I,
        resolver: Arc<dyn ContentResolver>,
        policy: WindowPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<Entry> = identifiers
            .into_iter()
            .enumerate()
            .map(|(position, id)| Entry::new(position, id, Arc::clone(&resolver)))
            .collect();

        info!(entries = entries.len(), "reader cache created");

        for position in policy.warm_start_positions(entries.len()) {
            entries[position].start();
        }

        Self {
            entries,
            current: 0,
            policy,
            disposed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(Entry::identifier)
    }

    pub fn status(&self, index: usize) -> Option<EntryStatus> {
        self.entries.get(index).map(Entry::status)
    }

    /// State of every entry, by position
    pub fn statuses(&self) -> Vec<EntryStatus> {
        self.entries.iter().map(Entry::status).collect()
    }

    pub fn fetch_count(&self, index: usize) -> Option<usize> {
        self.entries.get(index).map(Entry::fetch_count)
    }

    /// Total bytes currently held by loaded entries
    pub fn resident_bytes(&self) -> usize {
        self.entries.iter().map(Entry::resident_len).sum()
    }

    pub async fn navigate_next(&mut self) -> Option<Bytes> {
        self.try_navigate_next().await.ok()
    }

    pub async fn navigate_previous(&mut self) -> Option<Bytes> {
        self.try_navigate_previous().await.ok()
    }

    /// Jump to `index`. `None` when out of range.
    pub async fn navigate_to(&mut self, index: usize) -> Option<Bytes> {
        self.try_navigate_to(index).await.ok()
    }

    pub async fn try_navigate_next(&mut self) -> Result<Bytes> {
        self.step(Direction::Forward).await
    }

    pub async fn try_navigate_previous(&mut self) -> Result<Bytes> {
        self.step(Direction::Backward).await
    }

    pub async fn try_navigate_to(&mut self, index: usize) -> Result<Bytes> {
        self.ensure_live()?;
        if index >= self.entries.len() {
            return Err(CacheError::OutOfRange {
                index: index as i64,
                len: self.entries.len(),
            });
        }

        if index == self.current {
            return self.entries[index].load().await;
        }

        // the requested page goes first, ahead of any window bookkeeping
        self.entries[index].start();

        let plan = self.policy.plan_jump(self.current, index, self.entries.len());
        debug!(from = self.current, to = index, "jump");
        self.apply(&plan);
        self.current = index;

        self.entries[index].load().await
    }

    /// Move `offset` positions from `origin` in `direction`.
    pub async fn navigate(
        &mut self,
        offset: usize,
        origin: Origin,
        direction: Direction,
    ) -> Option<Bytes> {
        self.try_navigate(offset, origin, direction).await.ok()
    }

    pub async fn try_navigate(
        &mut self,
        offset: usize,
        origin: Origin,
        direction: Direction,
    ) -> Result<Bytes> {
        self.ensure_live()?;
        let base = match origin {
            Origin::Start => 0,
            Origin::Current => self.current as i64,
            Origin::End => self.entries.len() as i64 - 1,
        };
        let target = match direction {
            Direction::Forward => base + offset as i64,
            Direction::Backward => base - offset as i64,
        };

        if target < 0 || target as usize >= self.entries.len() {
            return Err(CacheError::OutOfRange {
                index: target,
                len: self.entries.len(),
            });
        }
        self.try_navigate_to(target as usize).await
    }

    pub async fn navigate_to_start(&mut self) -> Option<Bytes> {
        self.navigate(0, Origin::Start, Direction::Forward).await
    }

    pub async fn navigate_to_end(&mut self) -> Option<Bytes> {
        self.navigate(0, Origin::End, Direction::Forward).await
    }

    /// Release every entry. Idempotent; also runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for entry in &self.entries {
            entry.dispose();
        }
        info!(entries = self.entries.len(), "reader cache disposed");
    }

    async fn step(&mut self, direction: Direction) -> Result<Bytes> {
        self.ensure_live()?;
        let len = self.entries.len();
        let target = match direction {
            Direction::Forward => self.current as i64 + 1,
            Direction::Backward => self.current as i64 - 1,
        };
        if target < 0 || target as usize >= len {
            return Err(CacheError::OutOfRange { index: target, len });
        }

        let target = target as usize;
        self.current = target;

        let plan = self.policy.plan_step(target, direction, len);
        debug!(index = target, ?direction, "step");
        self.apply(&plan);

        self.entries[target].load().await
    }

    fn apply(&self, plan: &WindowPlan) {
        for &position in &plan.start {
            self.entries[position].start();
        }
        for &position in &plan.invalidate {
            self.entries[position].invalidate();
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            Err(CacheError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for ReaderCache {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ReaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderCache")
            .field("len", &self.entries.len())
            .field("current", &self.current)
            .field("policy", &self.policy)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{memory::memory_locator, MemorySource, SourceManager};

    fn cache_of(count: usize) -> ReaderCache {
        let memory = MemorySource::new();
        let ids: Vec<String> = (0..count)
            .map(|i| {
                memory.insert(format!("p{i}"), format!("page {i}"));
                memory_locator(&format!("p{i}"))
            })
            .collect();
        ReaderCache::new(ids, Arc::new(SourceManager::new().with_source(memory)))
    }

    #[tokio::test]
    async fn test_flags_follow_current_index() {
        let mut cache = cache_of(3);
        assert!(!cache.has_previous());
        assert!(cache.has_next());

        cache.navigate_to_end().await.unwrap();
        assert_eq!(cache.current_index(), 2);
        assert!(cache.has_previous());
        assert!(!cache.has_next());
    }

    #[tokio::test]
    async fn test_relative_navigation() {
        let mut cache = cache_of(10);

        let data = cache.navigate(4, Origin::Current, Direction::Forward).await;
        assert_eq!(data.as_deref(), Some(&b"page 4"[..]));

        let data = cache.navigate(1, Origin::End, Direction::Backward).await;
        assert_eq!(data.as_deref(), Some(&b"page 8"[..]));

        let data = cache.navigate(2, Origin::Start, Direction::Forward).await;
        assert_eq!(data.as_deref(), Some(&b"page 2"[..]));

        let err = cache
            .try_navigate(3, Origin::Current, Direction::Backward)
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::OutOfRange { index: -1, len: 10 });
        assert_eq!(cache.current_index(), 2);
    }

    #[tokio::test]
    async fn test_empty_sequence() {
        let mut cache = cache_of(0);
        assert!(cache.is_empty());
        assert!(!cache.has_next());
        assert!(!cache.has_previous());
        assert!(cache.navigate_next().await.is_none());
        assert!(cache.navigate_to(0).await.is_none());
        assert!(cache.navigate_to_end().await.is_none());
    }

    #[tokio::test]
    async fn test_dispose_cascades() {
        let mut cache = cache_of(4);
        cache.navigate_next().await.unwrap();
        cache.dispose();
        cache.dispose();

        assert!(cache.is_disposed());
        assert!(cache
            .statuses()
            .iter()
            .all(|s| *s == EntryStatus::Disposed));
        assert_eq!(cache.resident_bytes(), 0);
        assert_eq!(cache.try_navigate_next().await, Err(CacheError::Disposed));
    }
}
