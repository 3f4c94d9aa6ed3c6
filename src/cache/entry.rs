//! Cache entry - Fetch state and buffer for one position in the sequence
//!
//! An entry knows nothing about windowing. It moves through
//! `NotStarted -> Loading -> Loaded`, drops back to `NotStarted` when
//! invalidated or when a fetch fails, and ends in `Disposed`.
//!
//! Invalidating a `Loading` entry is deferred: the fetch runs to completion,
//! current waiters still receive its result, and the bytes are not kept
//! resident. A `start` that arrives before completion cancels the deferral.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::{CacheError, Result};
use crate::sources::{ByteStream, ContentConsumer, ContentResolver};

/// Observable state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    NotStarted,
    Loading,
    Loaded,
    Disposed,
}

impl EntryStatus {
    /// Loaded or on its way there
    pub fn is_warm(self) -> bool {
        matches!(self, EntryStatus::Loading | EntryStatus::Loaded)
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Pending,
    Ready(Bytes),
    Failed(CacheError),
}

enum Slot {
    Idle,
    Loading {
        done: watch::Receiver<Outcome>,
        discard: bool,
    },
    Loaded(Bytes),
    Disposed,
}

/// What a caller gets when it asks for the entry's data
enum Ticket {
    Ready(Bytes),
    Wait(watch::Receiver<Outcome>),
    Gone,
}

struct Shared {
    identifier: String,
    position: usize,
    slot: Mutex<Slot>,
    fetches: AtomicUsize,
}

pub struct Entry {
    shared: Arc<Shared>,
    resolver: Arc<dyn ContentResolver>,
}

impl Entry {
    pub fn new(
        position: usize,
        identifier: impl Into<String>,
        resolver: Arc<dyn ContentResolver>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                identifier: identifier.into(),
                position,
                slot: Mutex::new(Slot::Idle),
                fetches: AtomicUsize::new(0),
            }),
            resolver,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.shared.identifier
    }

    pub fn position(&self) -> usize {
        self.shared.position
    }

    pub fn status(&self) -> EntryStatus {
        match &*self.shared.slot.lock() {
            Slot::Idle => EntryStatus::NotStarted,
            Slot::Loading { .. } => EntryStatus::Loading,
            Slot::Loaded(_) => EntryStatus::Loaded,
            Slot::Disposed => EntryStatus::Disposed,
        }
    }

    /// Number of fetches issued for this entry so far
    pub fn fetch_count(&self) -> usize {
        self.shared.fetches.load(Ordering::Relaxed)
    }

    /// Size of the resident buffer, 0 unless loaded
    pub fn resident_len(&self) -> usize {
        match &*self.shared.slot.lock() {
            Slot::Loaded(bytes) => bytes.len(),
            _ => 0,
        }
    }

    /// Begin fetching if nothing is resident or in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let _ = self.acquire();
    }

    /// Release the resident buffer. A fetch in flight is flagged so its
    /// result is not kept once it completes.
    pub fn invalidate(&self) {
        let mut slot = self.shared.slot.lock();
        match &mut *slot {
            Slot::Loaded(_) => {
                *slot = Slot::Idle;
                debug!(position = self.shared.position, "released resident buffer");
            }
            Slot::Loading { discard, .. } if !*discard => {
                *discard = true;
                debug!(position = self.shared.position, "invalidation deferred until fetch completes");
            }
            _ => {}
        }
    }

    /// Start if needed, wait for the fetch and return a view of the data.
    pub async fn load(&self) -> Result<Bytes> {
        let mut done = match self.acquire() {
            Ticket::Ready(bytes) => return Ok(bytes),
            Ticket::Wait(done) => done,
            Ticket::Gone => return Err(CacheError::Disposed),
        };

        let outcome = done
            .wait_for(|outcome| !matches!(outcome, Outcome::Pending))
            .await
            .map(|outcome| (*outcome).clone());

        match outcome {
            Ok(Outcome::Ready(bytes)) => Ok(bytes),
            Ok(Outcome::Failed(e)) => Err(e),
            Ok(Outcome::Pending) | Err(_) => Err(CacheError::FetchFailed {
                identifier: self.shared.identifier.clone(),
                reason: "fetch task ended without a result".to_string(),
            }),
        }
    }

    /// [`Entry::load`] with failures collapsed to `None`
    pub async fn get_data(&self) -> Option<Bytes> {
        self.load().await.ok()
    }

    /// Terminal. Drops the buffer; every later call is a no-op.
    pub fn dispose(&self) {
        *self.shared.slot.lock() = Slot::Disposed;
    }

    fn acquire(&self) -> Ticket {
        let mut slot = self.shared.slot.lock();
        match &mut *slot {
            Slot::Loaded(bytes) => Ticket::Ready(bytes.clone()),
            Slot::Disposed => Ticket::Gone,
            Slot::Loading { done, discard } => {
                if *discard {
                    debug!(position = self.shared.position, "fetch in flight wanted again");
                    *discard = false;
                }
                Ticket::Wait(done.clone())
            }
            Slot::Idle => {
                let (tx, rx) = watch::channel(Outcome::Pending);
                *slot = Slot::Loading {
                    done: rx.clone(),
                    discard: false,
                };
                self.shared.fetches.fetch_add(1, Ordering::Relaxed);
                debug!(
                    position = self.shared.position,
                    identifier = %self.shared.identifier,
                    "fetch started"
                );

                let mut guard = Completion {
                    shared: Arc::clone(&self.shared),
                    done: Some(tx),
                };
                let resolver = Arc::clone(&self.resolver);
                tokio::spawn(async move {
                    let outcome = fetch(resolver.as_ref(), &guard.shared.identifier).await;
                    guard.finish(outcome);
                });

                Ticket::Wait(rx)
            }
        }
    }
}

impl Shared {
    fn complete(&self, outcome: Outcome, done: watch::Sender<Outcome>) {
        let outcome = {
            let mut slot = self.slot.lock();
            let discard = match &*slot {
                Slot::Loading { discard, .. } => Some(*discard),
                _ => None,
            };

            match discard {
                Some(discard) => {
                    *slot = match &outcome {
                        Outcome::Ready(bytes) if !discard => Slot::Loaded(bytes.clone()),
                        _ => Slot::Idle,
                    };
                    if discard {
                        debug!(position = self.position, "fetch completed after invalidation, result dropped");
                    }
                    if let Outcome::Failed(e) = &outcome {
                        warn!(position = self.position, error = %e, "fetch failed");
                    }
                    outcome
                }
                // disposed while the fetch was in flight
                None => Outcome::Failed(CacheError::Disposed),
            }
        };

        let _ = done.send(outcome);
    }
}

/// Settles the slot exactly once. If the fetch task panics or its runtime
/// drops it, the entry still returns to `NotStarted`.
struct Completion {
    shared: Arc<Shared>,
    done: Option<watch::Sender<Outcome>>,
}

impl Completion {
    fn finish(&mut self, outcome: Outcome) {
        if let Some(done) = self.done.take() {
            self.shared.complete(outcome, done);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        let outcome = Outcome::Failed(CacheError::FetchFailed {
            identifier: self.shared.identifier.clone(),
            reason: "fetch task ended without a result".to_string(),
        });
        self.finish(outcome);
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("position", &self.shared.position)
            .field("identifier", &self.shared.identifier)
            .field("status", &self.status())
            .finish()
    }
}

/// Collects a resolved stream into an owned buffer
#[derive(Default)]
struct BufferSink {
    data: Option<Bytes>,
}

#[async_trait]
impl ContentConsumer for BufferSink {
    async fn consume(&mut self, mut stream: ByteStream<'_>) -> std::io::Result<()> {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        self.data = Some(Bytes::from(buf));
        Ok(())
    }
}

async fn fetch(resolver: &dyn ContentResolver, identifier: &str) -> Outcome {
    let failed = |reason: String| {
        Outcome::Failed(CacheError::FetchFailed {
            identifier: identifier.to_string(),
            reason,
        })
    };

    let mut sink = BufferSink::default();
    match resolver.resolve(identifier, &mut sink).await {
        Ok(true) => match sink.data {
            Some(bytes) => Outcome::Ready(bytes),
            None => failed("source produced no content".to_string()),
        },
        Ok(false) => failed("no content source can handle this identifier".to_string()),
        Err(e) => failed(e.to_string()),
    }
}
