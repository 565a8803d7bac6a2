//! Checkpoint storage traits for backend implementations
//!
//! This module defines the two call surfaces a checkpoint backend offers to the graph
//! execution engine:
//!
//! - [`CheckpointSaver`] - non-blocking surface, used from async executors
//! - [`BlockingCheckpointSaver`] - blocking surface, used from synchronous code
//!
//! Both expose the same three operations with identical semantics:
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `put` | Store a new checkpoint version and return its identity |
//! | `get_tuple` | Load one version, or the latest of a thread when no version is pinned |
//! | `list` | Enumerate versions newest first, optionally before a version and limited |
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Graph execution engine                      │
//! │  • put() after each superstep                │
//! │  • get_tuple() on resume                     │
//! │  • list() for history / time travel          │
//! └──────────────────────┬───────────────────────┘
//!                        │ CheckpointSaver / BlockingCheckpointSaver
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │  Backend (e.g. langgraph-checkpoint-redis)   │
//! │  • key construction                          │
//! │  • codec (JsonAndBinarySerializer)           │
//! │  • connection / pool handling                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Contract
//!
//! - `put` never overwrites an existing version; each call writes one new record keyed by
//!   `checkpoint.ts`, with the incoming `thread_ts` recorded as the parent.
//! - `get_tuple` returns `Ok(None)` (not an error) when nothing matches. Resolving the latest
//!   version skips records that are missing required fields and falls back to the newest
//!   complete one; a pinned version that is incomplete reads as `Ok(None)`.
//! - `list` establishes its ordering eagerly but decodes records lazily, one per item.
//!   The sequence is single pass and cannot be restarted.
//! - Hard failures (transport, serialization) are returned unchanged; only records that are
//!   missing required fields are skipped by `list`.

use crate::{
    checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple},
    error::Result,
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Type alias for async stream of checkpoint tuples
pub type CheckpointStream =
    Pin<Box<dyn Stream<Item = Result<CheckpointTuple>> + Send + 'static>>;

/// Type alias for a blocking, lazily decoded sequence of checkpoint tuples
pub type CheckpointIter = Box<dyn Iterator<Item = Result<CheckpointTuple>> + Send + 'static>;

/// Non-blocking checkpoint storage backend
///
/// Implementations must be thread-safe (`Send + Sync`) so many execution threads can share one
/// saver; suspension should only happen at I/O boundaries.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Fetch only the checkpoint for the given configuration
    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>> {
        Ok(self.get_tuple(config).await?.map(|tuple| tuple.checkpoint))
    }

    /// Retrieve a checkpoint tuple.
    ///
    /// With `thread_ts` set, that exact version is read, and an incomplete record there yields
    /// `None`. Without it, the complete version with the lexicographically greatest marker in
    /// the thread is returned.
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>>;

    /// Stream checkpoints newest first.
    ///
    /// * `config` - restricts to one thread; `None` (or no `thread_id`) spans all threads
    /// * `before` - keeps only versions strictly less than `before.thread_ts`
    /// * `limit` - maximum number of versions to read
    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream>;

    /// Store a checkpoint as a new version of `config.thread_id`.
    ///
    /// Returns the identity of the stored version, which the caller passes to the next
    /// `put` so the parent chain is recorded.
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig>;
}

/// Blocking checkpoint storage backend with the same semantics as [`CheckpointSaver`]
pub trait BlockingCheckpointSaver: Send + Sync {
    /// Fetch only the checkpoint for the given configuration
    fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>> {
        Ok(self.get_tuple(config)?.map(|tuple| tuple.checkpoint))
    }

    /// Retrieve a checkpoint tuple, see [`CheckpointSaver::get_tuple`]
    fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>>;

    /// Iterate checkpoints newest first, see [`CheckpointSaver::list`]
    fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointIter>;

    /// Store a checkpoint, see [`CheckpointSaver::put`]
    fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig>;
}
