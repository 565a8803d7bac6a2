//! # langgraph-checkpoint - State Persistence for Graph Execution
//!
//! **Data model, text codec and saver traits** for persisting and restoring graph execution
//! state. Concrete backends (see `langgraph-checkpoint-redis`) implement the traits defined
//! here.
//!
//! ## Overview
//!
//! Checkpoints are **snapshots of graph execution state** captured after each superstep.
//! They enable:
//!
//! - **Time-Travel Debugging** - Inspect state at any execution point
//! - **Fault Recovery** - Resume from the latest checkpoint after an interruption
//! - **Branching Timelines** - Start a new thread from any historical checkpoint
//!
//! ## Core Concepts
//!
//! ### 1. Identity
//!
//! A [`CheckpointConfig`] names a thread and, optionally, one version marker (`thread_ts`) in
//! that thread's history. Without a marker it means "the latest checkpoint of the thread".
//!
//! ### 2. Savers
//!
//! - [`CheckpointSaver`] - async surface (`put`, `get_tuple`, `list` as a [`CheckpointStream`])
//! - [`BlockingCheckpointSaver`] - blocking surface (`list` as a [`CheckpointIter`])
//!
//! ### 3. Codec
//!
//! [`JsonAndBinarySerializer`] turns payloads into text for string-valued stores. Structured
//! values become JSON, raw bytes become lowercase hex ([`Payload`], [`HexBytes`]).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use langgraph_checkpoint::{
//!     Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver, CheckpointSource,
//! };
//! use langgraph_checkpoint_redis::AsyncRedisSaver;
//!
//! let saver = AsyncRedisSaver::from_url("redis://127.0.0.1:6379/0", None)?;
//!
//! let config = CheckpointConfig::new().with_thread_id("thread-123".to_string());
//! let metadata = CheckpointMetadata::new().with_source(CheckpointSource::Input);
//! let saved = saver.put(&config, Checkpoint::empty(), metadata).await?;
//!
//! if let Some(tuple) = saver.get_tuple(&saved).await? {
//!     println!("restored {} (parent: {:?})", tuple.checkpoint.ts, tuple.parent_ts());
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`checkpoint`] - [`Checkpoint`], [`CheckpointConfig`], [`CheckpointMetadata`], [`CheckpointTuple`]
//! - [`traits`] - [`CheckpointSaver`], [`BlockingCheckpointSaver`]
//! - [`serializer`] - [`SerializerProtocol`], [`JsonAndBinarySerializer`]
//! - [`error`] - [`CheckpointError`]

pub mod checkpoint;
pub mod error;
pub mod serializer;
pub mod traits;

// Re-export main types
pub use checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSource, CheckpointTuple,
};
pub use error::{CheckpointError, Result};
pub use serializer::{HexBytes, JsonAndBinarySerializer, Payload, SerializerProtocol};
pub use traits::{BlockingCheckpointSaver, CheckpointIter, CheckpointSaver, CheckpointStream};
