//! Redis checkpoint persistence for rLangGraph
//!
//! This crate stores graph checkpoints in Redis so that long-running executions can be resumed,
//! replayed or branched after an interruption. It provides two savers with identical semantics:
//!
//! - [`RedisSaver`] - blocking, implements [`BlockingCheckpointSaver`], pooled with `r2d2`
//! - [`AsyncRedisSaver`] - tokio, implements [`CheckpointSaver`], pooled with `deadpool`
//!
//! # Storage Layout
//!
//! ```text
//! checkpoint:{thread_id}:{ts}   (hash)
//! ├── checkpoint   JSON text of Checkpoint (binary payloads hex encoded)
//! ├── metadata     JSON text of CheckpointMetadata
//! └── parent_ts    ts of the previous version in the thread, "" for the first
//! ```
//!
//! Each `put` writes one new hash with a single multi-field `HSET`; nothing is overwritten or
//! deleted. The latest version of a thread is the key whose `ts` sorts highest as a string, so
//! version markers must be fixed-width (the default RFC 3339 microsecond timestamps are).
//!
//! # Connections
//!
//! ```text
//! ┌───────────────┐   acquire()   ┌─────────────────────────────┐
//! │ RedisSaver /  │ ────────────> │ ConnectionSource            │
//! │ AsyncRedis-   │               │  ├─ Connection (caller's)   │  used in place
//! │ Saver         │ <──────────── │  └─ Pool (r2d2 / deadpool)  │  released on drop
//! └───────────────┘ scoped guard  └─────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use langgraph_checkpoint::{BlockingCheckpointSaver, Checkpoint, CheckpointConfig, CheckpointMetadata};
//! use langgraph_checkpoint_redis::{RedisConfig, RedisSaver};
//!
//! # fn main() -> langgraph_checkpoint::Result<()> {
//! let saver = RedisSaver::from_conn_info(&RedisConfig::new().with_db(2))?;
//!
//! let first = saver.put(
//!     &CheckpointConfig::new().with_thread_id("t".to_string()),
//!     Checkpoint::empty(),
//!     CheckpointMetadata::new(),
//! )?;
//! let second = saver.put(&first, Checkpoint::empty(), CheckpointMetadata::new())?;
//!
//! let latest = saver.get_tuple(&CheckpointConfig::new().with_thread_id("t".to_string()))?;
//! assert_eq!(latest.and_then(|t| t.parent_config), Some(first));
//! # let _ = second;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing Without a Server
//!
//! [`memory::MemoryStore`] implements the same hash primitives in process and provides pool
//! managers for both savers:
//!
//! ```rust
//! use langgraph_checkpoint::{BlockingCheckpointSaver, CheckpointConfig};
//! use langgraph_checkpoint_redis::memory::{MemoryManager, MemoryStore};
//! use langgraph_checkpoint_redis::RedisSaver;
//!
//! let store = MemoryStore::new();
//! let saver = RedisSaver::<MemoryManager>::from_connection(store.connect());
//! let config = CheckpointConfig::new().with_thread_id("t".to_string());
//! assert!(saver.get_tuple(&config).unwrap().is_none());
//! ```

pub mod aio;
pub mod commands;
pub mod config;
pub mod connection;
pub mod key;
pub mod memory;
pub mod record;
pub mod saver;

pub use aio::AsyncRedisSaver;
pub use commands::{AsyncHashStore, HashStore};
pub use config::RedisConfig;
pub use connection::{
    AsyncConnectionSource, AsyncScopedConnection, ConnectionSource, ScopedConnection,
};
pub use key::{CheckpointKey, CHECKPOINT_NAMESPACE};
pub use saver::{CheckpointRecords, RedisSaver};

pub use langgraph_checkpoint::{BlockingCheckpointSaver, CheckpointSaver};
