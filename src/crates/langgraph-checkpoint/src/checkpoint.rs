//! Core checkpoint data structures for state persistence and time-travel
//!
//! This module defines the data types exchanged between the graph execution engine and a
//! checkpoint store: **[`Checkpoint`]**, **[`CheckpointConfig`]**, **[`CheckpointMetadata`]**
//! and **[`CheckpointTuple`]**.
//!
//! # Overview
//!
//! - **State Snapshots** - [`Checkpoint`] captures channel values and versions after a step
//! - **Version Markers** - Every checkpoint carries a `ts` string that orders it within its thread
//! - **Thread Isolation** - [`CheckpointConfig::thread_id`] partitions independent histories
//! - **Parent Links** - [`CheckpointTuple::parent_config`] points at the preceding version
//! - **Serializable** - All payload types support serde
//!
//! # Version Markers
//!
//! Stores treat `ts` as an opaque string and only ever compare it lexicographically. Markers
//! produced by [`Checkpoint::new_ts`] are fixed-width RFC 3339 UTC timestamps with microsecond
//! precision, so string order and time order agree:
//!
//! ```text
//! 2024-05-01T09:30:00.000001Z  <  2024-05-01T09:30:00.000002Z  <  2024-05-01T10:00:00.000000Z
//! ```
//!
//! Callers that supply their own markers must keep that property (fixed width, zero padded).
//!
//! # Identity and History
//!
//! ```text
//! thread "session-alice"
//!
//!   ts1 ──parent──▶ (none)
//!   ts2 ──parent──▶ ts1
//!   ts3 ──parent──▶ ts2        ◀── get_tuple({thread_id}) resolves here
//! ```
//!
//! A [`CheckpointConfig`] with only `thread_id` asks for the latest checkpoint of the thread;
//! adding `thread_ts` pins a specific version. The config returned by `put` is exactly what the
//! next `put` should receive so the parent chain stays intact.
//!
//! ```rust
//! use langgraph_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSource};
//!
//! let config = CheckpointConfig::new().with_thread_id("session-alice".to_string());
//! assert!(config.thread_ts.is_none());
//!
//! let checkpoint = Checkpoint::empty().with_ts("2024-05-01T09:30:00.000001Z".to_string());
//! let metadata = CheckpointMetadata::new().with_source(CheckpointSource::Input).with_step(-1);
//!
//! assert_eq!(checkpoint.ts, "2024-05-01T09:30:00.000001Z");
//! assert_eq!(metadata.step, Some(-1));
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{CheckpointError, Result};

/// Where a checkpoint came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written for the input of a run, before any node executed
    Input,
    /// Written after a step of the execution loop
    Loop,
    /// Written for a state edit made outside the loop
    Update,
}

/// Provenance of a checkpoint, stored and loaded alongside it
///
/// Unknown keys are kept in `extra` and written back flat, so metadata produced by newer
/// writers survives a round trip through older readers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckpointMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckpointSource>,

    /// `-1` for the input checkpoint, then `0, 1, 2, ...` per loop step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<i32>,

    /// Channel writes produced by the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writes: Option<Value>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl CheckpointMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_step(mut self, step: i32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_writes(mut self, writes: Value) -> Self {
        self.writes = Some(writes);
        self
    }

    pub fn with_extra(mut self, key: String, value: Value) -> Self {
        self.extra.insert(key, value);
        self
    }
}

/// Snapshot of execution state after one step
///
/// The store never looks inside a checkpoint except for `ts`, which becomes part of its key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Format version
    pub v: i32,

    /// Unique id, independent of the version marker
    pub id: String,

    /// Version marker, ordered lexicographically within a thread
    pub ts: String,

    pub channel_values: HashMap<String, Value>,

    /// Monotonic version per channel
    #[serde(default)]
    pub channel_versions: HashMap<String, u64>,

    /// Channel versions each node had seen when it last ran
    #[serde(default)]
    pub versions_seen: HashMap<String, HashMap<String, u64>>,
}

impl Checkpoint {
    pub const CURRENT_VERSION: i32 = 1;

    /// Checkpoint holding `channel_values`, stamped with the current time
    pub fn new(channel_values: HashMap<String, Value>) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            ts: Self::new_ts(),
            channel_values,
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Fixed-width UTC version marker for the current instant
    pub fn new_ts() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn with_ts(mut self, ts: String) -> Self {
        self.ts = ts;
        self
    }

    /// Set one channel value and bump that channel's version
    pub fn with_channel_value(mut self, channel: String, value: Value) -> Self {
        *self.channel_versions.entry(channel.clone()).or_insert(0) += 1;
        self.channel_values.insert(channel, value);
        self
    }

    /// Record the channel versions `node` consumed
    pub fn with_versions_seen(mut self, node: String, seen: HashMap<String, u64>) -> Self {
        self.versions_seen.insert(node, seen);
        self
    }
}

/// Identity of a checkpoint: a thread plus an optional version marker
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CheckpointConfig {
    /// Thread ID for grouping related checkpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Version marker of a specific checkpoint; `None` means "latest"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl CheckpointConfig {
    /// Create a new checkpoint configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread ID
    pub fn with_thread_id(mut self, thread_id: String) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Set the version marker
    pub fn with_thread_ts(mut self, thread_ts: String) -> Self {
        self.thread_ts = Some(thread_ts);
        self
    }

    /// The thread ID, or [`CheckpointError::Invalid`] when it is missing
    pub fn require_thread_id(&self) -> Result<&str> {
        self.thread_id
            .as_deref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))
    }
}

/// A tuple containing a checkpoint and its associated data
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointTuple {
    /// Configuration for this checkpoint
    pub config: CheckpointConfig,

    /// The checkpoint itself
    pub checkpoint: Checkpoint,

    /// Metadata associated with the checkpoint
    pub metadata: CheckpointMetadata,

    /// Parent configuration (if any)
    pub parent_config: Option<CheckpointConfig>,
}

impl CheckpointTuple {
    /// Create a new checkpoint tuple
    pub fn new(
        config: CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Self {
        Self {
            config,
            checkpoint,
            metadata,
            parent_config: None,
        }
    }

    /// Set the parent configuration
    pub fn with_parent_config(mut self, parent_config: CheckpointConfig) -> Self {
        self.parent_config = Some(parent_config);
        self
    }

    /// Version marker of the parent, if this is not the first checkpoint of its thread
    pub fn parent_ts(&self) -> Option<&str> {
        self.parent_config
            .as_ref()
            .and_then(|parent| parent.thread_ts.as_deref())
    }
}
