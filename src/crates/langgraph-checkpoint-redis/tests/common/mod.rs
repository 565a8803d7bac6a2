//! Common test utilities and setup

#![allow(dead_code)]

use langgraph_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSource};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Install a test-scoped log subscriber; `RUST_LOG=debug` shows saver events
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Identity descriptor for a thread, without a pinned version
pub fn thread(thread_id: &str) -> CheckpointConfig {
    CheckpointConfig::new().with_thread_id(thread_id.to_string())
}

/// Fixed-width version marker that sorts with `n`
pub fn ts(n: u32) -> String {
    format!("2024-05-01T12:00:00.{n:06}Z")
}

/// Checkpoint at version `ts(n)` carrying `step = n`
pub fn checkpoint(n: u32) -> Checkpoint {
    Checkpoint::empty()
        .with_ts(ts(n))
        .with_channel_value("step".to_string(), json!(n))
}

pub fn metadata(step: i32) -> CheckpointMetadata {
    CheckpointMetadata::new()
        .with_source(CheckpointSource::Loop)
        .with_step(step)
}

/// Raw key of a stored checkpoint
pub fn record_key(thread_id: &str, n: u32) -> String {
    format!("checkpoint:{thread_id}:{}", ts(n))
}
