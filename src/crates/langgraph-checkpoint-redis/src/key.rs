//! Checkpoint key scheme
//!
//! Every checkpoint lives under one key, `checkpoint:{thread_id}:{thread_ts}`. Thread ids may
//! not contain `:` so that the first two separators always split namespace, thread and
//! version; the version marker itself may contain `:` (RFC 3339 timestamps do).
//!
//! Enumeration uses glob patterns: `checkpoint:{thread_id}:*` for one thread and
//! `checkpoint:*:*` across all threads. Ordering is decided here, on parsed keys, before any
//! record is read.

use langgraph_checkpoint::{CheckpointConfig, CheckpointError, Result};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Namespace segment shared by all checkpoint keys
pub const CHECKPOINT_NAMESPACE: &str = "checkpoint";

const SEPARATOR: char = ':';

/// Parsed form of a checkpoint key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    pub thread_id: String,
    pub thread_ts: String,
}

impl CheckpointKey {
    /// Build a key, rejecting identities that would not parse back unambiguously
    pub fn new(thread_id: &str, thread_ts: &str) -> Result<Self> {
        validate_thread_id(thread_id)?;
        if thread_ts.is_empty() {
            return Err(CheckpointError::Invalid(
                "checkpoint ts must not be empty".to_string(),
            ));
        }
        Ok(Self {
            thread_id: thread_id.to_string(),
            thread_ts: thread_ts.to_string(),
        })
    }

    /// Parse a stored key; `None` for keys outside the checkpoint namespace
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, SEPARATOR);
        let namespace = parts.next()?;
        let thread_id = parts.next()?;
        let thread_ts = parts.next()?;

        if namespace != CHECKPOINT_NAMESPACE || thread_id.is_empty() || thread_ts.is_empty() {
            return None;
        }

        Some(Self {
            thread_id: thread_id.to_string(),
            thread_ts: thread_ts.to_string(),
        })
    }

    /// Glob pattern matching every checkpoint of a thread, or of all threads
    pub fn pattern(thread_id: Option<&str>) -> String {
        match thread_id {
            Some(thread_id) => format!(
                "{CHECKPOINT_NAMESPACE}{SEPARATOR}{}{SEPARATOR}*",
                escape_glob(thread_id)
            ),
            None => format!("{CHECKPOINT_NAMESPACE}{SEPARATOR}*{SEPARATOR}*"),
        }
    }

    /// Identity a caller uses to address this version
    pub fn to_config(&self) -> CheckpointConfig {
        CheckpointConfig::new()
            .with_thread_id(self.thread_id.clone())
            .with_thread_ts(self.thread_ts.clone())
    }

    /// Newest first; ties between threads broken by thread id for a stable order
    fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.thread_ts
            .cmp(&a.thread_ts)
            .then_with(|| b.thread_id.cmp(&a.thread_id))
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CHECKPOINT_NAMESPACE}{SEPARATOR}{}{SEPARATOR}{}",
            self.thread_id, self.thread_ts
        )
    }
}

/// Thread ids must be non-empty and free of the key separator
pub fn validate_thread_id(thread_id: &str) -> Result<()> {
    if thread_id.is_empty() {
        return Err(CheckpointError::Invalid(
            "thread_id must not be empty".to_string(),
        ));
    }
    if thread_id.contains(SEPARATOR) {
        return Err(CheckpointError::Invalid(format!(
            "thread_id {thread_id:?} must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_all(keys: impl IntoIterator<Item = String>) -> impl Iterator<Item = CheckpointKey> {
    keys.into_iter().filter_map(|raw| {
        let parsed = CheckpointKey::parse(&raw);
        if parsed.is_none() {
            debug!(key = %raw, "ignoring key outside the checkpoint namespace");
        }
        parsed
    })
}

/// Keys to read for a listing: versions strictly before `before`, newest first, truncated
pub fn select(
    keys: impl IntoIterator<Item = String>,
    before: Option<&str>,
    limit: Option<usize>,
) -> Vec<CheckpointKey> {
    let mut selected: Vec<CheckpointKey> = parse_all(keys)
        .filter(|key| before.map_or(true, |before| key.thread_ts.as_str() < before))
        .collect();

    selected.sort_by(CheckpointKey::newest_first);
    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    selected
}
