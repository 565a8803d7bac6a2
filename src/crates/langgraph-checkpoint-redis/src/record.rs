//! Stored form of one checkpoint version
//!
//! ```text
//! HSET checkpoint:{thread_id}:{ts}
//!      checkpoint  <codec text of Checkpoint>
//!      metadata    <codec text of CheckpointMetadata>
//!      parent_ts   <ts of the previous version, or "">
//! ```
//!
//! Encoding and decoding live here so the blocking and async savers share them byte for byte.

use crate::key::CheckpointKey;
use langgraph_checkpoint::{
    Checkpoint, CheckpointError, CheckpointMetadata, CheckpointTuple, JsonAndBinarySerializer,
    Result, SerializerProtocol,
};
use std::collections::HashMap;
use tracing::{error, warn};

pub const FIELD_CHECKPOINT: &str = "checkpoint";
pub const FIELD_METADATA: &str = "metadata";
pub const FIELD_PARENT_TS: &str = "parent_ts";

/// The three text fields of a checkpoint hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub checkpoint: String,
    pub metadata: String,
    pub parent_ts: String,
}

impl StoredRecord {
    /// Encode a checkpoint and its metadata for `key`
    pub fn encode(
        serde: &JsonAndBinarySerializer,
        key: &CheckpointKey,
        checkpoint: &Checkpoint,
        metadata: &CheckpointMetadata,
        parent_ts: Option<&str>,
    ) -> Result<Self> {
        let encoded = serde
            .dumps(checkpoint)
            .and_then(|checkpoint| Ok((checkpoint, serde.dumps(metadata)?)));

        match encoded {
            Ok((checkpoint, metadata)) => Ok(Self {
                checkpoint,
                metadata,
                parent_ts: parent_ts.unwrap_or_default().to_string(),
            }),
            Err(err) => {
                error!(
                    thread_id = %key.thread_id,
                    thread_ts = %key.thread_ts,
                    error = %err,
                    "failed to encode checkpoint"
                );
                Err(err)
            }
        }
    }

    /// Field/value pairs for a single multi-field write
    pub fn fields(&self) -> [(&str, &str); 3] {
        [
            (FIELD_CHECKPOINT, self.checkpoint.as_str()),
            (FIELD_METADATA, self.metadata.as_str()),
            (FIELD_PARENT_TS, self.parent_ts.as_str()),
        ]
    }

    /// Rebuild from raw hash fields; `None` unless both payload fields are present
    pub fn from_fields(mut fields: HashMap<String, String>) -> Option<Self> {
        let checkpoint = fields.remove(FIELD_CHECKPOINT)?;
        let metadata = fields.remove(FIELD_METADATA)?;
        let parent_ts = fields.remove(FIELD_PARENT_TS).unwrap_or_default();

        Some(Self {
            checkpoint,
            metadata,
            parent_ts,
        })
    }

    /// Decode into the read-side view
    pub fn into_tuple(
        self,
        serde: &JsonAndBinarySerializer,
        key: &CheckpointKey,
    ) -> Result<CheckpointTuple> {
        let decoded = serde
            .loads::<Checkpoint>(&self.checkpoint)
            .and_then(|checkpoint| {
                let metadata = serde.loads::<CheckpointMetadata>(&self.metadata)?;
                Ok((checkpoint, metadata))
            });

        let (checkpoint, metadata) = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                error!(
                    thread_id = %key.thread_id,
                    thread_ts = %key.thread_ts,
                    error = %err,
                    "failed to decode stored checkpoint"
                );
                return Err(err);
            }
        };

        let tuple = CheckpointTuple::new(key.to_config(), checkpoint, metadata);
        if self.parent_ts.is_empty() {
            Ok(tuple)
        } else {
            let parent = CheckpointKey {
                thread_id: key.thread_id.clone(),
                thread_ts: self.parent_ts,
            };
            Ok(tuple.with_parent_config(parent.to_config()))
        }
    }
}

/// Turn the fields read for `key` into a tuple.
///
/// An empty hash means the key does not exist. A hash lacking either payload field is treated
/// as a write that has not finished and is skipped with a warning.
pub fn decode_fields(
    serde: &JsonAndBinarySerializer,
    key: &CheckpointKey,
    fields: HashMap<String, String>,
) -> Result<Option<CheckpointTuple>> {
    if fields.is_empty() {
        return Ok(None);
    }

    match StoredRecord::from_fields(fields) {
        Some(record) => record.into_tuple(serde, key).map(Some),
        None => {
            warn!(
                thread_id = %key.thread_id,
                thread_ts = %key.thread_ts,
                "skipping incomplete checkpoint record"
            );
            Ok(None)
        }
    }
}

/// Log a failed store request with its identity context and keep the client error intact
pub fn transport_error(
    operation: &'static str,
    thread_id: Option<&str>,
    thread_ts: Option<&str>,
    err: redis::RedisError,
) -> CheckpointError {
    error!(
        operation,
        thread_id,
        thread_ts,
        error = %err,
        "checkpoint store request failed"
    );
    CheckpointError::transport(err)
}

/// [`transport_error`] for a request addressed to one record
pub fn record_transport_error(
    operation: &'static str,
    key: &CheckpointKey,
    err: redis::RedisError,
) -> CheckpointError {
    transport_error(
        operation,
        Some(key.thread_id.as_str()),
        Some(key.thread_ts.as_str()),
        err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use langgraph_checkpoint::CheckpointSource;
    use serde_json::json;

    fn key() -> CheckpointKey {
        CheckpointKey::new("t", "2024-01-01T00:00:00.000002Z").unwrap()
    }

    #[test]
    fn test_record_fields_follow_wire_contract() {
        let serde = JsonAndBinarySerializer::new();
        let checkpoint = Checkpoint::empty().with_ts(key().thread_ts);
        let metadata = CheckpointMetadata::new().with_source(CheckpointSource::Input);

        let record = StoredRecord::encode(&serde, &key(), &checkpoint, &metadata, None).unwrap();
        let fields = record.fields();

        assert_eq!(fields[0].0, "checkpoint");
        assert_eq!(fields[1], ("metadata", "{\"source\":\"input\"}"));
        assert_eq!(fields[2], ("parent_ts", ""));
    }

    #[test]
    fn test_decode_builds_parent_config() {
        let serde = JsonAndBinarySerializer::new();
        let checkpoint = Checkpoint::empty()
            .with_ts(key().thread_ts)
            .with_channel_value("v".to_string(), json!(1));
        let record = StoredRecord::encode(
            &serde,
            &key(),
            &checkpoint,
            &CheckpointMetadata::new(),
            Some("2024-01-01T00:00:00.000001Z"),
        )
        .unwrap();

        let tuple = record.into_tuple(&serde, &key()).unwrap();
        assert_eq!(tuple.checkpoint, checkpoint);
        assert_eq!(tuple.config.thread_ts.as_deref(), Some("2024-01-01T00:00:00.000002Z"));
        assert_eq!(tuple.parent_ts(), Some("2024-01-01T00:00:00.000001Z"));
        assert!(tuple.parent_ts().unwrap() < tuple.config.thread_ts.as_deref().unwrap());
    }

    #[test]
    fn test_incomplete_fields_are_skipped() {
        let serde = JsonAndBinarySerializer::new();
        let mut fields = HashMap::new();
        fields.insert(FIELD_CHECKPOINT.to_string(), "{}".to_string());

        assert!(decode_fields(&serde, &key(), fields).unwrap().is_none());
        assert!(decode_fields(&serde, &key(), HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_payload_is_serialization_error() {
        let serde = JsonAndBinarySerializer::new();
        let mut fields = HashMap::new();
        fields.insert(FIELD_CHECKPOINT.to_string(), "{not json".to_string());
        fields.insert(FIELD_METADATA.to_string(), "{}".to_string());

        let err = decode_fields(&serde, &key(), fields).unwrap_err();
        assert!(err.is_serialization());
    }
}
