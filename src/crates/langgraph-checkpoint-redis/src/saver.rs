//! Blocking Redis checkpoint saver
//!
//! [`RedisSaver`] implements [`BlockingCheckpointSaver`] on top of any r2d2 connection manager
//! whose connections speak [`HashStore`]. The default manager is [`redis::Client`], so
//! `RedisSaver` on its own names the production configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use langgraph_checkpoint::{BlockingCheckpointSaver, Checkpoint, CheckpointConfig, CheckpointMetadata};
//! use langgraph_checkpoint_redis::{RedisConfig, RedisSaver};
//!
//! # fn main() -> langgraph_checkpoint::Result<()> {
//! let saver = RedisSaver::from_conn_info(&RedisConfig::from_env()?)?;
//!
//! let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
//! let stored = saver.put(&config, Checkpoint::empty(), CheckpointMetadata::new())?;
//!
//! for tuple in saver.list(Some(&config), None, Some(10))? {
//!     println!("{:?}", tuple?.config.thread_ts);
//! }
//! # let _ = stored;
//! # Ok(())
//! # }
//! ```

use crate::commands::HashStore;
use crate::config::RedisConfig;
use crate::connection::ConnectionSource;
use crate::key::{self, CheckpointKey};
use crate::record::{decode_fields, record_transport_error, transport_error, StoredRecord};
use langgraph_checkpoint::{
    BlockingCheckpointSaver, Checkpoint, CheckpointConfig, CheckpointError, CheckpointIter,
    CheckpointMetadata, CheckpointTuple, JsonAndBinarySerializer, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::vec;
use tracing::{debug, info, instrument};

/// Blocking checkpoint saver backed by Redis hashes
pub struct RedisSaver<M = redis::Client>
where
    M: r2d2::ManageConnection,
{
    source: ConnectionSource<M>,
    serde: JsonAndBinarySerializer,
}

impl RedisSaver<redis::Client> {
    /// Build a pooled saver from connection settings.
    ///
    /// The pool is created lazily: no connection is opened until the first operation, so an
    /// unreachable server surfaces as a transport error there rather than here.
    pub fn from_conn_info(config: &RedisConfig) -> Result<Self> {
        let info = config.to_connection_info()?;
        let client = redis::Client::open(info)
            .map_err(|err| CheckpointError::Configuration(err.to_string()))?;

        let pool = r2d2::Pool::builder()
            .max_size(config.pool_size)
            .build_unchecked(client);

        info!(
            url = %config.display_url(),
            pool_size = config.pool_size,
            "created blocking redis checkpoint saver"
        );
        Ok(Self::from_pool(pool))
    }
}

impl<M> RedisSaver<M>
where
    M: r2d2::ManageConnection,
    M::Connection: HashStore,
{
    pub fn new(source: ConnectionSource<M>) -> Self {
        Self {
            source,
            serde: JsonAndBinarySerializer::new(),
        }
    }

    /// Use a caller-owned connection; the saver never closes it
    pub fn from_connection(conn: M::Connection) -> Self {
        Self::new(ConnectionSource::shared(conn))
    }

    /// Share a connection the caller keeps using alongside the saver
    pub fn from_shared(conn: Arc<Mutex<M::Connection>>) -> Self {
        Self::new(ConnectionSource::Connection(conn))
    }

    /// Lease one connection from `pool` per operation
    pub fn from_pool(pool: r2d2::Pool<M>) -> Self {
        Self::new(ConnectionSource::Pool(pool))
    }

    pub fn source(&self) -> &ConnectionSource<M> {
        &self.source
    }
}

/// Read and decode one record; `Ok(None)` when it is absent or incomplete
fn read_record<C: HashStore>(
    conn: &mut C,
    serde: &JsonAndBinarySerializer,
    key: &CheckpointKey,
    operation: &'static str,
) -> Result<Option<CheckpointTuple>> {
    let fields = conn
        .read_fields(&key.to_string())
        .map_err(|err| record_transport_error(operation, key, err))?;
    decode_fields(serde, key, fields)
}

impl<M> BlockingCheckpointSaver for RedisSaver<M>
where
    M: r2d2::ManageConnection,
    M::Connection: HashStore,
{
    #[instrument(
        skip_all,
        fields(thread_id = config.thread_id.as_deref(), thread_ts = config.thread_ts.as_deref())
    )]
    fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config.require_thread_id()?;
        key::validate_thread_id(thread_id)?;

        self.source.with_connection(|conn| {
            if let Some(thread_ts) = config.thread_ts.as_deref() {
                let key = CheckpointKey::new(thread_id, thread_ts)?;
                return read_record(conn, &self.serde, &key, "get_tuple");
            }

            let keys = conn
                .scan_keys(&CheckpointKey::pattern(Some(thread_id)))
                .map_err(|err| transport_error("get_tuple", Some(thread_id), None, err))?;
            for key in key::select(keys, None, None) {
                if let Some(tuple) = read_record(conn, &self.serde, &key, "get_tuple")? {
                    return Ok(Some(tuple));
                }
            }

            debug!("no complete checkpoints for thread");
            Ok(None)
        })
    }

    #[instrument(skip_all, fields(thread_id = config.and_then(|c| c.thread_id.as_deref())))]
    fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointIter> {
        let thread_id = config.and_then(|c| c.thread_id.as_deref());
        if let Some(thread_id) = thread_id {
            key::validate_thread_id(thread_id)?;
        }

        let keys = self.source.with_connection(|conn| {
            conn.scan_keys(&CheckpointKey::pattern(thread_id))
                .map_err(|err| transport_error("list", thread_id, None, err))
        })?;

        let selected = key::select(keys, before.and_then(|b| b.thread_ts.as_deref()), limit);
        debug!(count = selected.len(), "listing checkpoints");

        Ok(Box::new(CheckpointRecords {
            source: self.source.clone(),
            serde: self.serde,
            keys: selected.into_iter(),
        }))
    }

    #[instrument(
        skip_all,
        fields(thread_id = config.thread_id.as_deref(), thread_ts = %checkpoint.ts)
    )]
    fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig> {
        let key = CheckpointKey::new(config.require_thread_id()?, &checkpoint.ts)?;
        let record = StoredRecord::encode(
            &self.serde,
            &key,
            &checkpoint,
            &metadata,
            config.thread_ts.as_deref(),
        )?;

        self.source.with_connection(|conn| {
            conn.write_fields(&key.to_string(), &record.fields())
                .map_err(|err| record_transport_error("put", &key, err))
        })?;

        debug!(parent_ts = %record.parent_ts, "stored checkpoint");
        Ok(key.to_config())
    }
}

/// Lazily decoded listing; each record is read on demand with its own connection lease
pub struct CheckpointRecords<M: r2d2::ManageConnection> {
    source: ConnectionSource<M>,
    serde: JsonAndBinarySerializer,
    keys: vec::IntoIter<CheckpointKey>,
}

impl<M> Iterator for CheckpointRecords<M>
where
    M: r2d2::ManageConnection,
    M::Connection: HashStore,
{
    type Item = Result<CheckpointTuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.keys.next()?;
            let read = self
                .source
                .with_connection(|conn| read_record(conn, &self.serde, &key, "list"));

            match read {
                Ok(Some(tuple)) => return Some(Ok(tuple)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_settings_are_configuration_errors() {
        let err = RedisSaver::from_conn_info(&RedisConfig::new().with_pool_size(0))
            .err()
            .unwrap();
        assert!(matches!(err, CheckpointError::Configuration(_)));

        let err = RedisSaver::from_conn_info(&RedisConfig::new().with_host(" ".to_string()))
            .err()
            .unwrap();
        assert!(matches!(err, CheckpointError::Configuration(_)));
    }
}
