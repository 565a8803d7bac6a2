//! Async Redis checkpoint saver
//!
//! [`AsyncRedisSaver`] implements the async [`CheckpointSaver`] with the same key scheme, codec
//! and skip rules as the blocking [`RedisSaver`](crate::RedisSaver). It suspends only while
//! acquiring a connection and during network round trips, so many threads can share one saver.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use langgraph_checkpoint::{CheckpointConfig, CheckpointSaver};
//! use langgraph_checkpoint_redis::AsyncRedisSaver;
//!
//! # async fn run() -> langgraph_checkpoint::Result<()> {
//! let saver = AsyncRedisSaver::from_url("redis://127.0.0.1:6379/0", Some(16))?;
//!
//! let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
//! if let Some(tuple) = saver.get_tuple(&config).await? {
//!     println!("resuming from {}", tuple.checkpoint.ts);
//! }
//!
//! let mut history = saver.list(Some(&config), None, Some(5)).await?;
//! while let Some(tuple) = history.next().await {
//!     println!("{:?}", tuple?.parent_config);
//! }
//! # Ok(())
//! # }
//! ```

use crate::commands::AsyncHashStore;
use crate::config::RedisConfig;
use crate::connection::AsyncConnectionSource;
use crate::key::{self, CheckpointKey};
use crate::record::{decode_fields, record_transport_error, transport_error, StoredRecord};
use async_trait::async_trait;
use deadpool::managed::{Manager, Pool};
use langgraph_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointError, CheckpointMetadata, CheckpointSaver,
    CheckpointStream, CheckpointTuple, JsonAndBinarySerializer, Result,
};
use tracing::{debug, info, instrument};

/// Async checkpoint saver backed by Redis hashes
pub struct AsyncRedisSaver<M = deadpool_redis::Manager>
where
    M: Manager,
{
    source: AsyncConnectionSource<M>,
    serde: JsonAndBinarySerializer,
}

impl AsyncRedisSaver<deadpool_redis::Manager> {
    /// Build a pooled saver from a single connection URL.
    ///
    /// `max_size` caps the pool; `None` keeps deadpool's default. Connections are opened on
    /// first use.
    pub fn from_url(url: &str, max_size: Option<usize>) -> Result<Self> {
        let manager = deadpool_redis::Manager::new(url)
            .map_err(|err| CheckpointError::Configuration(err.to_string()))?;
        let pool = build_pool(manager, max_size)?;

        info!(max_size, "created async redis checkpoint saver");
        Ok(Self::from_pool(pool))
    }

    /// Build a pooled saver from connection settings
    pub fn from_conn_info(config: &RedisConfig) -> Result<Self> {
        let manager = deadpool_redis::Manager::new(config.to_connection_info()?)
            .map_err(|err| CheckpointError::Configuration(err.to_string()))?;
        let pool = build_pool(manager, Some(config.pool_size as usize))?;

        info!(
            url = %config.display_url(),
            pool_size = config.pool_size,
            "created async redis checkpoint saver"
        );
        Ok(Self::from_pool(pool))
    }

    /// Open one multiplexed connection from `client` and share it across operations
    pub async fn from_client(client: &redis::Client) -> Result<Self> {
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| transport_error("connect", None, None, err))?;
        Ok(Self::from_connection(conn))
    }
}

impl<M> AsyncRedisSaver<M>
where
    M: Manager,
    M::Type: AsyncHashStore + Clone + Sync,
    M::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(source: AsyncConnectionSource<M>) -> Self {
        Self {
            source,
            serde: JsonAndBinarySerializer::new(),
        }
    }

    /// Use a caller-owned connection handle; the saver never closes it
    pub fn from_connection(conn: M::Type) -> Self {
        Self::new(AsyncConnectionSource::Connection(conn))
    }

    /// Lease one connection from `pool` per operation
    pub fn from_pool(pool: Pool<M>) -> Self {
        Self::new(AsyncConnectionSource::Pool(pool))
    }

    pub fn source(&self) -> &AsyncConnectionSource<M> {
        &self.source
    }
}

fn build_pool<M: Manager>(manager: M, max_size: Option<usize>) -> Result<Pool<M>> {
    if max_size == Some(0) {
        return Err(CheckpointError::Configuration(
            "pool max_size must be at least 1".to_string(),
        ));
    }

    let mut builder = Pool::builder(manager);
    if let Some(max_size) = max_size {
        builder = builder.max_size(max_size);
    }
    builder
        .build()
        .map_err(|err| CheckpointError::Configuration(err.to_string()))
}

/// Read and decode one record; `Ok(None)` when it is absent or incomplete
async fn read_record<C: AsyncHashStore>(
    conn: &mut C,
    serde: &JsonAndBinarySerializer,
    key: &CheckpointKey,
    operation: &'static str,
) -> Result<Option<CheckpointTuple>> {
    let fields = conn
        .read_fields(&key.to_string())
        .await
        .map_err(|err| record_transport_error(operation, key, err))?;
    decode_fields(serde, key, fields)
}

#[async_trait]
impl<M> CheckpointSaver for AsyncRedisSaver<M>
where
    M: Manager + 'static,
    M::Type: AsyncHashStore + Clone + Sync,
    M::Error: std::error::Error + Send + Sync + 'static,
{
    #[instrument(
        skip_all,
        fields(thread_id = config.thread_id.as_deref(), thread_ts = config.thread_ts.as_deref())
    )]
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config.require_thread_id()?;
        key::validate_thread_id(thread_id)?;

        let mut conn = self.source.acquire().await?;
        if let Some(thread_ts) = config.thread_ts.as_deref() {
            let key = CheckpointKey::new(thread_id, thread_ts)?;
            return read_record(&mut *conn, &self.serde, &key, "get_tuple").await;
        }

        let keys = conn
            .scan_keys(&CheckpointKey::pattern(Some(thread_id)))
            .await
            .map_err(|err| transport_error("get_tuple", Some(thread_id), None, err))?;
        for key in key::select(keys, None, None) {
            if let Some(tuple) = read_record(&mut *conn, &self.serde, &key, "get_tuple").await? {
                return Ok(Some(tuple));
            }
        }

        debug!("no complete checkpoints for thread");
        Ok(None)
    }

    #[instrument(skip_all, fields(thread_id = config.and_then(|c| c.thread_id.as_deref())))]
    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream> {
        let thread_id = config.and_then(|c| c.thread_id.as_deref());
        if let Some(thread_id) = thread_id {
            key::validate_thread_id(thread_id)?;
        }

        let keys = {
            let mut conn = self.source.acquire().await?;
            conn.scan_keys(&CheckpointKey::pattern(thread_id))
                .await
                .map_err(|err| transport_error("list", thread_id, None, err))?
        };

        let selected = key::select(keys, before.and_then(|b| b.thread_ts.as_deref()), limit);
        debug!(count = selected.len(), "listing checkpoints");

        let source = self.source.clone();
        let serde = self.serde;
        let stream = async_stream::stream! {
            for key in selected {
                let read = match source.acquire().await {
                    Ok(mut conn) => read_record(&mut *conn, &serde, &key, "list").await,
                    Err(err) => Err(err),
                };
                match read {
                    Ok(Some(tuple)) => yield Ok(tuple),
                    Ok(None) => {}
                    Err(err) => yield Err(err),
                }
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(
        skip_all,
        fields(thread_id = config.thread_id.as_deref(), thread_ts = %checkpoint.ts)
    )]
    async fn put(
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

        let mut conn = self.source.acquire().await?;
        conn.write_fields(&key.to_string(), &record.fields())
            .await
            .map_err(|err| record_transport_error("put", &key, err))?;

        debug!(parent_ts = %record.parent_ts, "stored checkpoint");
        Ok(key.to_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_url_is_configuration_error() {
        let err = AsyncRedisSaver::from_url("not-a-redis-url", None).err().unwrap();
        assert!(matches!(err, CheckpointError::Configuration(_)));
    }

    #[test]
    fn test_zero_pool_size_is_configuration_error() {
        let err = AsyncRedisSaver::from_url("redis://127.0.0.1:6379/", Some(0))
            .err()
            .unwrap();
        assert!(matches!(err, CheckpointError::Configuration(_)));
    }

    #[test]
    fn test_pool_is_built_without_connecting() {
        let saver = AsyncRedisSaver::from_conn_info(&RedisConfig::new().with_pool_size(3)).unwrap();
        match saver.source() {
            AsyncConnectionSource::Pool(pool) => {
                assert_eq!(pool.status().max_size, 3);
                assert_eq!(pool.status().size, 0);
            }
            AsyncConnectionSource::Connection(_) => panic!("expected a pooled source"),
        }
    }
}
