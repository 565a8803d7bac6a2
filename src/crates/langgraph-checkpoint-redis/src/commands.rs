//! Field-group primitives the savers need from a connection
//!
//! A checkpoint record is one hash: written with a single multi-field `HSET`, read with
//! `HGETALL`, enumerated with `KEYS`. [`HashStore`] and [`AsyncHashStore`] name exactly those
//! three operations so the savers stay independent of the concrete connection type.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisResult;
use std::collections::HashMap;

/// Blocking field-group operations
pub trait HashStore {
    /// Write all fields of `key` in one command
    fn write_fields(&mut self, key: &str, fields: &[(&str, &str)]) -> RedisResult<()>;

    /// Read every field of `key`; an absent key yields an empty map
    fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>>;

    /// Keys matching a glob pattern
    fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>>;
}

/// Non-blocking field-group operations
#[async_trait]
pub trait AsyncHashStore: Send {
    async fn write_fields(&mut self, key: &str, fields: &[(&str, &str)]) -> RedisResult<()>;

    async fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>>;

    async fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>>;
}

impl HashStore for redis::Connection {
    fn write_fields(&mut self, key: &str, fields: &[(&str, &str)]) -> RedisResult<()> {
        redis::Commands::hset_multiple(self, key, fields)
    }

    fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>> {
        redis::Commands::hgetall(self, key)
    }

    fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>> {
        redis::Commands::keys(self, pattern)
    }
}

macro_rules! impl_async_hash_store {
    ($($conn:ty),+ $(,)?) => {
        $(
            #[async_trait]
            impl AsyncHashStore for $conn {
                async fn write_fields(
                    &mut self,
                    key: &str,
                    fields: &[(&str, &str)],
                ) -> RedisResult<()> {
                    redis::AsyncCommands::hset_multiple(self, key, fields).await
                }

                async fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>> {
                    redis::AsyncCommands::hgetall(self, key).await
                }

                async fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>> {
                    redis::AsyncCommands::keys(self, pattern).await
                }
            }
        )+
    };
}

impl_async_hash_store!(MultiplexedConnection);
