//! In-process field-group store for tests and local development
//!
//! [`MemoryStore`] keeps hashes in a `BTreeMap` behind a lock and answers the same three
//! primitives a Redis connection does ([`HashStore`] / [`AsyncHashStore`]), so both savers
//! run unchanged on top of it. [`MemoryManager`] plugs it into `r2d2` and `deadpool` pools.
//!
//! Extra controls that a real server does not offer:
//!
//! - [`MemoryStore::set_unavailable`] - make every request fail with an I/O error
//! - [`MemoryStore::insert_fields`] - write raw fields, e.g. a half-written record
//! - [`MemoryStore::connections_opened`] - count connections created by pool managers
//!
//! Key patterns support `*`, `?` and backslash escapes.

use crate::commands::{AsyncHashStore, HashStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use redis::{ErrorKind, RedisError, RedisResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type Hashes = BTreeMap<String, HashMap<String, String>>;

#[derive(Debug, Default)]
struct Inner {
    hashes: RwLock<Hashes>,
    unavailable: AtomicBool,
    connections_opened: AtomicUsize,
}

/// Shared in-memory hash store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection handle onto this store
    pub fn connect(&self) -> MemoryConnection {
        MemoryConnection {
            store: self.clone(),
        }
    }

    /// Pool manager handing out connections onto this store
    pub fn manager(&self) -> MemoryManager {
        MemoryManager {
            store: self.clone(),
        }
    }

    /// Make every subsequent request fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Write raw fields under `key`, bypassing any saver
    pub fn insert_fields(&self, key: &str, fields: &[(&str, &str)]) {
        let mut hashes = self.inner.hashes.write();
        let hash = hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.to_string());
        }
    }

    /// Raw fields stored under `key`
    pub fn fields(&self, key: &str) -> Option<HashMap<String, String>> {
        self.inner.hashes.read().get(key).cloned()
    }

    /// All stored keys in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        self.inner.hashes.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of connections created through [`MemoryManager`]
    pub fn connections_opened(&self) -> usize {
        self.inner.connections_opened.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> RedisResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(RedisError::from((
                ErrorKind::IoError,
                "memory store unavailable",
            )))
        } else {
            Ok(())
        }
    }
}

/// Connection onto a [`MemoryStore`]; clones share the same store
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    store: MemoryStore,
}

impl MemoryConnection {
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl HashStore for MemoryConnection {
    fn write_fields(&mut self, key: &str, fields: &[(&str, &str)]) -> RedisResult<()> {
        self.store.check_available()?;
        self.store.insert_fields(key, fields);
        Ok(())
    }

    fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>> {
        self.store.check_available()?;
        Ok(self.store.fields(key).unwrap_or_default())
    }

    fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>> {
        self.store.check_available()?;
        Ok(self
            .store
            .inner
            .hashes
            .read()
            .keys()
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AsyncHashStore for MemoryConnection {
    async fn write_fields(&mut self, key: &str, fields: &[(&str, &str)]) -> RedisResult<()> {
        HashStore::write_fields(self, key, fields)
    }

    async fn read_fields(&mut self, key: &str) -> RedisResult<HashMap<String, String>> {
        HashStore::read_fields(self, key)
    }

    async fn scan_keys(&mut self, pattern: &str) -> RedisResult<Vec<String>> {
        HashStore::scan_keys(self, pattern)
    }
}

/// Pool manager for [`MemoryConnection`]s, usable with both `r2d2` and `deadpool`
#[derive(Debug, Clone)]
pub struct MemoryManager {
    store: MemoryStore,
}

impl MemoryManager {
    fn open(&self) -> RedisResult<MemoryConnection> {
        self.store.check_available()?;
        self.store
            .inner
            .connections_opened
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.store.connect())
    }
}

impl r2d2::ManageConnection for MemoryManager {
    type Connection = MemoryConnection;
    type Error = RedisError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.open()
    }

    // Open connections stay valid while the store is unavailable; only requests fail.
    fn is_valid(&self, _conn: &mut Self::Connection) -> Result<(), Self::Error> {
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

impl deadpool::managed::Manager for MemoryManager {
    type Type = MemoryConnection;
    type Error = RedisError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.open()
    }

    async fn recycle(
        &self,
        _conn: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// Redis-style glob match supporting `*`, `?` and `\` escapes
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some(b'?') => {
                p += 1;
                t += 1;
                continue;
            }
            Some(b'\\') if pattern.get(p + 1) == Some(&text[t]) => {
                p += 2;
                t += 1;
                continue;
            }
            Some(&c) if c != b'\\' && c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p + 1;
                t = star_t + 1;
                backtrack = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match(b"checkpoint:t:*", b"checkpoint:t:2024-01-01T00:00:00Z"));
        assert!(!glob_match(b"checkpoint:t:*", b"checkpoint:tt:1"));
        assert!(glob_match(b"checkpoint:*:*", b"checkpoint:a:b:c"));
        assert!(!glob_match(b"checkpoint:*:*", b"writes:a:b"));
        assert!(glob_match(b"checkpoint:a\\*b:*", b"checkpoint:a*b:1"));
        assert!(!glob_match(b"checkpoint:a\\*b:*", b"checkpoint:axxb:1"));
        assert!(glob_match(b"?x", b"ax"));
    }

    #[test]
    fn test_write_merges_fields() {
        let store = MemoryStore::new();
        let mut conn = store.connect();

        HashStore::write_fields(&mut conn, "k", &[("a", "1")]).unwrap();
        HashStore::write_fields(&mut conn, "k", &[("b", "2")]).unwrap();

        let fields = HashStore::read_fields(&mut conn, "k").unwrap();
        assert_eq!(fields.len(), 2);
        assert!(HashStore::read_fields(&mut conn, "missing").unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_store_fails_requests() {
        let store = MemoryStore::new();
        let mut conn = store.connect();
        store.set_unavailable(true);

        let err = HashStore::scan_keys(&mut conn, "*").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
    }
}
