//! Connection provider for the blocking and async savers
//!
//! A saver is configured with either a connection owned elsewhere or a pool to lease
//! connections from. Each scheduling discipline gets its own tagged source:
//!
//! | Source | Blocking ([`ConnectionSource`]) | Async ([`AsyncConnectionSource`]) |
//! |--------|---------------------------------|-----------------------------------|
//! | Shared connection | `Arc<Mutex<C>>`, locked per operation | cloned handle (multiplexed) |
//! | Pool | `r2d2::Pool` | `deadpool::managed::Pool` |
//!
//! `acquire` returns a scoped guard. Dropping a pooled guard hands the connection back to its
//! pool on every exit path, including early returns on error. A shared connection is used in
//! place and is never closed by the saver; its owner keeps it.

use langgraph_checkpoint::{CheckpointError, Result};
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::error;

/// Where the blocking saver gets its connections from
pub enum ConnectionSource<M = redis::Client>
where
    M: r2d2::ManageConnection,
{
    /// A single connection supplied by the caller
    Connection(Arc<Mutex<M::Connection>>),
    /// A pool; one connection is checked out per operation
    Pool(r2d2::Pool<M>),
}

impl<M: r2d2::ManageConnection> ConnectionSource<M> {
    /// Wrap a caller-owned connection
    pub fn shared(conn: M::Connection) -> Self {
        Self::Connection(Arc::new(Mutex::new(conn)))
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pool(_))
    }

    /// Obtain a connection for the duration of the returned guard
    pub fn acquire(&self) -> Result<ScopedConnection<'_, M>> {
        match self {
            Self::Connection(conn) => Ok(ScopedConnection::Shared(conn.lock())),
            Self::Pool(pool) => pool.get().map(ScopedConnection::Pooled).map_err(|err| {
                error!(error = %err, "failed to check out a pooled connection");
                CheckpointError::transport(err)
            }),
        }
    }

    /// Run `f` with a connection that is released when `f` returns, whatever the outcome
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut M::Connection) -> Result<T>,
    {
        let mut conn = self.acquire()?;
        f(&mut conn)
    }
}

impl<M: r2d2::ManageConnection> Clone for ConnectionSource<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Connection(conn) => Self::Connection(Arc::clone(conn)),
            Self::Pool(pool) => Self::Pool(pool.clone()),
        }
    }
}

impl<M: r2d2::ManageConnection> From<r2d2::Pool<M>> for ConnectionSource<M> {
    fn from(pool: r2d2::Pool<M>) -> Self {
        Self::Pool(pool)
    }
}

/// A connection held for one blocking operation
pub enum ScopedConnection<'a, M: r2d2::ManageConnection> {
    Shared(MutexGuard<'a, M::Connection>),
    Pooled(r2d2::PooledConnection<M>),
}

impl<M: r2d2::ManageConnection> Deref for ScopedConnection<'_, M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Shared(guard) => &**guard,
            Self::Pooled(conn) => &**conn,
        }
    }
}

impl<M: r2d2::ManageConnection> DerefMut for ScopedConnection<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Shared(guard) => &mut **guard,
            Self::Pooled(conn) => &mut **conn,
        }
    }
}

/// Where the async saver gets its connections from
pub enum AsyncConnectionSource<M = deadpool_redis::Manager>
where
    M: deadpool::managed::Manager,
{
    /// A caller-owned handle; cloned per operation, sharing the underlying connection
    Connection(M::Type),
    /// A pool; one connection is checked out per operation
    Pool(deadpool::managed::Pool<M>),
}

impl<M> AsyncConnectionSource<M>
where
    M: deadpool::managed::Manager,
    M::Type: Clone,
    M::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pool(_))
    }

    /// Obtain a connection for the duration of the returned guard
    pub async fn acquire(&self) -> Result<AsyncScopedConnection<M>> {
        match self {
            Self::Connection(conn) => Ok(AsyncScopedConnection::Shared(conn.clone())),
            Self::Pool(pool) => match pool.get().await {
                Ok(conn) => Ok(AsyncScopedConnection::Pooled(conn)),
                Err(err) => {
                    error!(error = %err, "failed to check out a pooled connection");
                    Err(CheckpointError::transport(err))
                }
            },
        }
    }
}

impl<M> Clone for AsyncConnectionSource<M>
where
    M: deadpool::managed::Manager,
    M::Type: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Connection(conn) => Self::Connection(conn.clone()),
            Self::Pool(pool) => Self::Pool(pool.clone()),
        }
    }
}

impl<M: deadpool::managed::Manager> From<deadpool::managed::Pool<M>> for AsyncConnectionSource<M> {
    fn from(pool: deadpool::managed::Pool<M>) -> Self {
        Self::Pool(pool)
    }
}

/// A connection held for one async operation
pub enum AsyncScopedConnection<M: deadpool::managed::Manager> {
    Shared(M::Type),
    Pooled(deadpool::managed::Object<M>),
}

impl<M: deadpool::managed::Manager> Deref for AsyncScopedConnection<M> {
    type Target = M::Type;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Shared(conn) => conn,
            Self::Pooled(conn) => &**conn,
        }
    }
}

impl<M: deadpool::managed::Manager> DerefMut for AsyncScopedConnection<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Shared(conn) => conn,
            Self::Pooled(conn) => &mut **conn,
        }
    }
}
