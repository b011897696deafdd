//! Every accepted connection, classified or not.

use std::sync::Arc;

use dashmap::DashMap;

use proctor_core::types::id::ConnectionId;

use super::handle::ConnectionHandle;

/// Thread-safe pool of all open WebSocket connections.
///
/// The pool owns the strong references; the registry only holds weak ones.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_get_remove() {
        let pool = ConnectionPool::new();
        let (handle, _rx) = ConnectionHandle::channel(4, None);
        let id = handle.id;

        pool.add(handle);
        assert_eq!(pool.connection_count(), 1);
        assert!(pool.get(&id).is_some());

        assert!(pool.remove(&id).is_some());
        assert!(pool.remove(&id).is_none());
        assert_eq!(pool.connection_count(), 0);
    }
}
