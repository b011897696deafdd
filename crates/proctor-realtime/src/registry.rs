//! The authoritative table of registered students and admins.
//!
//! Both indices live behind one async mutex so every operation observes a
//! consistent view. Critical sections never await and never perform socket
//! I/O; sends made under the lock are non-blocking queue pushes.
//!
//! The registry holds weak references: connections are owned by the
//! transport layer (see [`ConnectionPool`](crate::connection::pool::ConnectionPool)).

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use proctor_core::types::id::ConnectionId;

use crate::connection::handle::ConnectionHandle;
use crate::message::types::StudentSummary;

#[derive(Debug)]
struct StudentEntry {
    name: String,
    conn: Weak<ConnectionHandle>,
    conn_id: ConnectionId,
    seq: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    students: HashMap<String, StudentEntry>,
    admins: HashMap<ConnectionId, Weak<ConnectionHandle>>,
    next_seq: u64,
}

impl RegistryState {
    /// Every admin still owned by the transport, closed or not. Entries whose
    /// connection has been dropped are removed here; returns how many.
    fn collect_admins(&mut self) -> (Vec<Arc<ConnectionHandle>>, usize) {
        let before = self.admins.len();
        let mut admins = Vec::with_capacity(before);
        self.admins.retain(|_, weak| match weak.upgrade() {
            Some(conn) => {
                admins.push(conn);
                true
            }
            None => false,
        });
        (admins, before - self.admins.len())
    }

    fn students_in_order(&self) -> Vec<StudentSummary> {
        let mut entries: Vec<(&String, &StudentEntry)> = self
            .students
            .iter()
            .filter(|(_, entry)| {
                entry
                    .conn
                    .upgrade()
                    .is_some_and(|conn| conn.is_alive())
            })
            .collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries
            .into_iter()
            .map(|(id, entry)| StudentSummary {
                id: id.clone(),
                name: entry.name.clone(),
            })
            .collect()
    }
}

/// Admin recipients for one fan-out pass.
#[derive(Debug, Default)]
pub struct AdminSnapshot {
    /// Registered admins. Closed ones are included so the send attempt can
    /// prune them.
    pub admins: Vec<Arc<ConnectionHandle>>,
    /// Entries whose connection was already dropped, removed while taking
    /// the snapshot.
    pub expired: usize,
}

/// Result of registering a student.
#[derive(Debug)]
pub struct StudentRegistration {
    /// Connection that previously held this id, now orphaned (not closed).
    pub replaced: Option<ConnectionId>,
    /// Admins registered at that moment, for the join fan-out.
    pub admins: Vec<Arc<ConnectionHandle>>,
}

/// Registry of live students (by id) and admins (as a set).
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<RegistryState>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an admin and seeds it with the current student list.
    ///
    /// `seed` runs while the lock is held, with the snapshot taken in the
    /// same critical section, so no `student-joined` can overtake the list.
    /// It must not block. Adding the same connection twice is a no-op.
    pub async fn register_admin<F>(&self, conn: &Arc<ConnectionHandle>, seed: F)
    where
        F: FnOnce(&[StudentSummary]),
    {
        let mut state = self.inner.lock().await;
        state.admins.insert(conn.id, Arc::downgrade(conn));
        let snapshot = state.students_in_order();
        seed(&snapshot);
    }

    /// Inserts or overwrites `students[id]` (last writer wins).
    ///
    /// A different connection previously registered under `id` is not
    /// closed; it simply stops being reachable through the registry.
    pub async fn register_student(
        &self,
        id: &str,
        name: &str,
        conn: &Arc<ConnectionHandle>,
    ) -> StudentRegistration {
        let mut state = self.inner.lock().await;
        let seq = state.next_seq;
        state.next_seq += 1;

        let previous = state.students.insert(
            id.to_string(),
            StudentEntry {
                name: name.to_string(),
                conn: Arc::downgrade(conn),
                conn_id: conn.id,
                seq,
            },
        );

        StudentRegistration {
            replaced: previous
                .map(|entry| entry.conn_id)
                .filter(|prev| *prev != conn.id),
            admins: state.collect_admins().0,
        }
    }

    /// Removes `students[id]` if present. Returns whether an entry was removed.
    pub async fn remove_student(&self, id: &str) -> bool {
        self.inner.lock().await.students.remove(id).is_some()
    }

    /// Removes `students[id]` only if it still belongs to `conn_id`.
    ///
    /// Used on transport close so an orphaned connection closing late cannot
    /// evict the newer registration under the same id.
    pub async fn remove_student_if_owner(&self, id: &str, conn_id: ConnectionId) -> bool {
        let mut state = self.inner.lock().await;
        match state.students.get(id) {
            Some(entry) if entry.conn_id == conn_id => {
                state.students.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Removes an admin. Returns whether it was present.
    pub async fn remove_admin(&self, conn_id: ConnectionId) -> bool {
        self.inner.lock().await.admins.remove(&conn_id).is_some()
    }

    /// Removes every listed admin, returning how many were present.
    pub async fn prune_admins(&self, conn_ids: &[ConnectionId]) -> usize {
        let mut state = self.inner.lock().await;
        conn_ids
            .iter()
            .filter(|id| state.admins.remove(*id).is_some())
            .count()
    }

    /// `(id, name)` of every registered student, in registration order.
    pub async fn snapshot_students(&self) -> Vec<StudentSummary> {
        self.inner.lock().await.students_in_order()
    }

    /// Live connection registered under `id`.
    pub async fn lookup_student(&self, id: &str) -> Option<Arc<ConnectionHandle>> {
        let state = self.inner.lock().await;
        state
            .students
            .get(id)
            .and_then(|entry| entry.conn.upgrade())
            .filter(|conn| conn.is_alive())
    }

    /// Snapshot of admin connections for fan-out.
    pub async fn admin_snapshot(&self) -> AdminSnapshot {
        let (admins, expired) = self.inner.lock().await.collect_admins();
        AdminSnapshot { admins, expired }
    }

    /// Number of registered students.
    pub async fn student_count(&self) -> usize {
        self.inner.lock().await.students.len()
    }

    /// Number of registered admins.
    pub async fn admin_count(&self) -> usize {
        self.inner.lock().await.admins.len()
    }

    /// Drops every registration.
    pub async fn clear(&self) {
        let mut state = self.inner.lock().await;
        state.students.clear();
        state.admins.clear();
    }
}
