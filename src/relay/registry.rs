//! # Connection Registry
//!
//! Tracks which WebSocket connections are currently part of the broadcast set.
//! Each connection is represented by the sending half of its outbound queue;
//! a dedicated writer task drains the queue into the socket.
//!
//! Membership changes (`add`, `remove`) are the only mutations. A broadcast
//! holds the registry lock for the whole fan-out, so observers never see a
//! message delivered to only part of the set.

use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Opaque handle for one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound queue feeding one connection's writer task.
pub type Outbox = mpsc::UnboundedSender<Utf8Bytes>;

/// Result of one broadcast call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fanout {
    /// Connections the frame was queued on.
    pub delivered: usize,
    /// Connections found closed at send time.
    pub skipped: usize,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    members: Mutex<HashMap<ConnectionId, Outbox>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly upgraded connection and returns its handle.
    pub fn add(&self, outbox: Outbox) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, outbox);
        id
    }

    /// Drops a connection from the broadcast set. Removing twice is harmless.
    pub fn remove(&self, id: ConnectionId) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits every connection whose outbound queue is still open.
    pub fn for_each_open<F>(&self, mut visit: F)
    where
        F: FnMut(ConnectionId, &Outbox),
    {
        let members = self.lock();
        for (id, outbox) in members.iter() {
            if !outbox.is_closed() {
                visit(*id, outbox);
            }
        }
    }

    /// Queues `frame` verbatim on every open connection, the sender included.
    ///
    /// A connection that turns out to be closed is skipped and the fan-out
    /// carries on with the rest.
    pub fn broadcast(&self, frame: Utf8Bytes) -> Fanout {
        let mut fanout = Fanout::default();
        let members = self.lock();
        for outbox in members.values() {
            if outbox.is_closed() {
                fanout.skipped += 1;
                continue;
            }
            match outbox.send(frame.clone()) {
                Ok(()) => fanout.delivered += 1,
                Err(_) => fanout.skipped += 1,
            }
        }
        fanout
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, Outbox>> {
        // A poisoned map is still a valid membership set.
        self.members.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
