use crate::room::RoomManager;
use dashmap::DashMap;
use parley_core::{ConnectionId, RoomId, SignalMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

struct ConnectionEntry {
    tx: mpsc::UnboundedSender<SignalMessage>,
    rooms: HashSet<RoomId>,
}

struct RelayInner {
    rooms: RoomManager,
    connections: DashMap<ConnectionId, ConnectionEntry>,
    shutdown_tx: watch::Sender<bool>,
}

/// Rendezvous relay: groups connections into rooms and forwards signaling
/// messages between members without looking at their payloads.
///
/// Lock order is always rooms before connections; no code path holds a
/// connection entry while waiting on a room.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(RelayInner {
                rooms: RoomManager::new(),
                connections: DashMap::new(),
                shutdown_tx,
            }),
        }
    }

    /// Attaches the outbound queue of a freshly accepted socket.
    pub fn register(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<SignalMessage>) {
        if self.is_shut_down() {
            warn!("Relay is shut down, refusing connection {}", connection);
            return;
        }
        self.inner.connections.insert(
            connection,
            ConnectionEntry {
                tx,
                rooms: HashSet::new(),
            },
        );
        debug!("Registered connection {}", connection);
    }

    /// Entry point for every message read from a client socket.
    pub fn handle_message(&self, connection: ConnectionId, msg: SignalMessage) {
        if self.is_shut_down() {
            return;
        }

        match msg {
            SignalMessage::Join { room } => self.join(connection, &room),
            SignalMessage::Welcome { room } => {
                warn!(
                    "Ignoring welcome for '{}' sent by client {}",
                    room, connection
                );
            }
            msg => {
                self.relay(connection, msg);
            }
        }
    }

    /// Adds `connection` to `room` and welcomes it to the members already
    /// there. Joining a room twice is a no-op.
    pub fn join(&self, connection: ConnectionId, room: &RoomId) {
        if room.is_empty() {
            debug!("Ignoring join with empty room name from {}", connection);
            return;
        }
        if !self.inner.connections.contains_key(&connection) {
            warn!("Join from unregistered connection {}", connection);
            return;
        }

        let joined = self.inner.rooms.join(room, connection, |member| {
            self.send_to(member, SignalMessage::welcome(room.clone()));
        });
        if !joined {
            return;
        }

        if let Some(mut entry) = self.inner.connections.get_mut(&connection) {
            entry.rooms.insert(room.clone());
        }
        info!("Connection {} joined room '{}'", connection, room);
    }

    /// Forwards an offer, answer or ice message to every other member of its
    /// room. Returns the number of members it was handed to.
    pub fn relay(&self, connection: ConnectionId, msg: SignalMessage) -> usize {
        if !msg.is_relayable() {
            warn!("Refusing to relay {} from {}", msg.kind(), connection);
            return 0;
        }

        let room = msg.room().clone();
        let delivered = self.inner.rooms.for_each_other(&room, connection, |member| {
            self.send_to(member, msg.clone());
        });
        debug!(
            "Relayed {} from {} to {} member(s) of '{}'",
            msg.kind(),
            connection,
            delivered,
            room
        );
        delivered
    }

    /// Drops `connection` from every room it joined. Remaining members are
    /// not told.
    pub fn leave(&self, connection: ConnectionId) {
        let Some((_, entry)) = self.inner.connections.remove(&connection) else {
            return;
        };

        for room in &entry.rooms {
            self.inner.rooms.remove_member(room, &connection);
        }
        info!(
            "Connection {} left {} room(s)",
            connection,
            entry.rooms.len()
        );
    }

    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.inner.rooms.members(room)
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Closes every outbound queue and forgets all rooms. Socket tasks notice
    /// their queue closing and hang up.
    pub fn shutdown(&self) {
        if self.inner.shutdown_tx.send_replace(true) {
            return;
        }
        info!(
            "Shutting down relay ({} connection(s), {} room(s))",
            self.connection_count(),
            self.room_count()
        );
        self.inner.connections.clear();
        self.inner.rooms.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.inner.shutdown_tx.subscribe()
    }

    fn send_to(&self, connection: ConnectionId, msg: SignalMessage) {
        let Some(entry) = self.inner.connections.get(&connection) else {
            debug!("Dropping {} for vanished connection {}", msg.kind(), connection);
            return;
        };
        if entry.tx.send(msg).is_err() {
            debug!("Outbound queue of {} is closed", connection);
        }
    }
}
