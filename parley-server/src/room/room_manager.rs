use crate::room::Room;
use dashmap::DashMap;
use parley_core::{ConnectionId, RoomId};
use tracing::{debug, info};

/// Room table shared by every connection handler.
///
/// Each room lives behind its own map shard lock, so membership changes and
/// the fan-out that follows them are serialized per room.
#[derive(Default)]
pub struct RoomManager {
    rooms: DashMap<RoomId, Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection` to `room` and, while still holding the room lock,
    /// calls `notify` for every other member.
    ///
    /// Returns `false` (and notifies nobody) when the connection was already
    /// a member.
    pub fn join<F>(&self, room: &RoomId, connection: ConnectionId, mut notify: F) -> bool
    where
        F: FnMut(ConnectionId),
    {
        let mut entry = self.rooms.entry(room.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room);
            Room::new()
        });

        if !entry.add(connection) {
            debug!("{} is already a member of '{}'", connection, room);
            return false;
        }

        for member in entry.others(connection) {
            notify(member);
        }
        true
    }

    /// Calls `f` for every member of `room` except `sender`. Returns how many
    /// members were visited.
    pub fn for_each_other<F>(&self, room: &RoomId, sender: ConnectionId, mut f: F) -> usize
    where
        F: FnMut(ConnectionId),
    {
        let Some(entry) = self.rooms.get(room) else {
            return 0;
        };

        let mut visited = 0;
        for member in entry.others(sender) {
            f(member);
            visited += 1;
        }
        visited
    }

    /// Removes `connection` from `room`, dropping the room once it is empty.
    pub fn remove_member(&self, room: &RoomId, connection: &ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut entry) => entry.remove(connection),
            None => false,
        };

        if self.rooms.remove_if(room, |_, r| r.is_empty()).is_some() {
            info!("Room '{}' is empty, removing it", room);
        }
        removed
    }

    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|entry| entry.members().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn clear(&self) {
        self.rooms.clear();
    }
}
