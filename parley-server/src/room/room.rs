use parley_core::ConnectionId;
use std::collections::HashSet;

/// Membership of one rendezvous room.
#[derive(Debug, Default)]
pub struct Room {
    members: HashSet<ConnectionId>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the connection was already a member.
    pub fn add(&mut self, connection: ConnectionId) -> bool {
        self.members.insert(connection)
    }

    pub fn remove(&mut self, connection: &ConnectionId) -> bool {
        self.members.remove(connection)
    }

    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.members.contains(connection)
    }

    /// Every member except `connection`.
    pub fn others(&self, connection: ConnectionId) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members
            .iter()
            .copied()
            .filter(move |member| *member != connection)
    }

    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
