use std::fmt;

/// Lifecycle of one room membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallState {
    #[default]
    Idle,
    Joining,
    WaitingForPeer,
    /// Local offer sent, waiting for the answer.
    Offering,
    /// Answer sent, waiting for the transport to connect.
    Negotiating,
    Connected,
    Closed,
}

impl CallState {
    /// No handshake path has been taken yet.
    pub fn awaits_handshake(&self) -> bool {
        matches!(self, CallState::Joining | CallState::WaitingForPeer)
    }

    /// States bounded by the handshake timeout.
    pub fn is_handshaking(&self) -> bool {
        matches!(self, CallState::Offering | CallState::Negotiating)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Idle | CallState::Closed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallState::Idle => "idle",
            CallState::Joining => "joining",
            CallState::WaitingForPeer => "waiting for peer",
            CallState::Offering => "offering",
            CallState::Negotiating => "negotiating",
            CallState::Connected => "connected",
            CallState::Closed => "closed",
        };
        f.write_str(s)
    }
}
