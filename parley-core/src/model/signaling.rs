use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// Offer or answer body as relayed between peers.
///
/// Both fields are optional on the wire so that an incomplete description
/// still reaches the coordinator, which decides whether to drop it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sdp_type: Option<SdpType>,
    #[serde(default, alias = "body", skip_serializing_if = "Option::is_none")]
    pub sdp: Option<String>,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: Some(SdpType::Offer),
            sdp: Some(sdp.into()),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: Some(SdpType::Answer),
            sdp: Some(sdp.into()),
        }
    }

    /// The SDP text, if present and not blank.
    pub fn body(&self) -> Option<&str> {
        self.sdp.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.sdp_type.is_some() && self.body().is_some()
    }
}

/// Same shape as a browser `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    #[serde(default)]
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalMessage {
    Join {
        room: RoomId,
    },
    Welcome {
        room: RoomId,
    },
    Offer {
        room: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<SessionDescription>,
    },
    Answer {
        room: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<SessionDescription>,
    },
    #[serde(rename = "ice")]
    IceCandidate {
        room: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<IceCandidate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Join,
    Welcome,
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalKind::Join => "join",
            SignalKind::Welcome => "welcome",
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice",
        };
        f.write_str(s)
    }
}

impl SignalMessage {
    pub fn join(room: impl Into<RoomId>) -> Self {
        SignalMessage::Join { room: room.into() }
    }

    pub fn welcome(room: impl Into<RoomId>) -> Self {
        SignalMessage::Welcome { room: room.into() }
    }

    pub fn offer(room: impl Into<RoomId>, sdp: impl Into<String>) -> Self {
        SignalMessage::Offer {
            room: room.into(),
            payload: Some(SessionDescription::offer(sdp)),
        }
    }

    pub fn answer(room: impl Into<RoomId>, sdp: impl Into<String>) -> Self {
        SignalMessage::Answer {
            room: room.into(),
            payload: Some(SessionDescription::answer(sdp)),
        }
    }

    pub fn ice(room: impl Into<RoomId>, candidate: IceCandidate) -> Self {
        SignalMessage::IceCandidate {
            room: room.into(),
            payload: Some(candidate),
        }
    }

    pub fn room(&self) -> &RoomId {
        match self {
            SignalMessage::Join { room }
            | SignalMessage::Welcome { room }
            | SignalMessage::Offer { room, .. }
            | SignalMessage::Answer { room, .. }
            | SignalMessage::IceCandidate { room, .. } => room,
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            SignalMessage::Join { .. } => SignalKind::Join,
            SignalMessage::Welcome { .. } => SignalKind::Welcome,
            SignalMessage::Offer { .. } => SignalKind::Offer,
            SignalMessage::Answer { .. } => SignalKind::Answer,
            SignalMessage::IceCandidate { .. } => SignalKind::IceCandidate,
        }
    }

    /// Offer, answer and ice are the only kinds a relay fans out.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self.kind(),
            SignalKind::Offer | SignalKind::Answer | SignalKind::IceCandidate
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
