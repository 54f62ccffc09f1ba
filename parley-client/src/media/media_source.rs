use crate::CallError;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// What to capture when a call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
    /// Camera to capture from. `None` picks the default device.
    pub camera: Option<String>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            camera: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub kind: TrackKind,
    /// Capture device backing the track, if known.
    pub device: Option<String>,
}

/// Tracks captured for one call, attached to the peer connection before
/// any offer or answer is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMedia {
    pub stream_id: String,
    pub tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn has(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fails with [`CallError::Device`] when the constraints cannot be met.
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, CallError>;
}
