use crate::CallError;
use crate::media::{LocalMedia, LocalTrack, MediaConstraints, MediaSource, TrackKind};
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_CAMERA: &str = "default";

/// Media source over a fixed list of cameras.
///
/// Produces track descriptions only; samples are written to the peer's
/// local tracks by whoever owns the capture pipeline.
#[derive(Debug, Clone)]
pub struct StaticMediaSource {
    cameras: Vec<String>,
}

impl Default for StaticMediaSource {
    fn default() -> Self {
        Self::new(vec![DEFAULT_CAMERA.to_owned()])
    }
}

impl StaticMediaSource {
    pub fn new(cameras: Vec<String>) -> Self {
        Self { cameras }
    }

    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, CallError> {
        if !constraints.audio && !constraints.video {
            return Err(CallError::Device(
                "neither audio nor video was requested".into(),
            ));
        }

        let mut tracks = Vec::with_capacity(2);

        if constraints.audio {
            tracks.push(LocalTrack {
                id: format!("audio-{}", Uuid::new_v4()),
                kind: TrackKind::Audio,
                device: None,
            });
        }

        if constraints.video {
            let camera = match &constraints.camera {
                Some(id) if self.cameras.iter().any(|c| c == id) => id.clone(),
                Some(id) => {
                    warn!("Camera '{}' not found among {:?}", id, self.cameras);
                    return Err(CallError::Device(format!("camera '{id}' not found")));
                }
                None => match self.cameras.first() {
                    Some(first) => first.clone(),
                    None => return Err(CallError::Device("no camera available".into())),
                },
            };
            tracks.push(LocalTrack {
                id: format!("video-{}", Uuid::new_v4()),
                kind: TrackKind::Video,
                device: Some(camera),
            });
        }

        debug!("Acquired {} local track(s)", tracks.len());

        Ok(LocalMedia {
            stream_id: Uuid::new_v4().to_string(),
            tracks,
        })
    }
}
