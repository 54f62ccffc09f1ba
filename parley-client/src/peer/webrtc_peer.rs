use crate::config::CoordinatorConfig;
use crate::media::{LocalMedia, RemoteTrack, TrackKind};
use crate::peer::{
    GatheringState, PeerConnection, PeerConnector, PeerEvent, SignalingState, TransportState,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Builds webrtc-rs peer connections with the configured ICE servers.
#[derive(Debug, Clone)]
pub struct WebrtcConnector {
    ice_servers: Vec<IceServerConfig>,
}

impl WebrtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(config.ice_servers.clone())
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for WebrtcConnector {
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>> {
        let peer = WebrtcPeer::new(self.rtc_configuration(), media, events).await?;
        Ok(Box::new(peer))
    }
}

/// A webrtc-rs peer connection with its local tracks attached.
pub struct WebrtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    local_tracks: Vec<(TrackKind, Arc<TrackLocalStaticSample>)>,
    data_channels: Mutex<Vec<Arc<RTCDataChannel>>>,
}

impl WebrtcPeer {
    pub async fn new(
        config: RTCConfiguration,
        media: &LocalMedia,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(config)
                .await
                .context("Failed to create peer connection")?,
        );

        let mut local_tracks = Vec::with_capacity(media.tracks.len());
        for track in &media.tracks {
            let sample_track = Arc::new(TrackLocalStaticSample::new(
                codec_for(track.kind),
                track.id.clone(),
                media.stream_id.clone(),
            ));
            peer_connection
                .add_track(Arc::clone(&sample_track) as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("Failed to add {} track", track.kind))?;
            local_tracks.push((track.kind, sample_track));
        }

        register_callbacks(&peer_connection, events);

        Ok(Self {
            peer_connection,
            local_tracks,
            data_channels: Mutex::new(Vec::new()),
        })
    }

    /// Sample-writable track for `kind`, if one was requested.
    pub fn local_track(&self, kind: TrackKind) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, track)| Arc::clone(track))
    }
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: "audio/opus".to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: "video/VP8".to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}

fn register_callbacks(pc: &Arc<RTCPeerConnection>, events: mpsc::UnboundedSender<PeerEvent>) {
    let ice_tx = events.clone();
    pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        // `None` marks the end of gathering, reported separately below.
        if let Some(candidate) = c {
            match candidate.to_json() {
                Ok(init) => {
                    let _ = ice_tx.send(PeerEvent::LocalCandidate(from_candidate_init(init)));
                }
                Err(e) => debug!("Failed to serialize local candidate: {}", e),
            }
        }
        Box::pin(async {})
    }));

    let gather_tx = events.clone();
    pc.on_ice_gathering_state_change(Box::new(move |s: RTCIceGathererState| {
        let state = match s {
            RTCIceGathererState::Gathering => Some(GatheringState::Gathering),
            RTCIceGathererState::Complete => Some(GatheringState::Complete),
            RTCIceGathererState::New => Some(GatheringState::New),
            _ => None,
        };
        if let Some(state) = state {
            let _ = gather_tx.send(PeerEvent::GatheringState(state));
        }
        Box::pin(async {})
    }));

    let state_tx = events.clone();
    pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
        info!("Peer connection state changed: {}", s);
        let state = match s {
            RTCPeerConnectionState::New => Some(TransportState::New),
            RTCPeerConnectionState::Connecting => Some(TransportState::Connecting),
            RTCPeerConnectionState::Connected => Some(TransportState::Connected),
            RTCPeerConnectionState::Disconnected => Some(TransportState::Disconnected),
            RTCPeerConnectionState::Failed => Some(TransportState::Failed),
            RTCPeerConnectionState::Closed => Some(TransportState::Closed),
            RTCPeerConnectionState::Unspecified => None,
        };
        if let Some(state) = state {
            let _ = state_tx.send(PeerEvent::TransportState(state));
        }
        Box::pin(async {})
    }));

    let track_tx = events.clone();
    pc.on_track(Box::new(move |track, _receiver, _transceiver| {
        let kind = match track.kind() {
            RTPCodecType::Audio => Some(TrackKind::Audio),
            RTPCodecType::Video => Some(TrackKind::Video),
            _ => None,
        };
        if let Some(kind) = kind {
            let _ = track_tx.send(PeerEvent::RemoteTrack(RemoteTrack {
                id: track.id(),
                stream_id: track.stream_id(),
                kind,
            }));
        }
        Box::pin(async {})
    }));

    let dc_tx = events;
    pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
        let _ = dc_tx.send(PeerEvent::DataChannel(dc.label().to_owned()));
        Box::pin(async {})
    }));
}

fn from_candidate_init(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let Some(sdp) = desc.sdp else {
        bail!("session description has no body");
    };
    let rtc = match desc.sdp_type {
        Some(SdpType::Offer) => RTCSessionDescription::offer(sdp)?,
        Some(SdpType::Answer) => RTCSessionDescription::answer(sdp)?,
        Some(SdpType::Pranswer) => RTCSessionDescription::pranswer(sdp)?,
        Some(SdpType::Rollback) | None => {
            bail!("unsupported session description type: {:?}", desc.sdp_type)
        }
    };
    Ok(rtc)
}

fn from_rtc_description(desc: RTCSessionDescription) -> SessionDescription {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => Some(SdpType::Offer),
        RTCSdpType::Answer => Some(SdpType::Answer),
        RTCSdpType::Pranswer => Some(SdpType::Pranswer),
        RTCSdpType::Rollback => Some(SdpType::Rollback),
        RTCSdpType::Unspecified => None,
    };
    SessionDescription {
        sdp_type,
        sdp: Some(desc.sdp),
    }
}

#[async_trait]
impl PeerConnection for WebrtcPeer {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(from_rtc_description(offer))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(from_rtc_description(answer))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<()> {
        let channel = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .with_context(|| format!("Failed to create data channel '{label}'"))?;
        self.data_channels.lock().await.push(channel);
        Ok(())
    }

    fn signaling_state(&self) -> SignalingState {
        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveRemotePranswer => {
                SignalingState::HaveLocalOffer
            }
            RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveLocalPranswer => {
                SignalingState::HaveRemoteOffer
            }
            RTCSignalingState::Closed => SignalingState::Closed,
            RTCSignalingState::Stable | RTCSignalingState::Unspecified => SignalingState::Stable,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn close(&self) -> Result<()> {
        self.data_channels.lock().await.clear();
        self.peer_connection.close().await?;
        Ok(())
    }
}
