use crate::media::LocalMedia;
use crate::transport::transport_config::SessionConfig;
use crate::transport::transport_event::TransportEvent;
use anyhow::{Context, Result};
use periscope_core::IceCandidatePayload;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// One webrtc-rs peer connection plus the callbacks that feed its events
/// into the owning session's channel.
pub struct PeerTransport {
    peer_connection: Arc<RTCPeerConnection>,
}

impl PeerTransport {
    pub async fn new(config: &SessionConfig, event_tx: mpsc::Sender<TransportEvent>) -> Result<Self> {
        // 1. Media engine with the default codecs
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Interceptors (NACK, RTCP reports)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        // 3. API object, with loopback candidates only when asked for
        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_setting_engine(settings)
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 4. ICE servers (STUN/TURN) from the session config
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ice_candidate_pool_size: config.ice_candidate_pool_size,
            ..Default::default()
        };

        // 5. Peer connection
        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        // --- Callbacks ---
        // Each closure owns its own sender clone.

        // A. Connection state: Connected, or Lost on failure/disconnect
        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => TransportEvent::Connected,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                            TransportEvent::Lost
                        }
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        // B. Local ICE candidates, for publishing to the store
        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local ICE candidate: {}", e);
                        return;
                    }
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(init.into()))
                    .await;
            })
        }));

        // C. Remote tracks (viewer side)
        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    debug!("Remote track received: kind={}", track.kind());
                    let _ = tx.send(TransportEvent::TrackReceived(track)).await;
                })
            },
        ));

        Ok(Self { peer_connection })
    }

    /// Attaches every outbound track. Must happen before the offer is created.
    pub async fn add_tracks(&self, media: &LocalMedia) -> Result<()> {
        for track in media.tracks() {
            let sender = self
                .peer_connection
                .add_track(Arc::clone(track))
                .await
                .with_context(|| format!("Failed to add track {}", track.id()))?;

            // RTCP has to be read for interceptors (NACK, reports) to run.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    /// Creates an offer and installs it as the local description.
    pub async fn create_offer(&self) -> Result<RTCSessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(offer)
    }

    /// Creates an answer and installs it as the local description.
    pub async fn create_answer(&self) -> Result<RTCSessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(answer)
    }

    pub async fn set_remote_description(&self, desc: RTCSessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    pub async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit::from(candidate))
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.peer_connection.connection_state()
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}
