use crate::error::{Result, SessionError};
use crate::media::LocalMedia;
use crate::negotiation::negotiation_state::NegotiationState;
use crate::transport::{PeerTransport, SessionConfig, TransportEvent};
use anyhow::{Context, anyhow};
use periscope_core::{IceCandidatePayload, SdpType, SessionDescription};
use std::collections::HashSet;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

struct EngineInner {
    state: NegotiationState,
    /// Candidates that arrived before the remote description was set.
    pending: Vec<IceCandidatePayload>,
    applied: HashSet<IceCandidatePayload>,
}

/// Drives the offer/answer/ICE state machine over one peer transport.
///
/// Every call is checked against the current state and rejected with
/// `SessionError::InvalidState` if it arrives out of order. Transport events
/// (gathered candidates, remote tracks, connection changes) go to the channel
/// passed to `new`.
pub struct NegotiationEngine {
    transport: PeerTransport,
    inner: Mutex<EngineInner>,
}

fn invalid(operation: &'static str, state: NegotiationState) -> SessionError {
    SessionError::InvalidState { operation, state }
}

impl NegotiationEngine {
    pub async fn new(config: &SessionConfig, event_tx: mpsc::Sender<TransportEvent>) -> Result<Self> {
        let transport = PeerTransport::new(config, event_tx).await?;

        Ok(Self {
            transport,
            inner: Mutex::new(EngineInner {
                state: NegotiationState::Idle,
                pending: Vec::new(),
                applied: HashSet::new(),
            }),
        })
    }

    pub async fn state(&self) -> NegotiationState {
        self.inner.lock().await.state
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.transport.connection_state()
    }

    /// Attaches `media` and produces the local offer. Tracks added later are
    /// not negotiated.
    pub async fn create_offer(&self, media: &LocalMedia) -> Result<SessionDescription> {
        let mut inner = self.inner.lock().await;
        if inner.state != NegotiationState::Idle {
            return Err(invalid("create_offer", inner.state));
        }

        self.transport.add_tracks(media).await?;
        let offer = self.transport.create_offer().await?;
        inner.state = NegotiationState::LocalOfferCreated;

        debug!(tracks = media.tracks().len(), "Local offer created");
        Ok(SessionDescription::offer(offer.sdp))
    }

    /// The offer is visible to viewers; start waiting for an answer.
    pub async fn offer_published(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != NegotiationState::LocalOfferCreated {
            return Err(invalid("offer_published", inner.state));
        }
        inner.state = NegotiationState::AwaitingRemoteAnswer;
        Ok(())
    }

    /// Applies the broadcaster's offer and returns the local answer.
    pub async fn apply_remote_offer(&self, offer: &SessionDescription) -> Result<SessionDescription> {
        let mut inner = self.inner.lock().await;
        if inner.state != NegotiationState::Idle {
            return Err(invalid("apply_remote_offer", inner.state));
        }
        if offer.sdp_type != SdpType::Offer {
            return Err(anyhow!("expected an offer, got {:?}", offer.sdp_type).into());
        }

        let desc = offer.to_rtc().context("Malformed remote offer")?;
        self.transport.set_remote_description(desc).await?;
        inner.state = NegotiationState::RemoteOfferReceived;

        let answer = self.transport.create_answer().await?;
        inner.state = NegotiationState::LocalAnswerCreated;
        self.flush_pending(&mut inner).await;

        debug!("Local answer created");
        Ok(SessionDescription::answer(answer.sdp))
    }

    /// The answer is stored in the room; wait for the transport to connect.
    pub async fn answer_published(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            NegotiationState::LocalAnswerCreated => {
                inner.state = NegotiationState::AwaitingConnection;
                Ok(())
            }
            state => Err(invalid("answer_published", state)),
        }
    }

    /// Applies the viewer's answer. Fails if no offer is outstanding or an
    /// answer was already applied; the session cannot recover from that.
    pub async fn apply_remote_answer(&self, answer: &SessionDescription) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != NegotiationState::AwaitingRemoteAnswer {
            return Err(invalid("apply_remote_answer", inner.state));
        }
        if answer.sdp_type != SdpType::Answer {
            return Err(anyhow!("expected an answer, got {:?}", answer.sdp_type).into());
        }

        let desc = answer.to_rtc().context("Malformed remote answer")?;
        self.transport.set_remote_description(desc).await?;
        inner.state = NegotiationState::Connected;
        self.flush_pending(&mut inner).await;

        info!("Remote answer applied");
        Ok(())
    }

    /// Applies a remote candidate, or queues it until the remote description
    /// is set. Candidates already seen are ignored.
    pub async fn add_remote_candidate(&self, candidate: IceCandidatePayload) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.state.accepts_candidates() {
            return Err(invalid("add_remote_candidate", inner.state));
        }
        if inner.applied.contains(&candidate) || inner.pending.contains(&candidate) {
            return Ok(());
        }

        if !inner.state.has_remote_description() {
            debug!("Queueing ICE candidate until remote description is set");
            inner.pending.push(candidate);
            return Ok(());
        }

        self.transport.add_ice_candidate(candidate.clone()).await?;
        inner.applied.insert(candidate);
        Ok(())
    }

    /// Records that the transport connected. Returns `true` on the
    /// `AwaitingConnection → Connected` transition.
    pub async fn mark_connected(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state == NegotiationState::AwaitingConnection {
            inner.state = NegotiationState::Connected;
            return true;
        }
        false
    }

    /// Closes the transport. Safe to call repeatedly.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state.is_terminal() {
            return;
        }
        inner.state = NegotiationState::Closed;
        inner.pending.clear();

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close peer transport: {:#}", e);
        }
    }

    async fn flush_pending(&self, inner: &mut EngineInner) {
        for candidate in std::mem::take(&mut inner.pending) {
            match self.transport.add_ice_candidate(candidate.clone()).await {
                Ok(()) => {
                    inner.applied.insert(candidate);
                }
                Err(e) => warn!("Failed to apply queued ICE candidate: {:#}", e),
            }
        }
    }
}
