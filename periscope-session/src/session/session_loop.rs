use crate::media::RemoteMedia;
use crate::negotiation::{NegotiationEngine, NegotiationState};
use crate::session::observers::SessionObservers;
use crate::session::peer_session::Role;
use crate::session::session_event::{EndReason, SessionEnded, SessionEvent};
use crate::signaling::CandidateRelay;
use crate::store::RoomChange;
use crate::transport::TransportEvent;
use periscope_core::RoomId;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Reacts to store changes and transport events for one session until it is
/// shut down or ends on its own.
pub(crate) struct SessionLoop {
    pub(crate) role: Role,
    pub(crate) room_id: RoomId,
    pub(crate) engine: Arc<NegotiationEngine>,
    pub(crate) relay: CandidateRelay,
    pub(crate) remote_media: Option<RemoteMedia>,
    pub(crate) observers: Arc<SessionObservers>,
    pub(crate) closing: Arc<AtomicBool>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pub(crate) transport_rx: mpsc::Receiver<TransportEvent>,
    pub(crate) shutdown_rx: oneshot::Receiver<()>,
}

impl SessionLoop {
    pub(crate) async fn run(mut self) {
        debug!(room_id = %self.room_id, role = ?self.role, "Session loop started");

        loop {
            let flow = tokio::select! {
                _ = &mut self.shutdown_rx => break,

                evt = self.event_rx.recv() => match evt {
                    Some(e) => self.handle_session_event(e).await,
                    None => break,
                },

                evt = self.transport_rx.recv() => match evt {
                    Some(e) => self.handle_transport_event(e).await,
                    None => {
                        warn!("Transport channel closed unexpectedly");
                        break;
                    }
                },
            };

            if flow.is_break() {
                break;
            }
        }

        debug!(room_id = %self.room_id, "Session loop finished");
    }

    async fn handle_session_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Room(RoomChange::Deleted) => {
                info!(room_id = %self.room_id, "Room deleted; ending session");
                self.end(EndReason::RoomDeleted).await
            }

            SessionEvent::Room(RoomChange::Updated(room)) => {
                if self.role != Role::Broadcaster {
                    return ControlFlow::Continue(());
                }
                let Some(answer) = room.answer else {
                    return ControlFlow::Continue(());
                };
                // Later snapshots carry the same answer; apply it once.
                if self.engine.state().await != NegotiationState::AwaitingRemoteAnswer {
                    return ControlFlow::Continue(());
                }

                match self.engine.apply_remote_answer(&answer).await {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(e) => {
                        error!(room_id = %self.room_id, "Failed to apply answer: {}", e);
                        self.end(EndReason::NegotiationFailed(e.to_string())).await
                    }
                }
            }

            SessionEvent::RemoteCandidate(candidate) => {
                if let Err(e) = self.engine.add_remote_candidate(candidate).await {
                    warn!(room_id = %self.room_id, "Failed to add remote ICE candidate: {}", e);
                }
                ControlFlow::Continue(())
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) -> ControlFlow<()> {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                let published = self
                    .relay
                    .publish(&self.room_id, self.role.direction(), candidate)
                    .await;
                if let Err(e) = published {
                    warn!(room_id = %self.room_id, "Failed to publish ICE candidate: {}", e);
                }
            }

            TransportEvent::TrackReceived(track) => {
                let Some(media) = &self.remote_media else {
                    debug!("Ignoring remote track on a broadcast session");
                    return ControlFlow::Continue(());
                };
                if media.add_track(track) {
                    self.observers.remote_media.emit(media.clone());
                }
            }

            TransportEvent::Connected => {
                if self.engine.mark_connected().await {
                    info!(room_id = %self.room_id, "Viewer connected");
                }
            }

            TransportEvent::Lost => {
                if self.closing.load(Ordering::SeqCst) {
                    return ControlFlow::Continue(());
                }
                warn!(room_id = %self.room_id, "Peer transport lost");
                return self.end(EndReason::TransportLost).await;
            }
        }
        ControlFlow::Continue(())
    }

    /// Closes the transport and tells observers why. The session stays in
    /// the controller until `stop_session` releases the rest.
    async fn end(&mut self, reason: EndReason) -> ControlFlow<()> {
        if self.closing.swap(true, Ordering::SeqCst) {
            return ControlFlow::Break(());
        }

        self.engine.close().await;
        if let Some(media) = &self.remote_media {
            media.release();
        }

        self.observers.session_ended.emit(SessionEnded {
            room_id: self.room_id.clone(),
            reason,
        });
        ControlFlow::Break(())
    }
}
