use crate::media::{LocalMedia, RemoteMedia};
use crate::negotiation::NegotiationEngine;
use crate::session::store_undo::{StoreUndo, UndoAction};
use crate::signaling::Subscription;
use periscope_core::{CandidateDirection, RoomId, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Broadcaster,
    Viewer,
}

impl Role {
    /// Direction this role publishes its own candidates under.
    pub fn direction(self) -> CandidateDirection {
        match self {
            Role::Broadcaster => CandidateDirection::Broadcaster,
            Role::Viewer => CandidateDirection::Viewer,
        }
    }
}

pub(crate) enum SessionMedia {
    Local(LocalMedia),
    Remote(RemoteMedia),
}

/// Everything one active broadcast or viewing session owns.
pub(crate) struct PeerSession {
    pub(crate) role: Role,
    pub(crate) room_id: Option<RoomId>,
    pub(crate) engine: Arc<NegotiationEngine>,
    pub(crate) media: SessionMedia,
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) closing: Arc<AtomicBool>,
    pub(crate) shutdown_tx: Option<oneshot::Sender<()>>,
    pub(crate) event_loop: Option<JoinHandle<()>>,
    /// Broadcaster: the room document was written by this session.
    pub(crate) owns_room: bool,
    /// Viewer: this session incremented the viewer count.
    pub(crate) counted: bool,
    /// Viewer: the answer this session wrote into the room.
    pub(crate) answer: Option<SessionDescription>,
    /// The create or join call returned successfully.
    pub(crate) established: bool,
}

impl PeerSession {
    pub(crate) fn new(role: Role, engine: Arc<NegotiationEngine>, media: SessionMedia) -> Self {
        Self {
            role,
            room_id: None,
            engine,
            media,
            subscriptions: Vec::new(),
            closing: Arc::new(AtomicBool::new(false)),
            shutdown_tx: None,
            event_loop: None,
            owns_room: false,
            counted: false,
            answer: None,
            established: false,
        }
    }

    /// Releases every local resource and returns the store writes that still
    /// have to be undone, if any.
    pub(crate) async fn shutdown(mut self) -> Option<StoreUndo> {
        self.closing.store(true, Ordering::SeqCst);

        for subscription in &mut self.subscriptions {
            subscription.unsubscribe();
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.event_loop.take() {
            if let Err(e) = handle.await {
                warn!("Session loop ended abnormally: {}", e);
            }
        }

        self.engine.close().await;

        match &mut self.media {
            SessionMedia::Local(media) => media.release(),
            SessionMedia::Remote(media) => media.release(),
        }

        let room_id = self.room_id.clone()?;
        let action = match self.role {
            Role::Broadcaster if self.owns_room => UndoAction::DeleteRoom,
            Role::Viewer if self.counted || self.answer.is_some() => {
                // A viewer that never finished joining frees the answer slot.
                let clear_answer = if self.established {
                    None
                } else {
                    self.answer.take()
                };
                UndoAction::Leave {
                    decrement: self.counted,
                    clear_answer,
                }
            }
            _ => {
                debug!(room_id = %room_id, "Session released before it was published");
                return None;
            }
        };
        Some(StoreUndo { room_id, action })
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        // Store writes cannot be undone here; only stop the loop.
        if let Some(handle) = self.event_loop.take() {
            handle.abort();
        }
    }
}
