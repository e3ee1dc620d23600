use crate::error::{Result, SessionError, StoreError};
use crate::media::{LocalMedia, RemoteMedia};
use crate::negotiation::{NegotiationEngine, NegotiationState};
use crate::room::{RoomRegistry, ViewerCounter};
use crate::session::observers::SessionObservers;
use crate::session::peer_session::{PeerSession, Role, SessionMedia};
use crate::session::session_event::{EndReason, SessionEnded, SessionEvent};
use crate::session::session_loop::SessionLoop;
use crate::session::store_undo::StoreUndo;
use crate::signaling::{CandidateRelay, Subscription};
use crate::store::SignalingStore;
use crate::transport::{SessionConfig, TransportEvent};
use periscope_core::{RoomId, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{info, warn};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

const TRANSPORT_EVENT_CAPACITY: usize = 256;

fn store_unavailable(err: StoreError) -> SessionError {
    match err {
        StoreError::Unavailable(reason) => SessionError::StoreUnavailable(reason),
        other => SessionError::StoreUnavailable(other.to_string()),
    }
}

#[derive(Default)]
struct SessionSlot {
    current: Option<PeerSession>,
    /// Undo work from earlier sessions that hit a store failure.
    pending: Vec<StoreUndo>,
}

/// Orchestrates one broadcast or one viewing session at a time on top of a
/// shared signaling store.
///
/// Starting a new session stops the current one first. All store writes a
/// session made are undone by [`SessionController::stop_session`]; writes
/// that could not be undone because the store was unreachable are retried
/// by the next call that touches the controller's session.
///
/// Observer callbacks run on the session's tasks. They may register more
/// observers or drop their own [`Subscription`]; a callback added during a
/// delivery first fires on the next value.
pub struct SessionController {
    registry: RoomRegistry,
    relay: CandidateRelay,
    counter: ViewerCounter,
    config: SessionConfig,
    observers: Arc<SessionObservers>,
    slot: Mutex<SessionSlot>,
}

impl SessionController {
    pub fn new(store: Arc<dyn SignalingStore>, config: SessionConfig) -> Self {
        Self {
            registry: RoomRegistry::new(store.clone()),
            relay: CandidateRelay::new(store.clone()),
            counter: ViewerCounter::new(store),
            config,
            observers: Arc::new(SessionObservers::new()),
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    /// Publishes an offer carrying `local_media` and returns the new room's id
    /// for sharing with a viewer.
    pub async fn create_room(&self, local_media: LocalMedia) -> Result<RoomId> {
        if local_media.is_empty() {
            return Err(SessionError::LocalMediaUnavailable);
        }

        let mut slot = self.slot.lock().await;
        if let Err(e) = self.stop_current(&mut slot).await {
            warn!("Previous session did not shut down cleanly: {}", e);
        }

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let engine = Arc::new(NegotiationEngine::new(&self.config, transport_tx).await?);
        let mut session =
            PeerSession::new(Role::Broadcaster, engine, SessionMedia::Local(local_media));

        match self.start_broadcast(&mut session, transport_rx).await {
            Ok(room_id) => {
                info!(room_id = %room_id, "Broadcast started");
                session.established = true;
                slot.current = Some(session);
                Ok(room_id)
            }
            Err(e) => {
                warn!("Failed to start broadcast: {}", e);
                if let Err(cleanup) = self.release(&mut slot, session).await {
                    warn!("Cleanup after failed broadcast: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    async fn start_broadcast(
        &self,
        session: &mut PeerSession,
        transport_rx: mpsc::Receiver<TransportEvent>,
    ) -> Result<RoomId> {
        let offer = match &session.media {
            SessionMedia::Local(media) => session.engine.create_offer(media).await?,
            SessionMedia::Remote(_) => return Err(SessionError::LocalMediaUnavailable),
        };

        let room_id = self.registry.create(offer).await.map_err(store_unavailable)?;
        session.room_id = Some(room_id.clone());
        session.owns_room = true;

        session.engine.offer_published().await?;
        self.attach(session, &room_id, None, transport_rx).await?;
        Ok(room_id)
    }

    /// Answers the offer in `room_id`. The returned handle fills with the
    /// broadcaster's tracks as they arrive.
    ///
    /// A join that fails after its answer was stored withdraws the answer
    /// again, so a retryable failure can be retried as a whole.
    pub async fn join_room(&self, room_id: &RoomId) -> Result<RemoteMedia> {
        let mut slot = self.slot.lock().await;
        if let Err(e) = self.stop_current(&mut slot).await {
            warn!("Previous session did not shut down cleanly: {}", e);
        }

        let room = self
            .registry
            .get(room_id)
            .await
            .map_err(|e| SessionError::from_store(e, room_id))?;
        let Some(offer) = room.offer else {
            warn!(room_id = %room_id, "Room has no offer");
            return Err(SessionError::RoomNotFound(room_id.clone()));
        };

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let engine = Arc::new(NegotiationEngine::new(&self.config, transport_tx).await?);
        let remote_media = RemoteMedia::new();
        let mut session = PeerSession::new(
            Role::Viewer,
            engine,
            SessionMedia::Remote(remote_media.clone()),
        );
        session.room_id = Some(room_id.clone());

        let joined = self
            .start_viewing(&mut session, room_id, &offer, remote_media.clone(), transport_rx)
            .await;

        match joined {
            Ok(()) => {
                info!(room_id = %room_id, "Joined room");
                session.established = true;
                slot.current = Some(session);
                Ok(remote_media)
            }
            Err(e) => {
                warn!(room_id = %room_id, "Failed to join room: {}", e);
                if let Err(cleanup) = self.release(&mut slot, session).await {
                    warn!("Cleanup after failed join: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    async fn start_viewing(
        &self,
        session: &mut PeerSession,
        room_id: &RoomId,
        offer: &SessionDescription,
        remote_media: RemoteMedia,
        transport_rx: mpsc::Receiver<TransportEvent>,
    ) -> Result<()> {
        let answer = session.engine.apply_remote_offer(offer).await?;

        self.registry
            .set_answer(room_id, answer.clone())
            .await
            .map_err(|e| SessionError::from_store(e, room_id))?;
        session.answer = Some(answer);
        session.engine.answer_published().await?;

        self.counter
            .increment(room_id)
            .await
            .map_err(|e| SessionError::from_store(e, room_id))?;
        session.counted = true;

        self.attach(session, room_id, Some(remote_media), transport_rx)
            .await
    }

    /// Subscribes the session to its room and the other side's candidates,
    /// then starts its event loop.
    async fn attach(
        &self,
        session: &mut PeerSession,
        room_id: &RoomId,
        remote_media: Option<RemoteMedia>,
        transport_rx: mpsc::Receiver<TransportEvent>,
    ) -> Result<()> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let to_session_error = |e| SessionError::from_store(e, room_id);

        let tx = event_tx.clone();
        let room_sub = self
            .registry
            .subscribe(room_id, move |change| {
                let _ = tx.send(SessionEvent::Room(change));
            })
            .await
            .map_err(to_session_error)?;
        session.subscriptions.push(room_sub);

        let tx = event_tx;
        let remote_direction = session.role.direction().opposite();
        let candidate_sub = self
            .relay
            .subscribe(room_id, remote_direction, move |candidate| {
                let _ = tx.send(SessionEvent::RemoteCandidate(candidate));
            })
            .await
            .map_err(to_session_error)?;
        session.subscriptions.push(candidate_sub);

        let observers = self.observers.clone();
        let count_sub = self
            .counter
            .subscribe(room_id, move |count| observers.viewer_count.emit(count))
            .await
            .map_err(to_session_error)?;
        session.subscriptions.push(count_sub);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let session_loop = SessionLoop {
            role: session.role,
            room_id: room_id.clone(),
            engine: session.engine.clone(),
            relay: self.relay.clone(),
            remote_media,
            observers: self.observers.clone(),
            closing: session.closing.clone(),
            event_rx,
            transport_rx,
            shutdown_rx,
        };
        session.shutdown_tx = Some(shutdown_tx);
        session.event_loop = Some(tokio::spawn(session_loop.run()));
        Ok(())
    }

    /// Ends the current session and undoes its store writes: the broadcaster
    /// deletes its room, a viewer decrements the count.
    ///
    /// Local resources are released even if the store write fails. The
    /// failed write is kept and retried by the next call, so calling this
    /// again after a `StoreUnavailable` finishes the cleanup. With nothing
    /// left to do it is a no-op.
    pub async fn stop_session(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        self.stop_current(&mut slot).await
    }

    async fn stop_current(&self, slot: &mut SessionSlot) -> Result<()> {
        match slot.current.take() {
            Some(session) => self.release(slot, session).await,
            None => self.retry_pending(slot).await,
        }
    }

    /// Tears `session` down and runs its store undo along with any pending one.
    async fn release(&self, slot: &mut SessionSlot, session: PeerSession) -> Result<()> {
        if let Some(undo) = session.shutdown().await {
            slot.pending.push(undo);
        }
        self.retry_pending(slot).await
    }

    async fn retry_pending(&self, slot: &mut SessionSlot) -> Result<()> {
        let mut first_error = None;
        let mut remaining = Vec::new();

        for mut undo in slot.pending.drain(..) {
            if let Err(e) = undo.run(&self.registry, &self.counter).await {
                warn!(room_id = %undo.room_id, "Store cleanup failed, will retry: {}", e);
                if first_error.is_none() {
                    first_error = Some(SessionError::from_store(e, &undo.room_id));
                }
                remaining.push(undo);
            }
        }

        slot.pending = remaining;
        first_error.map_or(Ok(()), Err)
    }

    pub async fn room_id(&self) -> Option<RoomId> {
        self.slot
            .lock()
            .await
            .current
            .as_ref()
            .and_then(|s| s.room_id.clone())
    }

    pub async fn role(&self) -> Option<Role> {
        self.slot.lock().await.current.as_ref().map(|s| s.role)
    }

    pub async fn is_broadcasting(&self) -> bool {
        self.role().await == Some(Role::Broadcaster)
    }

    pub async fn is_viewing(&self) -> bool {
        self.role().await == Some(Role::Viewer)
    }

    /// Offer/answer progress of the active session.
    pub async fn negotiation_state(&self) -> Option<NegotiationState> {
        let engine = self.slot.lock().await.current.as_ref()?.engine.clone();
        Some(engine.state().await)
    }

    /// State of the active session's peer connection.
    pub async fn connection_state(&self) -> Option<RTCPeerConnectionState> {
        let slot = self.slot.lock().await;
        slot.current.as_ref().map(|s| s.engine.connection_state())
    }

    /// Called with the room's viewer count: once on subscribe, then on every
    /// change, for whichever session is active.
    pub fn on_viewer_count_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.observers.viewer_count.register(callback)
    }

    /// Called each time a remote track is added to the viewer's media.
    pub fn on_remote_media<F>(&self, callback: F) -> Subscription
    where
        F: Fn(RemoteMedia) + Send + Sync + 'static,
    {
        self.observers.remote_media.register(callback)
    }

    pub fn on_session_ended<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SessionEnded) + Send + Sync + 'static,
    {
        self.observers.session_ended.register(callback)
    }

    /// Called with the room id when the peer transport fails or disconnects.
    pub fn on_transport_lost<F>(&self, callback: F) -> Subscription
    where
        F: Fn(RoomId) + Send + Sync + 'static,
    {
        self.observers.session_ended.register(move |ended| {
            if ended.reason == EndReason::TransportLost {
                callback(ended.room_id);
            }
        })
    }
}
