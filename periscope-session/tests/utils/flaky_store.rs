use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use periscope_core::{
    CandidateDirection, IceCandidatePayload, IceCandidateRecord, Room, RoomId, SessionDescription,
};
use periscope_session::{MemoryStore, RoomChange, SignalingStore, StoreError};
use tokio::sync::mpsc;

/// A `MemoryStore` whose viewer count writes fail a set number of times,
/// as if the connection dropped between two writes of one join.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    viewer_failures: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            viewer_failures: AtomicU32::new(0),
        }
    }

    /// Makes the next `n` viewer count adjustments fail with `Unavailable`.
    pub fn fail_viewer_updates(&self, n: u32) {
        self.viewer_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignalingStore for FlakyStore {
    async fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        self.inner.insert_room(room).await
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, StoreError> {
        self.inner.get_room(room_id).await
    }

    async fn set_answer_if_empty(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> Result<(), StoreError> {
        self.inner.set_answer_if_empty(room_id, answer).await
    }

    async fn clear_answer_if(
        &self,
        room_id: &RoomId,
        answer: &SessionDescription,
    ) -> Result<(), StoreError> {
        self.inner.clear_answer_if(room_id, answer).await
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.inner.delete_room(room_id).await
    }

    async fn adjust_viewers(&self, room_id: &RoomId, delta: i64) -> Result<u32, StoreError> {
        let failed = self
            .viewer_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.adjust_viewers(room_id, delta).await
    }

    async fn watch_room(
        &self,
        room_id: &RoomId,
    ) -> Result<mpsc::UnboundedReceiver<RoomChange>, StoreError> {
        self.inner.watch_room(room_id).await
    }

    async fn append_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        payload: IceCandidatePayload,
    ) -> Result<u64, StoreError> {
        self.inner.append_candidate(room_id, direction, payload).await
    }

    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> Result<mpsc::UnboundedReceiver<IceCandidateRecord>, StoreError> {
        self.inner.watch_candidates(room_id, direction).await
    }
}
