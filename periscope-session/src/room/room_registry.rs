use crate::error::StoreError;
use crate::signaling::Subscription;
use crate::store::{RoomChange, SignalingStore};
use periscope_core::{Room, RoomId, SessionDescription};
use std::sync::Arc;
use tracing::info;

/// Data-access boundary for room documents.
#[derive(Clone)]
pub struct RoomRegistry {
    store: Arc<dyn SignalingStore>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn SignalingStore>) -> Self {
        Self { store }
    }

    /// Persists a new room holding `offer` with no viewers.
    pub async fn create(&self, offer: SessionDescription) -> Result<RoomId, StoreError> {
        let room = Room::with_offer(RoomId::new(), offer);
        let room_id = room.id.clone();

        self.store.insert_room(room).await?;
        info!(room_id = %room_id, "Room created");
        Ok(room_id)
    }

    /// `StoreError::NotFound` means the room ended or never existed.
    pub async fn get(&self, room_id: &RoomId) -> Result<Room, StoreError> {
        self.store.get_room(room_id).await
    }

    /// Fills the single answer slot. `Conflict` if another viewer got there first.
    pub async fn set_answer(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> Result<(), StoreError> {
        self.store.set_answer_if_empty(room_id, answer).await
    }

    /// Withdraws `answer` from the room if it is still the stored one.
    pub async fn clear_answer(
        &self,
        room_id: &RoomId,
        answer: &SessionDescription,
    ) -> Result<(), StoreError> {
        self.store.clear_answer_if(room_id, answer).await?;
        info!(room_id = %room_id, "Answer withdrawn");
        Ok(())
    }

    pub async fn delete(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.store.delete_room(room_id).await?;
        info!(room_id = %room_id, "Room deleted");
        Ok(())
    }

    /// Pushes every full room state to `on_change`, ending with
    /// `RoomChange::Deleted` if the room goes away while subscribed.
    pub async fn subscribe<F>(
        &self,
        room_id: &RoomId,
        on_change: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(RoomChange) + Send + 'static,
    {
        let rx = self.store.watch_room(room_id).await?;
        Ok(Subscription::spawn(rx, on_change))
    }
}
