use crate::error::StoreError;
use crate::signaling::Subscription;
use crate::store::{RoomChange, SignalingStore};
use periscope_core::RoomId;
use std::sync::Arc;
use tracing::debug;

/// Per-room count of connected viewers, kept with the store's atomic
/// increment so concurrent joins and leaves never lose updates.
#[derive(Clone)]
pub struct ViewerCounter {
    store: Arc<dyn SignalingStore>,
}

impl ViewerCounter {
    pub fn new(store: Arc<dyn SignalingStore>) -> Self {
        Self { store }
    }

    pub async fn increment(&self, room_id: &RoomId) -> Result<u32, StoreError> {
        let count = self.store.adjust_viewers(room_id, 1).await?;
        debug!(room_id = %room_id, count, "Viewer count incremented");
        Ok(count)
    }

    /// Never goes below zero, even for duplicate or out-of-order decrements.
    pub async fn decrement(&self, room_id: &RoomId) -> Result<u32, StoreError> {
        let count = self.store.adjust_viewers(room_id, -1).await?;
        debug!(room_id = %room_id, count, "Viewer count decremented");
        Ok(count)
    }

    /// Delivers the current count, then the count after every change.
    pub async fn subscribe<F>(
        &self,
        room_id: &RoomId,
        mut on_count: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(u32) + Send + 'static,
    {
        let rx = self.store.watch_room(room_id).await?;
        let mut last = None;

        Ok(Subscription::spawn(rx, move |change| {
            let RoomChange::Updated(room) = change else {
                return;
            };
            if last != Some(room.viewer_count) {
                last = Some(room.viewer_count);
                on_count(room.viewer_count);
            }
        }))
    }
}
