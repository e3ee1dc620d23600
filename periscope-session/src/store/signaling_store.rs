use crate::error::StoreError;
use async_trait::async_trait;
use periscope_core::{
    CandidateDirection, IceCandidatePayload, IceCandidateRecord, Room, RoomId, SessionDescription,
};
use tokio::sync::mpsc;

/// One observed state of a room document.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomChange {
    Updated(Room),
    /// The room was deleted. Always the last item on a watch stream.
    Deleted,
}

/// The shared, eventually-consistent document store used as the signaling
/// channel. Implementations must make every operation atomic per document;
/// no cross-document transactions are needed.
#[async_trait]
pub trait SignalingStore: Send + Sync {
    async fn insert_room(&self, room: Room) -> Result<(), StoreError>;

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, StoreError>;

    /// Writes the answer only if the slot is empty, otherwise `Conflict`.
    async fn set_answer_if_empty(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> Result<(), StoreError>;

    /// Empties the answer slot only while it still holds `answer`. An answer
    /// written by someone else is left alone.
    async fn clear_answer_if(
        &self,
        room_id: &RoomId,
        answer: &SessionDescription,
    ) -> Result<(), StoreError>;

    /// Deleting a missing room succeeds.
    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// Atomically adds `delta` to the viewer count, clamping at zero, and
    /// returns the new value.
    async fn adjust_viewers(&self, room_id: &RoomId, delta: i64) -> Result<u32, StoreError>;

    /// Streams the current room state, then every later state, then
    /// `RoomChange::Deleted` once the room is gone.
    async fn watch_room(
        &self,
        room_id: &RoomId,
    ) -> Result<mpsc::UnboundedReceiver<RoomChange>, StoreError>;

    /// Appends a candidate and returns its sequence number.
    async fn append_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        payload: IceCandidatePayload,
    ) -> Result<u64, StoreError>;

    /// Streams every candidate stored under the room/direction pair, starting
    /// from the first one ever appended.
    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> Result<mpsc::UnboundedReceiver<IceCandidateRecord>, StoreError>;
}
