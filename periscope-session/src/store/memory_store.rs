use crate::error::StoreError;
use crate::store::signaling_store::{RoomChange, SignalingStore};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use periscope_core::{
    CandidateDirection, IceCandidatePayload, IceCandidateRecord, Room, RoomId, SessionDescription,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
struct CandidateLog {
    records: Vec<IceCandidateRecord>,
    watchers: Vec<mpsc::UnboundedSender<IceCandidateRecord>>,
}

struct RoomEntry {
    room: Room,
    watchers: Vec<mpsc::UnboundedSender<RoomChange>>,
    candidates: HashMap<CandidateDirection, CandidateLog>,
}

impl RoomEntry {
    fn notify(&mut self) {
        let change = RoomChange::Updated(self.room.clone());
        self.watchers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// In-process store. Every operation runs under the dashmap shard lock of its
/// room, which is what makes the conditional answer write and the counter
/// atomic.
pub struct MemoryStore {
    rooms: DashMap<RoomId, RoomEntry>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates losing (or regaining) the connection to the backing store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn candidate_count(&self, room_id: &RoomId, direction: CandidateDirection) -> usize {
        self.rooms
            .get(room_id)
            .and_then(|entry| entry.candidates.get(&direction).map(|log| log.records.len()))
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_owned()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingStore for MemoryStore {
    async fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        self.check_available()?;

        match self.rooms.entry(room.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                debug!(room_id = %room.id, "Room document created");
                slot.insert(RoomEntry {
                    room,
                    watchers: Vec::new(),
                    candidates: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, StoreError> {
        self.check_available()?;

        self.rooms
            .get(room_id)
            .map(|entry| entry.room.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn set_answer_if_empty(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        if entry.room.answer.is_some() {
            return Err(StoreError::Conflict);
        }
        entry.room.answer = Some(answer);
        entry.notify();
        Ok(())
    }

    async fn clear_answer_if(
        &self,
        room_id: &RoomId,
        answer: &SessionDescription,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        if entry.room.answer.as_ref() != Some(answer) {
            return Ok(());
        }
        entry.room.answer = None;
        debug!(room_id = %room_id, "Answer slot cleared");
        entry.notify();
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.check_available()?;

        let Some((_, entry)) = self.rooms.remove(room_id) else {
            return Ok(());
        };
        debug!(room_id = %room_id, "Room document deleted");

        for tx in entry.watchers {
            let _ = tx.send(RoomChange::Deleted);
        }
        // Candidate watchers end when their senders drop with the entry.
        Ok(())
    }

    async fn adjust_viewers(&self, room_id: &RoomId, delta: i64) -> Result<u32, StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        let next = (i64::from(entry.room.viewer_count) + delta).clamp(0, i64::from(u32::MAX));
        entry.room.viewer_count = next as u32;
        entry.notify();
        Ok(entry.room.viewer_count)
    }

    async fn watch_room(
        &self,
        room_id: &RoomId,
    ) -> Result<mpsc::UnboundedReceiver<RoomChange>, StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(RoomChange::Updated(entry.room.clone()));
        entry.watchers.push(tx);
        Ok(rx)
    }

    async fn append_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        payload: IceCandidatePayload,
    ) -> Result<u64, StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        let log = entry.candidates.entry(direction).or_default();

        let record = IceCandidateRecord {
            room_id: room_id.clone(),
            direction,
            payload,
            sequence: log.records.len() as u64,
        };
        log.watchers.retain(|tx| tx.send(record.clone()).is_ok());
        log.records.push(record.clone());

        Ok(record.sequence)
    }

    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> Result<mpsc::UnboundedReceiver<IceCandidateRecord>, StoreError> {
        self.check_available()?;

        let mut entry = self.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        let log = entry.candidates.entry(direction).or_default();

        let (tx, rx) = mpsc::unbounded_channel();
        for record in &log.records {
            let _ = tx.send(record.clone());
        }
        log.watchers.push(tx);
        Ok(rx)
    }
}
