use crate::error::StoreError;
use crate::signaling::subscription::Subscription;
use crate::store::SignalingStore;
use periscope_core::{CandidateDirection, IceCandidatePayload, RoomId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Trickle ICE over the store's per-room candidate collections.
///
/// Delivery is unordered and at-least-once from the store's point of view;
/// each subscriber filters by sequence number so it sees every record once.
#[derive(Clone)]
pub struct CandidateRelay {
    store: Arc<dyn SignalingStore>,
}

impl CandidateRelay {
    pub fn new(store: Arc<dyn SignalingStore>) -> Self {
        Self { store }
    }

    /// Appends a candidate. Publishing the same candidate twice is allowed.
    pub async fn publish(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        candidate: IceCandidatePayload,
    ) -> Result<(), StoreError> {
        let sequence = self
            .store
            .append_candidate(room_id, direction, candidate)
            .await?;
        debug!(room_id = %room_id, %direction, sequence, "ICE candidate published");
        Ok(())
    }

    /// Delivers every candidate ever published under `room_id`/`direction`,
    /// including ones published before this call.
    pub async fn subscribe<F>(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        mut on_candidate: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(IceCandidatePayload) + Send + 'static,
    {
        let rx = self.store.watch_candidates(room_id, direction).await?;
        let mut seen = HashSet::new();

        Ok(Subscription::spawn(rx, move |record| {
            if seen.insert(record.sequence) {
                on_candidate(record.payload);
            }
        }))
    }
}
