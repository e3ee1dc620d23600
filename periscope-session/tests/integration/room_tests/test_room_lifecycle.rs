use std::sync::Arc;

use periscope_core::SessionDescription;
use periscope_session::{RoomChange, RoomRegistry, SignalingStore, StoreError};

use crate::utils::{OBSERVER_TIMEOUT_MS, Recorder, init_tracing, memory_store};

#[tokio::test]
async fn test_room_lifecycle() {
    init_tracing();

    let store = memory_store();
    let dyn_store: Arc<dyn SignalingStore> = store.clone();
    let registry = RoomRegistry::new(dyn_store);

    let room_id = registry
        .create(SessionDescription::offer("v=0 offer"))
        .await
        .expect("Failed to create room");

    let room = registry.get(&room_id).await.expect("Room should exist");
    assert_eq!(room.offer, Some(SessionDescription::offer("v=0 offer")));
    assert_eq!(room.answer, None);
    assert_eq!(room.viewer_count, 0);

    let changes = Recorder::new();
    let _sub = registry
        .subscribe(&room_id, changes.callback())
        .await
        .expect("Failed to subscribe");

    registry
        .set_answer(&room_id, SessionDescription::answer("v=0 first"))
        .await
        .expect("First answer should be accepted");
    let second = registry
        .set_answer(&room_id, SessionDescription::answer("v=0 second"))
        .await;
    assert_eq!(second, Err(StoreError::Conflict));

    let stored = registry.get(&room_id).await.unwrap();
    assert_eq!(stored.answer, Some(SessionDescription::answer("v=0 first")));

    registry.delete(&room_id).await.expect("Failed to delete room");
    registry
        .delete(&room_id)
        .await
        .expect("Deleting twice should succeed");

    assert!(
        changes
            .wait_for_last(RoomChange::Deleted, OBSERVER_TIMEOUT_MS)
            .await,
        "Subscriber should observe the deletion"
    );
    assert_eq!(registry.get(&room_id).await, Err(StoreError::NotFound));
    assert_eq!(store.room_count(), 0);
}
