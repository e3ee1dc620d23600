use std::sync::Arc;

use futures::future::join_all;
use periscope_session::{SignalingStore, ViewerCounter};

use crate::utils::{OBSERVER_TIMEOUT_MS, Recorder, init_tracing, insert_room, memory_store};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_viewer_count_interleaving() {
    init_tracing();

    let store = memory_store();
    let room_id = insert_room(&store).await;
    let dyn_store: Arc<dyn SignalingStore> = store.clone();
    let counter = ViewerCounter::new(dyn_store);

    let counts = Recorder::new();
    let _sub = counter
        .subscribe(&room_id, counts.callback())
        .await
        .expect("Failed to subscribe");

    // 20 joins, then 10 more joins racing 10 leaves.
    let joins = (0..20).map(|_| {
        let counter = counter.clone();
        let room_id = room_id.clone();
        tokio::spawn(async move { counter.increment(&room_id).await })
    });
    for result in join_all(joins).await {
        result.unwrap().expect("Increment failed");
    }

    let mixed = (0..20).map(|i| {
        let counter = counter.clone();
        let room_id = room_id.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                counter.increment(&room_id).await
            } else {
                counter.decrement(&room_id).await
            }
        })
    });
    for result in join_all(mixed).await {
        result.unwrap().expect("Update failed");
    }

    let room = store.get_room(&room_id).await.unwrap();
    assert_eq!(room.viewer_count, 20, "No update may be lost");
    assert!(counts.wait_for_last(20, OBSERVER_TIMEOUT_MS).await);

    // Extra leaves never push the count negative.
    for _ in 0..25 {
        counter.decrement(&room_id).await.unwrap();
    }
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 0);
    assert!(counts.wait_for_last(0, OBSERVER_TIMEOUT_MS).await);
    assert_eq!(counts.values().first(), Some(&0));
}
