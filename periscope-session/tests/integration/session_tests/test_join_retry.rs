use std::sync::Arc;

use periscope_session::{SessionError, SignalingStore};

use crate::utils::{FlakyStore, controller, controller_over, init_tracing, memory_store, test_media};

#[tokio::test]
async fn test_join_retries_after_count_write_fails() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    let flaky = Arc::new(FlakyStore::new(store.clone()));
    let viewer = controller_over(flaky.clone());

    let room_id = broadcaster.create_room(test_media()).await.unwrap();

    flaky.fail_viewer_updates(1);
    let first = viewer.join_room(&room_id).await;
    match &first {
        Err(e @ SessionError::StoreUnavailable(_)) => assert!(e.is_retryable()),
        other => panic!("Expected StoreUnavailable, got {:?}", other.as_ref().map(|_| ())),
    }
    assert!(!viewer.is_viewing().await);

    let room = store.get_room(&room_id).await.unwrap();
    assert!(room.answer.is_none(), "The half-finished join frees the answer slot");
    assert_eq!(room.viewer_count, 0);

    viewer
        .join_room(&room_id)
        .await
        .expect("Retry after a retryable error should succeed");
    assert!(viewer.is_viewing().await);

    let room = store.get_room(&room_id).await.unwrap();
    assert!(room.answer.is_some());
    assert_eq!(room.viewer_count, 1);

    viewer.stop_session().await.unwrap();
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 0);
    broadcaster.stop_session().await.unwrap();
}

#[tokio::test]
async fn test_failed_join_keeps_another_viewers_answer() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    let viewer = controller(&store);
    let late = controller(&store);

    let room_id = broadcaster.create_room(test_media()).await.unwrap();
    viewer.join_room(&room_id).await.unwrap();
    let answer = store.get_room(&room_id).await.unwrap().answer;

    let result = late.join_room(&room_id).await;
    assert!(matches!(result, Err(SessionError::RoomAlreadyHasViewer(_))));

    let room = store.get_room(&room_id).await.unwrap();
    assert_eq!(room.answer, answer, "A rejected join leaves the slot as it was");
    assert_eq!(room.viewer_count, 1);

    viewer.stop_session().await.unwrap();
    broadcaster.stop_session().await.unwrap();
}
