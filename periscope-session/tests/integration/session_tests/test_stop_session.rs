use periscope_session::{SessionError, SignalingStore};

use crate::utils::{controller, init_tracing, memory_store, test_media};

#[tokio::test]
async fn test_stop_without_session_is_noop() {
    init_tracing();

    let store = memory_store();
    let idle = controller(&store);

    idle.stop_session().await.expect("Stop with no session");
    idle.stop_session().await.expect("Second stop");
    assert_eq!(idle.role().await, None);
}

#[tokio::test]
async fn test_stop_twice_decrements_once() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    let viewer = controller(&store);

    let room_id = broadcaster.create_room(test_media()).await.unwrap();
    viewer.join_room(&room_id).await.unwrap();

    // Another viewer counted on some other device.
    store.adjust_viewers(&room_id, 1).await.unwrap();
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 2);

    viewer.stop_session().await.expect("First stop");
    viewer.stop_session().await.expect("Second stop");
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 1);

    broadcaster.stop_session().await.unwrap();
    broadcaster.stop_session().await.unwrap();
    assert_eq!(store.room_count(), 0);
}

#[tokio::test]
async fn test_failed_room_delete_is_retried() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    broadcaster.create_room(test_media()).await.unwrap();

    store.set_available(false);
    let result = broadcaster.stop_session().await;
    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
    assert!(!broadcaster.is_broadcasting().await, "Local side is released anyway");
    assert_eq!(store.room_count(), 1);

    store.set_available(true);
    broadcaster.stop_session().await.expect("Retried stop");
    assert_eq!(store.room_count(), 0);
}

#[tokio::test]
async fn test_failed_viewer_leave_is_retried() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    let viewer = controller(&store);

    let room_id = broadcaster.create_room(test_media()).await.unwrap();
    viewer.join_room(&room_id).await.unwrap();
    store.adjust_viewers(&room_id, 1).await.unwrap();

    store.set_available(false);
    assert!(viewer.stop_session().await.is_err());
    assert!(!viewer.is_viewing().await);

    store.set_available(true);
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 2);

    viewer.stop_session().await.expect("Retried stop");
    viewer.stop_session().await.expect("Nothing left to retry");
    assert_eq!(store.get_room(&room_id).await.unwrap().viewer_count, 1);

    broadcaster.stop_session().await.unwrap();
}

#[tokio::test]
async fn test_next_broadcast_finishes_failed_delete() {
    init_tracing();

    let store = memory_store();
    let broadcaster = controller(&store);
    let first = broadcaster.create_room(test_media()).await.unwrap();

    store.set_available(false);
    assert!(broadcaster.stop_session().await.is_err());
    store.set_available(true);

    let second = broadcaster.create_room(test_media()).await.unwrap();
    assert!(store.get_room(&first).await.is_err(), "Stale room is cleaned up");
    assert_eq!(store.room_count(), 1);

    broadcaster.stop_session().await.unwrap();
    assert!(store.get_room(&second).await.is_err());
    assert_eq!(store.room_count(), 0);
}
