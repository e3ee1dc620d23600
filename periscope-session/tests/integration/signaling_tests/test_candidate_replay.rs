use std::sync::Arc;
use std::time::Duration;

use periscope_core::{CandidateDirection, IceCandidatePayload};
use periscope_session::{CandidateRelay, SignalingStore};

use crate::utils::{OBSERVER_TIMEOUT_MS, Recorder, init_tracing, insert_room, memory_store};

fn candidate(port: u16) -> IceCandidatePayload {
    IceCandidatePayload::new(format!(
        "candidate:{port} 1 udp 2130706431 192.168.1.10 {port} typ host"
    ))
}

#[tokio::test]
async fn test_candidate_published_before_subscribe_is_delivered() {
    init_tracing();

    let store = memory_store();
    let room_id = insert_room(&store).await;
    let dyn_store: Arc<dyn SignalingStore> = store.clone();
    let relay = CandidateRelay::new(dyn_store);

    relay
        .publish(&room_id, CandidateDirection::Broadcaster, candidate(5000))
        .await
        .unwrap();
    relay
        .publish(&room_id, CandidateDirection::Broadcaster, candidate(5001))
        .await
        .unwrap();

    let received = Recorder::new();
    let mut sub = relay
        .subscribe(&room_id, CandidateDirection::Broadcaster, received.callback())
        .await
        .expect("Failed to subscribe");

    assert!(
        received
            .wait_until(OBSERVER_TIMEOUT_MS, |values| values.len() == 2)
            .await,
        "Late subscriber should see earlier candidates"
    );
    assert_eq!(received.values(), vec![candidate(5000), candidate(5001)]);

    relay
        .publish(&room_id, CandidateDirection::Broadcaster, candidate(5002))
        .await
        .unwrap();
    assert!(received.wait_for_last(candidate(5002), OBSERVER_TIMEOUT_MS).await);

    sub.unsubscribe();
    relay
        .publish(&room_id, CandidateDirection::Broadcaster, candidate(5003))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(received.len(), 3, "No delivery after unsubscribe");
}

#[tokio::test]
async fn test_directions_do_not_mix() {
    init_tracing();

    let store = memory_store();
    let room_id = insert_room(&store).await;
    let dyn_store: Arc<dyn SignalingStore> = store.clone();
    let relay = CandidateRelay::new(dyn_store);

    let from_viewer = Recorder::new();
    let _sub = relay
        .subscribe(&room_id, CandidateDirection::Viewer, from_viewer.callback())
        .await
        .unwrap();

    relay
        .publish(&room_id, CandidateDirection::Broadcaster, candidate(6000))
        .await
        .unwrap();
    relay
        .publish(&room_id, CandidateDirection::Viewer, candidate(6001))
        .await
        .unwrap();

    assert!(from_viewer.wait_for_last(candidate(6001), OBSERVER_TIMEOUT_MS).await);
    assert_eq!(from_viewer.values(), vec![candidate(6001)]);
    assert_eq!(
        store.candidate_count(&room_id, CandidateDirection::Broadcaster),
        1
    );
}
