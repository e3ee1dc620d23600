use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use periscope_core::{Room, RoomId, SessionDescription};
use periscope_session::{LocalMedia, MemoryStore, SessionConfig, SessionController, SignalingStore};
use tracing::Level;

/// Timeout for store notifications to reach observers (ms).
pub const OBSERVER_TIMEOUT_MS: u64 = 2000;

/// Timeout for two loopback peers to connect or notice a disconnect (ms).
pub const CONNECTION_TIMEOUT_MS: u64 = 15000;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// A controller over any store implementation.
pub fn controller_over(store: Arc<dyn SignalingStore>) -> SessionController {
    SessionController::new(store, SessionConfig::local_only())
}

/// Polls `check` until it returns true or `timeout_ms` passes.
pub async fn eventually<F, Fut>(timeout_ms: u64, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if check().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// A controller without ICE servers, so tests never leave the host.
pub fn controller(store: &Arc<MemoryStore>) -> SessionController {
    controller_over(store.clone())
}

pub fn test_media() -> LocalMedia {
    LocalMedia::audio_video("test-stream")
}

/// Inserts a room holding a placeholder offer, bypassing the controller.
pub async fn insert_room(store: &MemoryStore) -> RoomId {
    let id = RoomId::new();
    store
        .insert_room(Room::with_offer(id.clone(), SessionDescription::offer("v=0")))
        .await
        .expect("Failed to insert room");
    id
}
