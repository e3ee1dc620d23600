use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use webrtc::track::track_remote::TrackRemote;

struct RemoteMediaInner {
    tracks: Mutex<Vec<Arc<TrackRemote>>>,
    released: AtomicBool,
    track_count: watch::Sender<usize>,
}

/// Inbound tracks of a viewer session. Cloning shares the same track list;
/// the owning session releases it on teardown.
#[derive(Clone)]
pub struct RemoteMedia {
    inner: Arc<RemoteMediaInner>,
}

impl RemoteMedia {
    pub(crate) fn new() -> Self {
        let (track_count, _) = watch::channel(0);
        Self {
            inner: Arc::new(RemoteMediaInner {
                tracks: Mutex::new(Vec::new()),
                released: AtomicBool::new(false),
                track_count,
            }),
        }
    }

    pub fn tracks(&self) -> Vec<Arc<TrackRemote>> {
        self.lock_tracks().clone()
    }

    pub fn track_count(&self) -> usize {
        self.lock_tracks().len()
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    /// Waits until at least one track has arrived. `false` on timeout or if
    /// the media was released first.
    pub async fn wait_for_track(&self, timeout: Duration) -> bool {
        let mut rx = self.inner.track_count.subscribe();
        let arrived = rx.wait_for(|count| *count > 0 || self.is_released());

        match tokio::time::timeout(timeout, arrived).await {
            Ok(Ok(_)) => !self.is_released() && self.track_count() > 0,
            _ => false,
        }
    }

    /// Returns `false` once the media has been released.
    pub(crate) fn add_track(&self, track: Arc<TrackRemote>) -> bool {
        if self.is_released() {
            return false;
        }
        let count = {
            let mut tracks = self.lock_tracks();
            tracks.push(track);
            tracks.len()
        };
        self.inner.track_count.send_replace(count);
        true
    }

    pub(crate) fn release(&self) {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lock_tracks().clear();
        self.inner.track_count.send_replace(0);
    }

    fn lock_tracks(&self) -> std::sync::MutexGuard<'_, Vec<Arc<TrackRemote>>> {
        self.inner
            .tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("tracks", &self.track_count())
            .field("released", &self.is_released())
            .finish()
    }
}
