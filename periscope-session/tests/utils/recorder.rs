use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Collects every value an observer callback receives.
#[derive(Clone)]
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback that appends to this recorder.
    pub fn callback(&self) -> impl Fn(T) + Send + Sync + 'static {
        let values = self.values.clone();
        move |value| values.lock().unwrap().push(value)
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    /// Polls until `predicate` holds for the recorded values.
    pub async fn wait_until<F>(&self, timeout_ms: u64, predicate: F) -> bool
    where
        F: Fn(&[T]) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        loop {
            if predicate(&self.values.lock().unwrap()) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl<T: PartialEq + Clone + Send + 'static> Recorder<T> {
    /// Waits until the most recent value equals `expected`.
    pub async fn wait_for_last(&self, expected: T, timeout_ms: u64) -> bool {
        self.wait_until(timeout_ms, |values| values.last() == Some(&expected))
            .await
    }
}
