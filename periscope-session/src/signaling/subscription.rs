use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a live observer registration.
///
/// `unsubscribe` is synchronous: once it returns, the callback will not run
/// again. Dropping the handle unsubscribes as well. A callback driven by
/// [`Subscription::spawn`] must not unsubscribe its own handle.
pub struct Subscription {
    gate: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

fn lock_gate(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Subscription {
    /// Drives `callback` with every item from `rx` on a background task.
    pub(crate) fn spawn<T, F>(mut rx: mpsc::UnboundedReceiver<T>, mut callback: F) -> Self
    where
        T: Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let gate = Arc::new(Mutex::new(true));
        let task_gate = gate.clone();

        let task = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                let open = lock_gate(&task_gate);
                if !*open {
                    break;
                }
                callback(item);
            }
        });

        Self {
            gate,
            task: Some(task),
            on_cancel: None,
        }
    }

    /// A registration whose teardown is a plain closure.
    pub(crate) fn from_fn(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            gate: Arc::new(Mutex::new(true)),
            task: None,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    pub fn is_active(&self) -> bool {
        *lock_gate(&self.gate)
    }

    pub fn unsubscribe(&mut self) {
        *lock_gate(&self.gate) = false;

        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
