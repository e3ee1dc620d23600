use crate::media::RemoteMedia;
use crate::session::session_event::SessionEnded;
use crate::signaling::Subscription;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Entry<T> {
    callback: Callback<T>,
    gate: Arc<Gate>,
}

type CallbackMap<T> = Arc<Mutex<HashMap<u64, Entry<T>>>>;

/// Held for the length of one delivery; `closed` is checked under it.
#[derive(Default)]
struct Gate {
    delivery: Mutex<()>,
    closed: AtomicBool,
}

thread_local! {
    /// Gates this thread is currently delivering through.
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn gate_key(gate: &Arc<Gate>) -> usize {
    Arc::as_ptr(gate) as usize
}

struct DeliveryMark(usize);

impl DeliveryMark {
    fn enter(key: usize) -> Self {
        DELIVERING.with(|d| d.borrow_mut().push(key));
        Self(key)
    }
}

impl Drop for DeliveryMark {
    fn drop(&mut self) {
        DELIVERING.with(|d| {
            let mut d = d.borrow_mut();
            if let Some(pos) = d.iter().rposition(|k| *k == self.0) {
                d.remove(pos);
            }
        });
    }
}

impl Gate {
    fn deliver(&self, key: usize, f: impl FnOnce()) {
        let _held = lock(&self.delivery);
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _mark = DeliveryMark::enter(key);
        f();
    }

    /// Closes the gate and waits out a delivery running on another thread.
    fn close(self: &Arc<Self>) {
        self.closed.store(true, Ordering::SeqCst);
        let key = gate_key(self);
        let own_delivery = DELIVERING.with(|d| d.borrow().contains(&key));
        if !own_delivery {
            drop(lock(&self.delivery));
        }
    }
}

/// Callbacks registered by the presentation layer.
///
/// Callbacks run outside the set's lock, so a callback may register new
/// observers or drop its own [`Subscription`]. An observer registered during
/// delivery sees the next value, not the current one. Once `unsubscribe`
/// returns the callback is not running on another thread and will not run
/// again.
pub(crate) struct ObserverSet<T> {
    next_id: AtomicU64,
    callbacks: CallbackMap<T>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Clone + 'static> ObserverSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            callbacks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn register<F>(&self, callback: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let gate = Arc::new(Gate::default());
        lock(&self.callbacks).insert(
            id,
            Entry {
                callback: Arc::new(callback),
                gate: gate.clone(),
            },
        );

        let callbacks = Arc::downgrade(&self.callbacks);
        Subscription::from_fn(move || {
            if let Some(callbacks) = callbacks.upgrade() {
                lock(&callbacks).remove(&id);
            }
            gate.close();
        })
    }

    pub(crate) fn emit(&self, value: T) {
        let snapshot: Vec<(Callback<T>, Arc<Gate>)> = lock(&self.callbacks)
            .values()
            .map(|entry| (entry.callback.clone(), entry.gate.clone()))
            .collect();

        for (callback, gate) in snapshot {
            let v = value.clone();
            gate.deliver(gate_key(&gate), || callback(v));
        }
    }
}

pub(crate) struct SessionObservers {
    pub(crate) viewer_count: ObserverSet<u32>,
    pub(crate) remote_media: ObserverSet<RemoteMedia>,
    pub(crate) session_ended: ObserverSet<SessionEnded>,
}

impl SessionObservers {
    pub(crate) fn new() -> Self {
        Self {
            viewer_count: ObserverSet::new(),
            remote_media: ObserverSet::new(),
            session_ended: ObserverSet::new(),
        }
    }
}
