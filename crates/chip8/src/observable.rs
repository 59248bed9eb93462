use std::sync::{
    mpsc::{sync_channel, Receiver, SyncSender, TrySendError},
    Mutex, MutexGuard, PoisonError,
};

/// Values a subscriber may fall behind by before new ones are dropped for it.
pub const SUBSCRIBER_CAPACITY: usize = 64;

/// A value that can be polled for its latest state or subscribed to.
///
/// Publishing never blocks: a subscriber whose channel is full misses
/// values, and subscribers whose receiver was dropped are forgotten.
pub struct Observable<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    value: T,
    subscribers: Vec<SyncSender<T>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value,
                subscribers: Vec::new(),
            }),
        }
    }

    /// The latest published value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Store `value` and push it to every subscriber.
    pub fn publish(&self, value: T) {
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|subscriber| match subscriber.try_send(value.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
        inner.value = value;
    }

    /// Receive every value published from now on.
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = sync_channel(SUBSCRIBER_CAPACITY);
        self.lock().subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
