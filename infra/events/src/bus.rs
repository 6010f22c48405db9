use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast buffer per event type.
/// Page signals are small and bursty; 128 covers a storm of mutations. Receivers that
/// fall further behind skip ahead (see [`crate::EventReceiverExt`]).
pub const CHANNEL_CAPACITY: usize = 128;

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

/// Handle returned by [`EventBus::listen`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An async receiver returned by [`EventBus::subscribe`].
pub type Receiver<T> = broadcast::Receiver<Arc<T>>;

struct Channel<T> {
    sender: broadcast::Sender<Arc<T>>,
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T: Event> Channel<T> {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, listeners: Vec::new() }
    }
}

/// Type-erased view used for operations that do not know `T`.
trait ErasedChannel: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

impl<T: Event> ErasedChannel for Channel<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }
}

#[derive(Default)]
struct BusInner {
    channels: RwLock<FxHashMap<TypeId, Box<dyn ErasedChannel>>>,
    owners: RwLock<FxHashMap<ListenerId, TypeId>>,
    next_listener: AtomicU64,
}

/// A thread-safe signal bus.
///
/// Channels are indexed by the [`TypeId`] of the event. Every channel offers two
/// kinds of subscription:
/// * **Listeners** ([`EventBus::listen`]) run inline inside [`EventBus::publish`], in
///   registration order, before `publish` returns. This mirrors how a page dispatches
///   custom events and is what widgets use to react to each other.
/// * **Receivers** ([`EventBus::subscribe`]) get a `tokio` broadcast receiver for
///   consumers that prefer to await signals.
///
/// Publishing never fails because nobody is listening: the returned count tells the
/// caller how many subscribers saw the event, and zero is a valid answer.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.inner.channels.read().len())
            .field("listeners", &self.inner.owners.read().len())
            .finish()
    }
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events of type `T` with an async receiver.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the channel registry is inconsistent.
    ///
    /// # Examples
    /// ```rust
    /// use ln_event_bus::{EventBus, EventReceiverExt};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct LocationChanged(String);
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), ln_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe::<LocationChanged>()?;
    /// bus.publish(LocationChanged("/docs".into()))?;
    /// assert_eq!(rx.recv_event().await.unwrap().0, "/docs");
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<T: Event>(&self) -> Result<Receiver<T>, EventBusError> {
        self.with_channel::<T, _>(|channel| channel.sender.subscribe())
    }

    /// Registers a synchronous listener for events of type `T`.
    ///
    /// The listener runs on the publishing thread, inside [`EventBus::publish`]. It may
    /// publish other events; it must not block.
    ///
    /// # Examples
    /// ```rust
    /// use ln_event_bus::EventBus;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// struct Ping;
    ///
    /// # fn main() -> Result<(), ln_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let counter = seen.clone();
    /// bus.listen::<Ping, _>(move |_| {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    /// })?;
    /// assert_eq!(bus.publish(Ping)?, 1);
    /// assert_eq!(seen.load(Ordering::SeqCst), 1);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the channel registry is inconsistent.
    pub fn listen<T, F>(&self, listener: F) -> Result<ListenerId, EventBusError>
    where
        T: Event,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.with_channel::<T, _>(|channel| {
            channel.listeners.push((id, Arc::new(listener)));
        })?;
        self.inner.owners.write().insert(id, TypeId::of::<T>());
        trace!(event = std::any::type_name::<T>(), ?id, "Listener registered");
        Ok(id)
    }

    /// Removes a listener registered with [`EventBus::listen`].
    ///
    /// Returns `false` when the listener was already removed or never existed.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        let Some(type_id) = self.inner.owners.write().remove(&id) else {
            return false;
        };
        self.inner
            .channels
            .write()
            .get_mut(&type_id)
            .is_some_and(|channel| channel.remove_listener(id))
    }

    /// Returns how many listeners and receivers would observe an event of type `T`.
    #[must_use]
    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.inner
            .channels
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|channel| channel.as_any().downcast_ref::<Channel<T>>())
            .map_or(0, |channel| channel.listeners.len() + channel.sender.receiver_count())
    }

    /// Publishes an event to every listener and receiver of `T`.
    ///
    /// Returns the number of subscribers that observed the event.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the channel registry is inconsistent.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes a shared event instance without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the channel registry is inconsistent.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let snapshot = {
            let channels = self.inner.channels.read();
            match channels.get(&TypeId::of::<T>()) {
                None => None,
                Some(channel) => {
                    let channel = downcast_ref::<T>(&**channel)?;
                    let listeners: Vec<Listener<T>> =
                        channel.listeners.iter().map(|(_, listener)| listener.clone()).collect();
                    Some((listeners, channel.sender.clone()))
                },
            }
        };

        let Some((listeners, sender)) = snapshot else {
            trace!(event = std::any::type_name::<T>(), "Event dropped: no active subscribers");
            return Ok(0);
        };

        for listener in &listeners {
            listener(&event);
        }
        let received = sender.send(event).unwrap_or(0);
        let count = listeners.len() + received;

        if count == 0 {
            trace!(event = std::any::type_name::<T>(), "Event dropped: no active subscribers");
        } else {
            trace!(event = std::any::type_name::<T>(), count, "Event dispatched");
        }
        Ok(count)
    }

    fn with_channel<T: Event, R>(&self, f: impl FnOnce(&mut Channel<T>) -> R) -> Result<R, EventBusError> {
        let mut channels = self.inner.channels.write();
        let entry = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            trace!(event = std::any::type_name::<T>(), "Initializing new event channel");
            Box::new(Channel::<T>::new())
        });

        let channel = entry.as_any_mut().downcast_mut::<Channel<T>>().ok_or_else(|| {
            EventBusError::TypeMismatch {
                message: std::any::type_name::<T>().into(),
                context: Some("Unexpected event type".into()),
            }
        })?;

        Ok(f(channel))
    }
}

fn downcast_ref<T: Event>(channel: &dyn ErasedChannel) -> Result<&Channel<T>, EventBusError> {
    channel.as_any().downcast_ref::<Channel<T>>().ok_or_else(|| EventBusError::TypeMismatch {
        message: std::any::type_name::<T>().into(),
        context: Some("Unexpected event type".into()),
    })
}
