use crate::error::{EnhancerError, EnhancerErrorExt};
use fxhash::FxHashMap;
use ln_ajax::{NavigationController, Transport};
use ln_dom::{Document, DocumentId, Url};
use ln_domain::config::EnhancerConfig;
use ln_domain::signals::{LocationCause, LocationChanged};
use ln_event_bus::{EventBus, EventBusError, ListenerId, Receiver};
use ln_lifecycle::MutationWatcher;
use ln_nav::ActiveLinkTracker;
use ln_toast::ToastStack;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock, Weak};
use tracing::{debug, info};

/// A live enhancer, erased over its transport type.
trait Installed: Send + Sync {
    fn is_alive(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Transport> Installed for Weak<EnhancerInner<T>> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One enhancer per document, for as long as a handle to it is alive.
static INSTALLED: LazyLock<Mutex<FxHashMap<DocumentId, Box<dyn Installed>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

struct EnhancerInner<T> {
    document: Document,
    bus: EventBus,
    watcher: MutationWatcher,
    controller: NavigationController<T>,
    tracker: ActiveLinkTracker,
    toasts: ToastStack,
    listeners: Vec<ListenerId>,
}

impl<T> Drop for EnhancerInner<T> {
    fn drop(&mut self) {
        self.watcher.stop();
        for id in &self.listeners {
            self.bus.unlisten(*id);
        }
        debug!(document = ?self.document.id(), "Enhancer uninstalled");
    }
}

/// Every enhancer wired to one document and one signal bus.
///
/// [`Enhancer::install`] is idempotent per document: while any handle is alive, installing
/// again returns that handle. Dropping the last handle stops the mutation watcher and
/// removes the bus listeners; bindings already in place stay inert.
pub struct Enhancer<T> {
    inner: Arc<EnhancerInner<T>>,
}

impl<T> Clone for Enhancer<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: Transport> Enhancer<T> {
    /// Installs with a fresh signal bus.
    ///
    /// # Errors
    /// See [`Enhancer::install_with_bus`].
    pub fn install(document: &Document, config: EnhancerConfig, transport: T) -> Result<Self, EnhancerError> {
        Self::install_with_bus(document, config, EventBus::new(), transport)
    }

    /// Binds ajax navigation, active-link tracking and toasts to `document`, then
    /// publishes [`LocationChanged`] with [`LocationCause::Initial`].
    ///
    /// When the document is already enhanced the existing handle is returned and the
    /// arguments are dropped.
    ///
    /// # Errors
    /// * [`EnhancerError::TransportMismatch`] when the document is enhanced with another
    ///   transport type.
    /// * [`EnhancerError::Bus`] when a bus listener cannot be registered.
    pub fn install_with_bus(
        document: &Document,
        config: EnhancerConfig,
        bus: EventBus,
        transport: T,
    ) -> Result<Self, EnhancerError> {
        let mut installed = INSTALLED.lock();
        installed.retain(|_, entry| entry.is_alive());

        if let Some(entry) = installed.get(&document.id()) {
            let existing = entry
                .as_any()
                .downcast_ref::<Weak<EnhancerInner<T>>>()
                .and_then(Weak::upgrade)
                .ok_or(EnhancerError::TransportMismatch { document: document.id(), context: None })?;
            debug!(document = ?document.id(), "Document already enhanced");
            return Ok(Self { inner: existing });
        }

        let watcher = MutationWatcher::new(document);
        let controller = NavigationController::new(document, config.clone(), bus.clone(), transport);
        let tracker = ActiveLinkTracker::new(document, &config);
        let toasts = ToastStack::new(document, &config);

        let listeners = listen_all(
            &bus,
            vec![
                registration("Active link tracker", |bus| tracker.subscribe(bus)),
                registration("Toast stack", |bus| toasts.subscribe(bus)),
            ],
        )?;
        controller.install(&watcher);
        tracker.install(&watcher);
        toasts.install(&watcher);

        let inner = Arc::new(EnhancerInner {
            document: document.clone(),
            bus,
            watcher,
            controller,
            tracker,
            toasts,
            listeners,
        });
        installed.insert(document.id(), Box::new(Arc::downgrade(&inner)));
        drop(installed);

        let location = document.location();
        info!(document = ?document.id(), %location, "Page enhancers installed");
        let _ = inner.bus.publish(LocationChanged::new(location, LocationCause::Initial));

        Ok(Self { inner })
    }

    /// Moves through session history and announces the new location.
    ///
    /// Returns `None`, without publishing, when `delta` leaves the history bounds.
    pub fn go(&self, delta: isize) -> Option<Url> {
        let url = self.inner.document.traverse(delta)?;
        let _ = self.inner.bus.publish(LocationChanged::new(url.clone(), LocationCause::Traversal));
        Some(url)
    }

    /// Every later location change, for hosts that mirror it to a real address bar.
    ///
    /// # Errors
    /// Returns [`EnhancerError::Bus`] when the receiver cannot be created.
    pub fn locations(&self) -> Result<Receiver<LocationChanged>, EnhancerError> {
        self.inner.bus.subscribe::<LocationChanged>().context("Location receiver")
    }

    /// Resolves once no navigation exchange is in flight.
    pub async fn idle(&self) {
        self.inner.controller.idle().await;
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    #[must_use]
    pub fn watcher(&self) -> &MutationWatcher {
        &self.inner.watcher
    }

    #[must_use]
    pub fn controller(&self) -> &NavigationController<T> {
        &self.inner.controller
    }

    #[must_use]
    pub fn tracker(&self) -> &ActiveLinkTracker {
        &self.inner.tracker
    }

    #[must_use]
    pub fn toasts(&self) -> &ToastStack {
        &self.inner.toasts
    }

    /// Whether `self` and `other` are handles to the same installation.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

type Registration<'a> = (&'static str, Box<dyn FnOnce(&EventBus) -> Result<ListenerId, EventBusError> + 'a>);

fn registration<'a>(
    name: &'static str,
    register: impl FnOnce(&EventBus) -> Result<ListenerId, EventBusError> + 'a,
) -> Registration<'a> {
    (name, Box::new(register))
}

/// Runs every registration; on the first failure, removes the listeners already added.
fn listen_all(bus: &EventBus, registrations: Vec<Registration<'_>>) -> Result<Vec<ListenerId>, EnhancerError> {
    let mut listeners = Vec::with_capacity(registrations.len());
    for (name, register) in registrations {
        match register(bus).context(name) {
            Ok(id) => listeners.push(id),
            Err(err) => {
                for id in listeners {
                    bus.unlisten(id);
                }
                return Err(err);
            },
        }
    }
    Ok(listeners)
}

/// Whether a live enhancer is installed on `document`.
#[must_use]
pub fn is_enhanced(document: &Document) -> bool {
    INSTALLED.lock().get(&document.id()).is_some_and(|entry| entry.is_alive())
}

impl<T> fmt::Debug for Enhancer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer")
            .field("document", &self.inner.document)
            .field("watcher", &self.inner.watcher)
            .field("listeners", &self.inner.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ln_domain::notification::NotificationEvent;

    #[test]
    fn test_failed_registration_removes_earlier_listeners() {
        let bus = EventBus::new();
        let err = listen_all(
            &bus,
            vec![
                registration("Notifications", |bus| bus.listen::<NotificationEvent, _>(|_| {})),
                registration("Broken", |_| {
                    Err(EventBusError::TypeMismatch { message: "broken".into(), context: None })
                }),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, EnhancerError::Bus { context: Some(ref name), .. } if name == "Broken"));
        assert_eq!(bus.subscriber_count::<NotificationEvent>(), 0);
    }

    #[test]
    fn test_successful_registrations_are_kept_in_order() {
        let bus = EventBus::new();
        let listeners = listen_all(
            &bus,
            vec![
                registration("First", |bus| bus.listen::<NotificationEvent, _>(|_| {})),
                registration("Second", |bus| bus.listen::<LocationChanged, _>(|_| {})),
            ],
        )
        .unwrap();

        assert_eq!(listeners.len(), 2);
        assert_eq!(bus.subscriber_count::<NotificationEvent>(), 1);
        assert_eq!(bus.subscriber_count::<LocationChanged>(), 1);
    }
}
