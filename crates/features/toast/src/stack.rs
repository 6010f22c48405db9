use crate::error::ToastError;
use crate::toast::Toast;
use fxhash::FxHashMap;
use ln_dom::{Document, DomError, Element, EventKind, NodeId, WeakDocument};
use ln_domain::config::{EnhancerConfig, ToastConfig};
use ln_domain::constants::{
    FEATURE_TOAST, FEATURE_TOAST_ITEM, TOAST_ITEM_MARKER, TOAST_MAX_ATTR, TOAST_TIMEOUT_ATTR,
};
use ln_domain::notification::{NotificationEvent, NotificationKind};
use ln_event_bus::{EventBus, EventBusError, ListenerId};
use ln_lifecycle::{Feature, Matcher, MutationWatcher};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

pub const ITEM_CLASS: &str = "ln-toast__item";
pub const CLOSE_CLASS: &str = "ln-toast__close";

struct StackInner {
    document: WeakDocument,
    config: ToastConfig,
    timers: Mutex<FxHashMap<NodeId, AbortHandle>>,
}

/// Shows notifications as toasts inside a container.
///
/// The container is the explicit element passed in, else the first element carrying
/// `data-ln-toast`, else `#ln-toast-container`. Per-container `data-ln-toast-timeout`
/// (milliseconds, `0` keeps toasts until dismissed) and `data-ln-toast-max` override the
/// configured defaults. Server-rendered `[data-ln-toast-item]` children are converted to
/// toast markup when their container is bound.
///
/// Timed dismissal needs a Tokio runtime; without one toasts stay until dismissed.
#[derive(Clone)]
pub struct ToastStack {
    inner: Arc<StackInner>,
}

impl ToastStack {
    #[must_use]
    pub fn new(document: &Document, config: &EnhancerConfig) -> Self {
        Self {
            inner: Arc::new(StackInner {
                document: document.downgrade(),
                config: config.toast.clone(),
                timers: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Registers the container and item features with `watcher`.
    pub fn install(&self, watcher: &MutationWatcher) {
        watcher.register(self.container_feature());
        watcher.register(self.item_feature());
    }

    /// Shows every [`NotificationEvent`] published on `bus`.
    ///
    /// # Errors
    /// Returns [`EventBusError`] when the listener cannot be registered.
    pub fn subscribe(&self, bus: &EventBus) -> Result<ListenerId, EventBusError> {
        let weak = Arc::downgrade(&self.inner);
        bus.listen::<NotificationEvent, _>(move |event| {
            let Some(inner) = weak.upgrade() else { return };
            match inner.enqueue(Toast::from(event), None) {
                Ok(_) => {},
                Err(ToastError::NoContainer { .. }) => {
                    debug!(kind = event.kind.as_str(), "No toast container; notification dropped");
                },
                Err(err) => warn!(error = %err, "Failed to show notification"),
            }
        })
    }

    /// Delegates clicks on close buttons to [`ToastStack::dismiss`].
    #[must_use]
    pub fn container_feature(&self) -> Feature {
        let weak = Arc::downgrade(&self.inner);
        Feature::new(FEATURE_TOAST, Matcher::attribute(self.inner.config.marker.clone()), move |container| {
            let weak = weak.clone();
            container.add_listener(EventKind::Click, FEATURE_TOAST, move |event| {
                let Some(inner) = weak.upgrade() else { return };
                let item = event
                    .target()
                    .closest(|e| e.has_class(CLOSE_CLASS))
                    .and_then(|close| close.closest(|e| e.has_class(ITEM_CLASS)));
                if let Some(item) = item {
                    event.prevent_default();
                    inner.dismiss(&item);
                }
            });
            trace!(?container, "Toast container bound");
        })
    }

    /// Converts server-rendered items inside a container.
    #[must_use]
    pub fn item_feature(&self) -> Feature {
        let marker = self.inner.config.marker.clone();
        let matcher = Matcher::custom(move |element| {
            element.has_attr(TOAST_ITEM_MARKER)
                && element.parent().is_some_and(|parent| parent.closest(|e| e.has_attr(&marker)).is_some())
        });
        let weak = Arc::downgrade(&self.inner);
        Feature::new(FEATURE_TOAST_ITEM, matcher, move |item| {
            let Some(inner) = weak.upgrade() else { return };
            if let Err(err) = inner.hydrate(item) {
                warn!(error = %err, "Failed to hydrate toast item");
            }
        })
    }

    /// Adds a toast and returns its element.
    ///
    /// # Errors
    /// * [`ToastError::NoContainer`] when no container can be resolved.
    /// * [`ToastError::Dom`] when the markup cannot be assembled.
    pub fn enqueue(&self, toast: Toast, container: Option<&Element>) -> Result<Element, ToastError> {
        self.inner.enqueue(toast, container)
    }

    /// Removes one toast and cancels its timer.
    pub fn dismiss(&self, item: &Element) {
        self.inner.dismiss(item);
    }

    /// Removes every toast from the resolved container.
    pub fn clear(&self, container: Option<&Element>) {
        if let Some(container) = self.inner.resolve(container) {
            for item in container.children() {
                self.inner.dismiss(&item);
            }
        }
    }

    /// The container [`ToastStack::enqueue`] would use without an explicit one.
    #[must_use]
    pub fn container(&self) -> Option<Element> {
        self.inner.resolve(None)
    }

    /// Toasts waiting for timed dismissal.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }
}

impl StackInner {
    fn resolve(&self, explicit: Option<&Element>) -> Option<Element> {
        if let Some(container) = explicit {
            return Some(container.clone());
        }
        let document = self.document.upgrade()?;
        document
            .query(|e| e.has_attr(&self.config.marker))
            .or_else(|| document.get_element_by_id(&self.config.container_id))
    }

    fn timeout_for(&self, container: &Element) -> Duration {
        let ms = container
            .attr(TOAST_TIMEOUT_ATTR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(self.config.timeout_ms);
        Duration::from_millis(ms)
    }

    fn max_for(&self, container: &Element) -> usize {
        container
            .attr(TOAST_MAX_ATTR)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(self.config.max_items)
            .max(1)
    }

    fn enqueue(self: &Arc<Self>, toast: Toast, explicit: Option<&Element>) -> Result<Element, ToastError> {
        let container = self.resolve(explicit).ok_or(ToastError::NoContainer { context: None })?;
        let document = container.owner_document().ok_or(ToastError::NoContainer {
            context: Some("container has no document".into()),
        })?;

        let item = document.create_element("li");
        item.add_class(ITEM_CLASS);
        render(&document, &item, &toast)?;

        let max = self.max_for(&container);
        let mut children = container.children();
        while children.len() >= max {
            let oldest = children.remove(0);
            self.dismiss(&oldest);
        }
        container.append_child(&item)?;

        let timeout = toast.timeout.unwrap_or_else(|| self.timeout_for(&container));
        if !timeout.is_zero() {
            self.schedule(&item, timeout);
        }
        debug!(kind = toast.kind.as_str(), ?timeout, "Toast shown");
        Ok(item)
    }

    fn schedule(self: &Arc<Self>, item: &Element, timeout: Duration) {
        let Ok(runtime) = Handle::try_current() else {
            debug!("No async runtime; toast stays until dismissed");
            return;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        let target = item.downgrade();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(inner) = weak.upgrade() else { return };
            inner.timers.lock().remove(&target.node_id());
            if let Some(item) = target.upgrade() {
                trace!(?item, "Toast timed out");
                inner.dismiss(&item);
            }
        });
        self.timers.lock().insert(item.node_id(), handle.abort_handle());
    }

    fn dismiss(&self, item: &Element) {
        if let Some(timer) = self.timers.lock().remove(&item.node_id()) {
            timer.abort();
        }
        item.remove();
    }

    fn hydrate(&self, item: &Element) -> Result<(), ToastError> {
        let document = item
            .owner_document()
            .ok_or(ToastError::NoContainer { context: Some("item has no document".into()) })?;
        let kind = item.attr("data-type").map_or(NotificationKind::Info, |t| NotificationKind::from(t.as_str()));
        let mut toast = Toast::new(kind);
        toast.title = item.attr("data-title").filter(|t| !t.trim().is_empty());
        toast.message = Some(item.text_content().trim().to_owned()).filter(|m| !m.is_empty());

        item.remove_attr(TOAST_ITEM_MARKER);
        item.add_class(ITEM_CLASS);
        item.set_text_content("");
        render(&document, item, &toast)?;
        trace!(?item, "Toast item hydrated");
        Ok(())
    }
}

/// Fills `item` with the card markup for `toast`.
fn render(document: &Document, item: &Element, toast: &Toast) -> Result<(), DomError> {
    let kind = toast.kind.as_str();
    let is_error = toast.kind == NotificationKind::Error;

    let card = document.create_element("div");
    card.set_attr("class", format!("ln-toast__card ln-toast__card--{kind}"));
    card.set_attr("role", if is_error { "alert" } else { "status" });
    card.set_attr("aria-live", if is_error { "assertive" } else { "polite" });

    let title = document.create_element("strong");
    title.add_class("ln-toast__title");
    title.set_text_content(toast.display_title());
    card.append_child(&title)?;

    let close = document.create_element("button");
    close.set_attr("type", "button");
    close.add_class(CLOSE_CLASS);
    close.set_attr("aria-label", "Close");
    close.set_text_content("\u{d7}");
    card.append_child(&close)?;

    if toast.message.is_some() || !toast.errors.is_empty() {
        let body = document.create_element("div");
        body.add_class("ln-toast__body");
        if let Some(message) = &toast.message {
            let paragraph = document.create_element("p");
            paragraph.set_text_content(message);
            body.append_child(&paragraph)?;
        }
        if !toast.errors.is_empty() {
            let list = document.create_element("ul");
            for error in &toast.errors {
                let entry = document.create_element("li");
                entry.set_text_content(error);
                list.append_child(&entry)?;
            }
            body.append_child(&list)?;
        }
        card.append_child(&body)?;
    }

    item.append_child(&card)
}

impl fmt::Debug for ToastStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastStack")
            .field("document", &self.inner.document)
            .field("config", &self.inner.config)
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}
