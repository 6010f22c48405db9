use crate::registry::AttachmentRegistry;
use ln_dom::{Document, Element, MutationRecord, ObserverId, WeakDocument};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

type Predicate = Arc<dyn Fn(&Element) -> bool + Send + Sync>;
type Hook = Arc<dyn Fn(&Element) + Send + Sync>;

/// Decides whether a feature applies to an element.
#[derive(Clone)]
pub enum Matcher {
    /// The element carries this attribute (any value).
    Attribute(String),
    /// Arbitrary predicate, for features whose scope depends on ancestors.
    Custom(Predicate),
}

impl Matcher {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    pub fn custom(pred: impl Fn(&Element) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(pred))
    }

    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Attribute(name) => element.has_attr(name),
            Self::Custom(pred) => pred(element),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// An enhancement bound to matching elements.
#[derive(Clone)]
pub struct Feature {
    tag: &'static str,
    matcher: Matcher,
    attach: Hook,
    release: Option<Hook>,
}

impl Feature {
    /// `attach` runs once per matching element; listeners it registers should use `tag`
    /// as their owner so they are dropped when the element is released.
    pub fn new(
        tag: &'static str,
        matcher: Matcher,
        attach: impl Fn(&Element) + Send + Sync + 'static,
    ) -> Self {
        Self { tag, matcher, attach: Arc::new(attach), release: None }
    }

    /// Runs when a bound element leaves the document.
    #[must_use]
    pub fn on_release(mut self, release: impl Fn(&Element) + Send + Sync + 'static) -> Self {
        self.release = Some(Arc::new(release));
        self
    }

    #[must_use]
    pub const fn tag(&self) -> &'static str {
        self.tag
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("tag", &self.tag)
            .field("matcher", &self.matcher)
            .field("release", &self.release.is_some())
            .finish_non_exhaustive()
    }
}

struct WatcherInner {
    document: WeakDocument,
    registry: AttachmentRegistry,
    features: RwLock<Vec<Arc<Feature>>>,
    observer: Mutex<Option<ObserverId>>,
}

/// The single document observer shared by every feature.
///
/// Cloning yields another handle to the same watcher. The observer stops when the last
/// handle is dropped or [`MutationWatcher::stop`] is called.
#[derive(Clone)]
pub struct MutationWatcher {
    inner: Arc<WatcherInner>,
}

impl MutationWatcher {
    /// Starts observing `document`. Features are added with [`MutationWatcher::register`].
    #[must_use]
    pub fn new(document: &Document) -> Self {
        let inner = Arc::new(WatcherInner {
            document: document.downgrade(),
            registry: AttachmentRegistry::new(),
            features: RwLock::new(Vec::new()),
            observer: Mutex::new(None),
        });

        let weak: Weak<WatcherInner> = Arc::downgrade(&inner);
        let id = document.observe(move |records| {
            if let Some(inner) = weak.upgrade() {
                inner.handle(records);
            }
        });
        *inner.observer.lock() = Some(id);
        debug!(document = ?document.id(), "Mutation watcher started");

        Self { inner }
    }

    /// Adds a feature and attaches it to matching elements already in the document.
    pub fn register(&self, feature: Feature) {
        let feature = Arc::new(feature);
        debug!(feature = feature.tag, "Feature registered");
        self.inner.features.write().push(feature.clone());

        if let Some(document) = self.inner.document.upgrade() {
            for element in document.body().inclusive_descendants() {
                self.inner.attach_one(&feature, &element);
            }
        }
    }

    /// Attaches every registered feature within `root` (inclusive), in document order.
    pub fn scan(&self, root: &Element) {
        self.inner.scan(root);
    }

    /// Releases every binding within `root` (inclusive).
    pub fn release(&self, root: &Element) {
        self.inner.release(root);
    }

    #[must_use]
    pub fn registry(&self) -> &AttachmentRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn is_attached(&self, element: &Element, feature: &str) -> bool {
        self.inner.registry.is_attached(element, feature)
    }

    /// Stops observing. Existing bindings stay in place.
    pub fn stop(&self) {
        self.inner.disconnect();
    }
}

impl WatcherInner {
    fn features(&self) -> Vec<Arc<Feature>> {
        self.features.read().clone()
    }

    fn handle(&self, records: &[MutationRecord]) {
        for record in records {
            for removed in record.removed.iter().filter(|node| node.is_element()) {
                self.release(removed);
            }
            for added in record.added.iter().filter(|node| node.is_element()) {
                // A later record in the batch may already have moved it out again.
                if added.is_connected() {
                    self.scan(added);
                }
            }
        }
        if records.iter().any(|record| !record.removed.is_empty()) {
            let pruned = self.registry.prune();
            if pruned > 0 {
                trace!(pruned, "Pruned dead bindings");
            }
        }
    }

    fn scan(&self, root: &Element) {
        let features = self.features();
        if features.is_empty() {
            return;
        }
        for element in root.inclusive_descendants() {
            for feature in &features {
                self.attach_one(feature, &element);
            }
        }
    }

    fn attach_one(&self, feature: &Feature, element: &Element) {
        if feature.matcher.matches(element) {
            self.registry.attach(element, feature.tag, |e| (feature.attach)(e));
        }
    }

    fn release(&self, root: &Element) {
        let features = self.features();
        for element in root.inclusive_descendants() {
            for tag in self.registry.detach_all(&element) {
                element.remove_listeners(tag);
                if let Some(release) =
                    features.iter().find(|f| f.tag == tag).and_then(|f| f.release.as_ref())
                {
                    release(&element);
                }
                trace!(?element, feature = tag, "Feature released");
            }
        }
    }

    fn disconnect(&self) {
        let Some(id) = self.observer.lock().take() else { return };
        if let Some(document) = self.document.upgrade() {
            document.disconnect(id);
            debug!(document = ?document.id(), "Mutation watcher stopped");
        }
    }
}

impl Drop for WatcherInner {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for MutationWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.inner.features.read().iter().map(|f| f.tag).collect();
        f.debug_struct("MutationWatcher")
            .field("document", &self.inner.document)
            .field("features", &tags)
            .field("registry", &self.inner.registry)
            .finish()
    }
}
