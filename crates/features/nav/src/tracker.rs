use crate::path::{link_path, matches, normalize};
use fxhash::FxHashMap;
use ln_dom::{Document, Element, NodeId, WeakDocument, WeakElement};
use ln_domain::config::EnhancerConfig;
use ln_domain::constants::{FEATURE_NAV, FEATURE_NAV_LINK};
use ln_domain::signals::LocationChanged;
use ln_event_bus::{EventBus, EventBusError, ListenerId};
use ln_lifecycle::{Feature, Matcher, MutationWatcher};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

struct TrackedLink {
    element: WeakElement,
    /// `None` when the href is missing or points elsewhere.
    path: Option<String>,
}

struct NavContainer {
    active_class: String,
    links: FxHashMap<NodeId, TrackedLink>,
}

impl NavContainer {
    /// Marks the links whose path is the most specific match for `current`.
    fn refresh(&self, current: &str) {
        let best = self
            .links
            .values()
            .filter_map(|link| link.path.as_deref())
            .filter(|path| matches(path, current))
            .max_by_key(|path| path.len());

        for link in self.links.values() {
            let Some(element) = link.element.upgrade() else { continue };
            if best.is_some() && link.path.as_deref() == best {
                element.add_class(&self.active_class);
            } else {
                element.remove_class(&self.active_class);
            }
        }
    }
}

#[derive(Default)]
struct State {
    containers: FxHashMap<NodeId, NavContainer>,
    /// Link id to the container tracking it.
    owners: FxHashMap<NodeId, NodeId>,
}

struct TrackerInner {
    document: WeakDocument,
    marker: String,
    state: Mutex<State>,
}

/// Marks the links of each `data-ln-nav` container that point at the current location.
///
/// The attribute value is the class to apply. A link is a candidate when its path equals
/// the current path or is an ancestor of it on a segment boundary; within a container
/// only the most specific candidates are marked. Links are tracked as they enter and
/// leave the container, and every container is refreshed on [`LocationChanged`].
#[derive(Clone)]
pub struct ActiveLinkTracker {
    inner: Arc<TrackerInner>,
}

impl ActiveLinkTracker {
    #[must_use]
    pub fn new(document: &Document, config: &EnhancerConfig) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                document: document.downgrade(),
                marker: config.nav.marker.clone(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Registers the container and link features with `watcher`.
    pub fn install(&self, watcher: &MutationWatcher) {
        watcher.register(self.container_feature());
        watcher.register(self.link_feature());
    }

    /// Refreshes every container whenever the location changes.
    ///
    /// # Errors
    /// Returns [`EventBusError`] when the listener cannot be registered.
    pub fn subscribe(&self, bus: &EventBus) -> Result<ListenerId, EventBusError> {
        let weak = Arc::downgrade(&self.inner);
        bus.listen::<LocationChanged, _>(move |change| {
            if let Some(inner) = weak.upgrade() {
                trace!(url = %change.url, cause = ?change.cause, "Location changed");
                inner.refresh_all();
            }
        })
    }

    #[must_use]
    pub fn container_feature(&self) -> Feature {
        let attach = Arc::downgrade(&self.inner);
        let release = attach.clone();
        Feature::new(FEATURE_NAV, Matcher::attribute(self.inner.marker.clone()), move |element| {
            with(&attach, |inner| inner.track_container(element));
        })
        .on_release(move |element| with(&release, |inner| inner.untrack_container(element)))
    }

    #[must_use]
    pub fn link_feature(&self) -> Feature {
        let marker = self.inner.marker.clone();
        let matcher = Matcher::custom(move |element| {
            element.tag() == "a" && element.parent().is_some_and(|parent| container_of(&parent, &marker).is_some())
        });
        let attach = Arc::downgrade(&self.inner);
        let release = attach.clone();
        Feature::new(FEATURE_NAV_LINK, matcher, move |link| {
            with(&attach, |inner| inner.track_link(link));
        })
        .on_release(move |link| with(&release, |inner| inner.untrack_link(link)))
    }

    /// Re-evaluates every container against the document's current location.
    pub fn refresh(&self) {
        self.inner.refresh_all();
    }

    /// Number of containers being tracked.
    #[must_use]
    pub fn containers(&self) -> usize {
        self.inner.state.lock().containers.len()
    }

    /// Number of links tracked inside `container`.
    #[must_use]
    pub fn tracked_links(&self, container: &Element) -> usize {
        self.inner
            .state
            .lock()
            .containers
            .get(&container.node_id())
            .map_or(0, |c| c.links.len())
    }
}

fn with(weak: &Weak<TrackerInner>, f: impl FnOnce(&TrackerInner)) {
    if let Some(inner) = weak.upgrade() {
        f(&inner);
    }
}

/// The nearest inclusive ancestor carrying a non-empty marker.
fn container_of(element: &Element, marker: &str) -> Option<Element> {
    element
        .closest(|e| e.has_attr(marker))
        .filter(|container| container.attr(marker).is_some_and(|class| !class.trim().is_empty()))
}

impl TrackerInner {
    fn current_path(&self) -> Option<String> {
        self.document.upgrade().map(|document| normalize(document.location().path()).to_owned())
    }

    fn track_container(&self, element: &Element) {
        let Some(active_class) = element.attr(&self.marker).map(|c| c.trim().to_owned()) else { return };
        if active_class.is_empty() {
            debug!(?element, "Nav container without an active class; ignored");
            return;
        }
        self.state
            .lock()
            .containers
            .entry(element.node_id())
            .or_insert_with(|| NavContainer { active_class, links: FxHashMap::default() });
        debug!(?element, "Nav container tracked");
    }

    fn untrack_container(&self, element: &Element) {
        let mut state = self.state.lock();
        if let Some(container) = state.containers.remove(&element.node_id()) {
            for (id, link) in &container.links {
                state.owners.remove(id);
                if let Some(element) = link.element.upgrade() {
                    element.remove_class(&container.active_class);
                }
            }
            debug!(?element, "Nav container released");
        }
    }

    fn track_link(&self, link: &Element) {
        let Some(parent) = link.parent() else { return };
        let Some(container) = container_of(&parent, &self.marker) else { return };
        let Some(document) = self.document.upgrade() else { return };
        let location = document.location();
        let path = link.attr("href").and_then(|href| link_path(&href, &location));
        let current = normalize(location.path());

        // Links can be scanned before their container in a batch.
        self.track_container(&container);
        let mut state = self.state.lock();
        state.owners.insert(link.node_id(), container.node_id());
        if let Some(tracked) = state.containers.get_mut(&container.node_id()) {
            tracked.links.insert(link.node_id(), TrackedLink { element: link.downgrade(), path });
            tracked.refresh(current);
        }
    }

    fn untrack_link(&self, link: &Element) {
        let current = self.current_path();
        let mut state = self.state.lock();
        let owner = state.owners.remove(&link.node_id());
        if let Some(container) = owner.and_then(|id| state.containers.get_mut(&id)) {
            if let Some(removed) = container.links.remove(&link.node_id()) {
                link.remove_class(&container.active_class);
                trace!(?link, had_path = removed.path.is_some(), "Nav link released");
            }
            if let Some(current) = current.as_deref() {
                container.refresh(current);
            }
        }
    }

    fn refresh_all(&self) {
        let Some(current) = self.current_path() else { return };
        let state = self.state.lock();
        for container in state.containers.values() {
            container.refresh(&current);
        }
        trace!(containers = state.containers.len(), current, "Nav containers refreshed");
    }
}

impl fmt::Debug for ActiveLinkTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveLinkTracker")
            .field("document", &self.inner.document)
            .field("marker", &self.inner.marker)
            .field("containers", &self.containers())
            .finish()
    }
}
