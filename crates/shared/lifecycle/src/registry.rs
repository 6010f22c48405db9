use fxhash::FxHashMap;
use ln_dom::{Element, NodeId, WeakElement};
use parking_lot::Mutex;
use std::fmt;
use tracing::trace;

struct Binding {
    element: WeakElement,
    features: Vec<&'static str>,
}

/// Records which `(element, feature)` pairs have been initialized.
///
/// Entries hold [`WeakElement`]s only, so a binding never keeps a removed element alive.
/// Dead entries are dropped by [`AttachmentRegistry::prune`] or when the element is
/// released.
#[derive(Default)]
pub struct AttachmentRegistry {
    bindings: Mutex<FxHashMap<NodeId, Binding>>,
}

impl AttachmentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `initializer` unless `element` is already bound to `feature`.
    ///
    /// The pair is marked before the initializer runs, so a scan triggered from inside the
    /// initializer cannot initialize it twice. Returns `true` if the initializer ran.
    pub fn attach(
        &self,
        element: &Element,
        feature: &'static str,
        initializer: impl FnOnce(&Element),
    ) -> bool {
        {
            let mut bindings = self.bindings.lock();
            let binding = bindings
                .entry(element.node_id())
                .or_insert_with(|| Binding { element: element.downgrade(), features: Vec::new() });
            if binding.features.contains(&feature) {
                return false;
            }
            binding.features.push(feature);
        }
        trace!(?element, feature, "Attaching feature");
        initializer(element);
        true
    }

    /// Releases one binding. A no-op (returning `false`) when the pair is not bound.
    pub fn detach(&self, element: &Element, feature: &str) -> bool {
        let mut bindings = self.bindings.lock();
        let Some(binding) = bindings.get_mut(&element.node_id()) else { return false };
        let before = binding.features.len();
        binding.features.retain(|existing| *existing != feature);
        let removed = before != binding.features.len();
        if binding.features.is_empty() {
            bindings.remove(&element.node_id());
        }
        removed
    }

    /// Releases every binding of `element`, returning the features it was bound to.
    pub fn detach_all(&self, element: &Element) -> Vec<&'static str> {
        self.bindings.lock().remove(&element.node_id()).map(|b| b.features).unwrap_or_default()
    }

    #[must_use]
    pub fn is_attached(&self, element: &Element, feature: &str) -> bool {
        self.bindings
            .lock()
            .get(&element.node_id())
            .is_some_and(|binding| binding.features.iter().any(|f| *f == feature))
    }

    /// Live elements currently bound to `feature`.
    #[must_use]
    pub fn attached(&self, feature: &str) -> Vec<Element> {
        self.bindings
            .lock()
            .values()
            .filter(|binding| binding.features.iter().any(|f| *f == feature))
            .filter_map(|binding| binding.element.upgrade())
            .collect()
    }

    /// Drops entries whose element no longer exists; returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut bindings = self.bindings.lock();
        let before = bindings.len();
        bindings.retain(|_, binding| binding.element.is_alive());
        before - bindings.len()
    }

    /// Number of elements with at least one binding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }
}

impl fmt::Debug for AttachmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentRegistry").field("elements", &self.len()).finish()
    }
}
