use crate::error::DomError;
use crate::event::{DispatchOutcome, DomEvent, Event};
use crate::history::{History, HistoryEntry, HistoryState};
use crate::html::{self, Parsed};
use crate::node::{self, Element, NodeId, NodeKind};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use url::Url;

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

/// Handle returned by [`Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// One child-list change: `added` and `removed` are direct children of `target`.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub target: Element,
    pub added: Vec<Element>,
    pub removed: Vec<Element>,
}

impl MutationRecord {
    pub(crate) fn added(target: &Element, nodes: Vec<Element>) -> Self {
        Self { target: target.clone(), added: nodes, removed: Vec::new() }
    }

    pub(crate) fn removed(target: &Element, nodes: Vec<Element>) -> Self {
        Self { target: target.clone(), added: Vec::new(), removed: nodes }
    }
}

type ObserverFn = Arc<dyn Fn(&[MutationRecord]) + Send + Sync>;

pub(crate) struct DocumentInner {
    id: DocumentId,
    next_node: AtomicU64,
    next_observer: AtomicU64,
    pub(crate) root: Element,
    head: Element,
    body: Element,
    title: RwLock<String>,
    history: RwLock<History>,
    observers: RwLock<Vec<(ObserverId, ObserverFn)>>,
    pending: Mutex<VecDeque<Vec<MutationRecord>>>,
    delivering: AtomicBool,
}

/// An in-process HTML document.
///
/// Hosts mirror the real page into this model; enhancers bind to it. The handle is
/// cheap to clone and shares the same tree.
///
/// # Mutation delivery
///
/// Every child-list change made to a connected node produces [`MutationRecord`]s. The
/// records of one operation form one batch, delivered synchronously to every observer
/// before the mutating call returns. If an observer mutates the tree, the new batch is
/// queued and delivered after the current one; delivery never nests.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

/// A non-owning document handle.
#[derive(Clone)]
pub struct WeakDocument {
    id: DocumentId,
    inner: Weak<DocumentInner>,
}

impl Document {
    /// Creates an empty `html > (head, body)` document located at `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<DocumentInner>| {
            let next_node = AtomicU64::new(1);
            let element = |tag: &str| {
                let id = NodeId(next_node.fetch_add(1, Ordering::Relaxed));
                Element::create(weak.clone(), id, NodeKind::Element(tag.to_owned()))
            };
            let root = element("html");
            let head = element("head");
            let body = element("body");
            root.push_child_unchecked(&head);
            root.push_child_unchecked(&body);

            DocumentInner {
                id: DocumentId(NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed)),
                next_node,
                next_observer: AtomicU64::new(1),
                root,
                head,
                body,
                title: RwLock::new(String::new()),
                history: RwLock::new(History::new(url)),
                observers: RwLock::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                delivering: AtomicBool::new(false),
            }
        });
        debug!(document = ?inner.id, "Document created");
        Self { inner }
    }

    /// Creates a document and fills `<head>` and `<body>` from markup, without emitting mutations.
    ///
    /// # Errors
    /// Returns [`DomError::InvalidUrl`] if `url` does not parse.
    pub fn parse(url: &str, head: &str, body: &str) -> Result<Self, DomError> {
        let document = Self::new(Url::parse(url)?);
        for node in document.adopt(html::parse_fragment(head)) {
            document.inner.head.push_child_unchecked(&node);
        }
        for node in document.adopt(html::parse_fragment(body)) {
            document.inner.body.push_child_unchecked(&node);
        }
        if let Some(title) = document.inner.head.find(|element| element.tag() == "title") {
            document.set_title(title.text_content().trim());
        }
        Ok(document)
    }

    pub(crate) const fn from_inner(inner: Arc<DocumentInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument { id: self.inner.id, inner: Arc::downgrade(&self.inner) }
    }

    #[must_use]
    pub fn document_element(&self) -> Element {
        self.inner.root.clone()
    }

    #[must_use]
    pub fn head(&self) -> Element {
        self.inner.head.clone()
    }

    #[must_use]
    pub fn body(&self) -> Element {
        self.inner.body.clone()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.inner.title.read().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.inner.title.write() = title.into();
    }

    // --- Node creation ---

    fn next_id(&self) -> NodeId {
        NodeId(self.inner.next_node.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a detached element.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        let kind = NodeKind::Element(tag.to_ascii_lowercase());
        Element::create(Arc::downgrade(&self.inner), self.next_id(), kind)
    }

    #[must_use]
    pub fn create_text(&self, text: &str) -> Element {
        let weak = Arc::downgrade(&self.inner);
        Element::create_character_data(weak, self.next_id(), NodeKind::Text, text.to_owned())
    }

    #[must_use]
    pub fn create_comment(&self, text: &str) -> Element {
        let weak = Arc::downgrade(&self.inner);
        Element::create_character_data(weak, self.next_id(), NodeKind::Comment, text.to_owned())
    }

    /// Parses `html` into detached nodes owned by this document.
    #[must_use]
    pub fn parse_fragment(&self, html: &str) -> Vec<Element> {
        self.adopt(html::parse_fragment(html))
    }

    pub(crate) fn adopt(&self, parsed: Vec<Parsed>) -> Vec<Element> {
        parsed.into_iter().map(|node| node::materialize(self, node)).collect()
    }

    // --- Queries ---

    /// First connected element whose `id` attribute equals `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.root.find(|element| element.attr("id").as_deref() == Some(id))
    }

    /// Every connected element matching `pred`, in document order.
    pub fn query_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<Element> {
        self.inner.root.find_all(pred)
    }

    pub fn query(&self, pred: impl Fn(&Element) -> bool) -> Option<Element> {
        self.inner.root.find(pred)
    }

    /// The `content` of the first `<meta name="{name}">`.
    #[must_use]
    pub fn query_meta(&self, name: &str) -> Option<String> {
        self.query(|element| element.tag() == "meta" && element.attr("name").as_deref() == Some(name))
            .and_then(|meta| meta.attr("content"))
    }

    // --- Location & history ---

    #[must_use]
    pub fn location(&self) -> Url {
        self.inner.history.read().current().url.clone()
    }

    /// Resolves `href` against the current location.
    ///
    /// # Errors
    /// Returns [`DomError::InvalidUrl`] if the result is not a valid URL.
    pub fn resolve_url(&self, href: &str) -> Result<Url, DomError> {
        Ok(self.location().join(href)?)
    }

    /// Appends a history entry and makes it current, discarding forward entries.
    pub fn push_state(&self, url: Url, state: HistoryState) {
        trace!(document = ?self.inner.id, %url, ?state, "History entry pushed");
        self.inner.history.write().push(HistoryEntry { url, state });
    }

    /// Moves through history; returns the new location, or `None` when out of range.
    pub fn traverse(&self, delta: isize) -> Option<Url> {
        self.inner.history.write().traverse(delta).map(|entry| entry.url.clone())
    }

    #[must_use]
    pub fn history_entry(&self) -> HistoryEntry {
        self.inner.history.read().current().clone()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.inner.history.read().len()
    }

    // --- Mutation observation ---

    /// Registers a callback for every subsequent mutation batch.
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&[MutationRecord]) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().push((id, Arc::new(callback)));
        debug!(document = ?self.inner.id, ?id, "Mutation observer registered");
        id
    }

    /// Returns `false` if the observer was already disconnected.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        before != observers.len()
    }

    pub(crate) fn queue_mutations(&self, batch: Vec<MutationRecord>) {
        if self.inner.observers.read().is_empty() {
            return;
        }
        self.inner.pending.lock().push_back(batch);
        self.flush_mutations();
    }

    fn flush_mutations(&self) {
        loop {
            if self.inner.delivering.swap(true, Ordering::AcqRel) {
                // The active delivery loop picks the batch up.
                return;
            }
            {
                let _reset = DeliveryGuard(&self.inner.delivering);
                while let Some(batch) = self.next_batch() {
                    let observers: Vec<ObserverFn> =
                        self.inner.observers.read().iter().map(|(_, f)| f.clone()).collect();
                    trace!(records = batch.len(), observers = observers.len(), "Delivering mutations");
                    for observer in observers {
                        observer(&batch);
                    }
                }
            }
            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }

    fn next_batch(&self) -> Option<Vec<MutationRecord>> {
        self.inner.pending.lock().pop_front()
    }

    // --- Events ---

    /// Dispatches `event` at `target`, bubbling through its ancestors.
    pub fn dispatch(&self, target: &Element, event: DomEvent) -> DispatchOutcome {
        let kind = event.kind();
        let event = Event::new(event, target.clone());
        let mut listeners_run = 0;

        let mut current = Some(target.clone());
        while let Some(node) = current {
            for listener in node.listeners_for(kind) {
                listener(&event);
                listeners_run += 1;
            }
            if event.propagation_stopped() {
                break;
            }
            current = node.parent();
        }

        trace!(?target, ?kind, listeners_run, prevented = event.default_prevented(), "Event dispatched");
        DispatchOutcome { default_prevented: event.default_prevented(), listeners_run }
    }
}

struct DeliveryGuard<'a>(&'a AtomicBool);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WeakDocument {
    #[must_use]
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(Document::from_inner)
    }

    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.inner.id)
            .field("location", &self.location().as_str())
            .field("observers", &self.inner.observers.read().len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDocument").field("id", &self.id).finish_non_exhaustive()
    }
}
