use crate::document::{Document, DocumentInner, MutationRecord};
use crate::error::DomError;
use crate::event::{Callback, EventKind, Listener};
use crate::html::{self, Parsed};
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Identity of a node inside its document. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Element(String),
    Text,
    Comment,
}

#[derive(Default)]
struct NodeState {
    attrs: Vec<(String, String)>,
    data: String,
    parent: Option<Weak<NodeData>>,
    children: Vec<Element>,
    listeners: Vec<Listener>,
}

pub(crate) struct NodeData {
    id: NodeId,
    kind: NodeKind,
    document: Weak<DocumentInner>,
    state: RwLock<NodeState>,
}

/// A strong handle to a node of a [`Document`].
///
/// Cloning is cheap. Equality is identity: two handles are equal only when they point
/// at the same node, even if both nodes carry identical markup.
///
/// Text and comment nodes share this handle type; [`Element::is_element`] tells them
/// apart and most element operations are no-ops on them.
#[derive(Clone)]
pub struct Element(pub(crate) Arc<NodeData>);

/// A non-owning handle. Does not keep the node alive.
#[derive(Clone)]
pub struct WeakElement {
    id: NodeId,
    ptr: Weak<NodeData>,
}

impl Element {
    pub(crate) fn create(document: Weak<DocumentInner>, id: NodeId, kind: NodeKind) -> Self {
        Self(Arc::new(NodeData { id, kind, document, state: RwLock::new(NodeState::default()) }))
    }

    pub(crate) fn create_character_data(
        document: Weak<DocumentInner>,
        id: NodeId,
        kind: NodeKind,
        data: String,
    ) -> Self {
        let node = Self::create(document, id, kind);
        node.0.state.write().data = data;
        node
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.0.id
    }

    /// Lowercase tag name, `#text` or `#comment`.
    #[must_use]
    pub fn tag(&self) -> &str {
        match &self.0.kind {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => "#text",
            NodeKind::Comment => "#comment",
        }
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element(_))
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.0.kind == NodeKind::Text
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement { id: self.0.id, ptr: Arc::downgrade(&self.0) }
    }

    #[must_use]
    pub fn owner_document(&self) -> Option<Document> {
        self.0.document.upgrade().map(Document::from_inner)
    }

    // --- Attributes ---

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.0.state.read().attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.0.state.read().attrs.iter().any(|(k, _)| *k == name)
    }

    pub fn set_attr(&self, name: &str, value: impl Into<String>) {
        if !self.is_element() {
            return;
        }
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let mut state = self.0.state.write();
        match state.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => state.attrs.push((name, value)),
        }
    }

    /// Returns `true` when the attribute existed.
    pub fn remove_attr(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let mut state = self.0.state.write();
        let before = state.attrs.len();
        state.attrs.retain(|(k, _)| *k != name);
        before != state.attrs.len()
    }

    /// Attributes in source order.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.state.read().attrs.clone()
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.attr("id")
    }

    // --- Class list ---

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class").is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&self, class: &str) {
        if class.is_empty() || self.has_class(class) {
            return;
        }
        let list = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attr("class", list);
    }

    pub fn remove_class(&self, class: &str) {
        let Some(existing) = self.attr("class") else { return };
        if !existing.split_ascii_whitespace().any(|c| c == class) {
            return;
        }
        let list: Vec<&str> = existing.split_ascii_whitespace().filter(|c| *c != class).collect();
        self.set_attr("class", list.join(" "));
    }

    // --- Form controls ---

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled")
    }

    pub fn set_disabled(&self, disabled: bool) {
        if disabled {
            self.set_attr("disabled", "");
        } else {
            self.remove_attr("disabled");
        }
    }

    // --- Tree ---

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.state.read().parent.as_ref().and_then(Weak::upgrade).map(Self)
    }

    /// Element children, skipping text and comments.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.0.state.read().children.iter().filter(|c| c.is_element()).cloned().collect()
    }

    /// Every child node, including text and comments.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Self> {
        self.0.state.read().children.clone()
    }

    /// Descendant elements in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.child_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if !node.is_element() {
                continue;
            }
            stack.extend(node.child_nodes().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// `self` followed by its descendant elements, in document order.
    #[must_use]
    pub fn inclusive_descendants(&self) -> Vec<Self> {
        let mut out = Vec::with_capacity(1);
        if self.is_element() {
            out.push(self.clone());
        }
        out.extend(self.descendants());
        out
    }

    /// First descendant element matching `pred`.
    pub fn find(&self, pred: impl Fn(&Self) -> bool) -> Option<Self> {
        self.descendants().into_iter().find(|e| pred(e))
    }

    /// Every descendant element matching `pred`, in document order.
    pub fn find_all(&self, pred: impl Fn(&Self) -> bool) -> Vec<Self> {
        self.descendants().into_iter().filter(|e| pred(e)).collect()
    }

    /// Nearest ancestor-or-self matching `pred`.
    pub fn closest(&self, pred: impl Fn(&Self) -> bool) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.is_element() && pred(&node) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Whether the node is part of its document's tree.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let Some(document) = self.0.document.upgrade() else { return false };
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current == document.root
    }

    /// Appends `child`, moving it out of its current parent first.
    ///
    /// # Errors
    /// Returns [`DomError::HierarchyRequest`] if `self` is not an element, if `child`
    /// belongs to another document, or if `child` is an inclusive ancestor of `self`.
    pub fn append_child(&self, child: &Self) -> Result<(), DomError> {
        self.validate_insertion(child)?;

        let mut records = Vec::with_capacity(2);
        if let Some(old_parent) = child.parent() {
            old_parent.detach_child(child);
            if old_parent.is_connected() {
                records.push(MutationRecord::removed(&old_parent, vec![child.clone()]));
            }
        }

        child.0.state.write().parent = Some(Arc::downgrade(&self.0));
        self.0.state.write().children.push(child.clone());

        if self.is_connected() {
            records.push(MutationRecord::added(self, vec![child.clone()]));
        }
        self.notify(records);
        Ok(())
    }

    /// Removes `child` from this element.
    ///
    /// # Errors
    /// Returns [`DomError::NotFound`] if `child` is not a child of `self`.
    pub fn remove_child(&self, child: &Self) -> Result<Self, DomError> {
        if child.parent().as_ref() != Some(self) {
            return Err(DomError::NotFound {
                message: format!("{child:?} is not a child of {self:?}").into(),
                context: None,
            });
        }
        let connected = self.is_connected();
        self.detach_child(child);
        if connected {
            self.notify(vec![MutationRecord::removed(self, vec![child.clone()])]);
        }
        Ok(child.clone())
    }

    /// Detaches `self` from its parent. A no-op for detached nodes.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            let _ = parent.remove_child(self);
        }
    }

    /// Replaces every child with the nodes parsed from `html`.
    ///
    /// The replacement is reported as a single mutation record.
    pub fn set_inner_html(&self, html: &str) {
        if !self.is_element() {
            return;
        }
        let Some(document) = self.0.document.upgrade() else { return };
        let fresh = Document::from_inner(document).adopt(html::parse_fragment(html));
        self.replace_children(fresh);
    }

    /// Replaces every child with a single text node.
    pub fn set_text_content(&self, text: &str) {
        if !self.is_element() {
            self.0.state.write().data = text.to_owned();
            return;
        }
        let Some(document) = self.0.document.upgrade() else { return };
        let fresh = if text.is_empty() {
            Vec::new()
        } else {
            vec![Document::from_inner(document).create_text(text)]
        };
        self.replace_children(fresh);
    }

    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let raw = html::keeps_raw_text(self.tag());
        for child in self.child_nodes() {
            child.serialize_into(&mut out, raw);
        }
        out
    }

    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.serialize_into(&mut out, false);
        out
    }

    /// Concatenated text of every descendant text node.
    #[must_use]
    pub fn text_content(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment => self.0.state.read().data.clone(),
            NodeKind::Element(_) => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            },
        }
    }

    // --- Listeners ---

    /// Registers `callback` for events of `kind` under `owner`.
    ///
    /// Callbacks must not hold a strong [`Document`] or [`Element`] handle to an
    /// ancestor; capture a [`WeakElement`] instead.
    pub fn add_listener<F>(&self, kind: EventKind, owner: &'static str, callback: F)
    where
        F: Fn(&crate::Event) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.0.state.write().listeners.push(Listener { kind, owner, callback });
    }

    /// Drops every listener registered under `owner`; returns how many were removed.
    pub fn remove_listeners(&self, owner: &str) -> usize {
        let mut state = self.0.state.write();
        let before = state.listeners.len();
        state.listeners.retain(|listener| listener.owner != owner);
        before - state.listeners.len()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.0.state.read().listeners.len()
    }

    pub(crate) fn listeners_for(&self, kind: EventKind) -> Vec<Callback> {
        self.0
            .state
            .read()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| listener.callback.clone())
            .collect()
    }

    // --- Internals ---

    fn validate_insertion(&self, child: &Self) -> Result<(), DomError> {
        if !self.is_element() {
            return Err(DomError::HierarchyRequest {
                message: format!("{self:?} cannot have children").into(),
                context: None,
            });
        }
        if !Weak::ptr_eq(&self.0.document, &child.0.document) {
            return Err(DomError::HierarchyRequest {
                message: format!("{child:?} belongs to another document").into(),
                context: None,
            });
        }
        if child.contains(self) {
            return Err(DomError::HierarchyRequest {
                message: format!("{child:?} is an ancestor of {self:?}").into(),
                context: None,
            });
        }
        Ok(())
    }

    fn detach_child(&self, child: &Self) {
        self.0.state.write().children.retain(|existing| existing != child);
        child.0.state.write().parent = None;
    }

    fn replace_children(&self, fresh: Vec<Self>) {
        let removed = std::mem::take(&mut self.0.state.write().children);
        for old in &removed {
            old.0.state.write().parent = None;
        }
        for node in &fresh {
            node.0.state.write().parent = Some(Arc::downgrade(&self.0));
        }
        self.0.state.write().children.clone_from(&fresh);

        if (!removed.is_empty() || !fresh.is_empty()) && self.is_connected() {
            self.notify(vec![MutationRecord { target: self.clone(), added: fresh, removed }]);
        }
    }

    fn notify(&self, records: Vec<MutationRecord>) {
        if records.is_empty() {
            return;
        }
        if let Some(document) = self.0.document.upgrade() {
            Document::from_inner(document).queue_mutations(records);
        }
    }

    pub(crate) fn push_child_unchecked(&self, child: &Self) {
        child.0.state.write().parent = Some(Arc::downgrade(&self.0));
        self.0.state.write().children.push(child.clone());
    }

    pub(crate) fn set_attrs_unchecked(&self, attrs: Vec<(String, String)>) {
        self.0.state.write().attrs = attrs;
    }

    fn collect_text(&self, out: &mut String) {
        let mut stack: Vec<Self> = self.child_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node.0.kind {
                NodeKind::Text => out.push_str(&node.0.state.read().data),
                NodeKind::Comment => {},
                NodeKind::Element(_) => stack.extend(node.child_nodes().into_iter().rev()),
            }
        }
    }

    fn serialize_into(&self, out: &mut String, raw_text: bool) {
        let mut stack = vec![Step::Node(self.clone(), raw_text)];
        while let Some(step) = stack.pop() {
            let (node, raw) = match step {
                Step::Close(tag) => {
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push('>');
                    continue;
                },
                Step::Node(node, raw) => (node, raw),
            };
            match &node.0.kind {
                NodeKind::Text => {
                    let state = node.0.state.read();
                    if raw {
                        out.push_str(&state.data);
                    } else {
                        html::escape_text(&state.data, out);
                    }
                },
                NodeKind::Comment => {
                    out.push_str("<!--");
                    out.push_str(&node.0.state.read().data);
                    out.push_str("-->");
                },
                NodeKind::Element(tag) => {
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in node.attributes() {
                        out.push(' ');
                        out.push_str(&name);
                        out.push_str("=\"");
                        html::escape_attr(&value, out);
                        out.push('"');
                    }
                    out.push('>');
                    if html::is_void(tag) {
                        continue;
                    }
                    stack.push(Step::Close(tag.clone()));
                    let raw = html::keeps_raw_text(tag);
                    stack.extend(node.child_nodes().into_iter().rev().map(|child| Step::Node(child, raw)));
                },
            }
        }
    }
}

/// Pending work for [`Element::serialize_into`].
enum Step {
    Node(Element, bool),
    Close(String),
}

impl Drop for NodeData {
    /// Unlinks uniquely owned subtrees level by level so deep trees drop without recursion.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.state.get_mut().children);
        while let Some(child) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                pending.append(&mut data.state.get_mut().children);
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "<{}#{id}>{}", self.tag(), self.0.id),
            None => write!(f, "<{}>{}", self.tag(), self.0.id),
        }
    }
}

impl WeakElement {
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.ptr.upgrade().map(Element)
    }

    /// Identity of the node this handle points at, even after it was dropped.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.ptr.strong_count() > 0
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakElement").field("id", &self.id).field("alive", &self.is_alive()).finish()
    }
}

/// Builds detached nodes from parsed markup.
pub(crate) fn materialize(document: &Document, parsed: Parsed) -> Element {
    match parsed {
        Parsed::Text(text) => document.create_text(&text),
        Parsed::Comment(text) => document.create_comment(&text),
        Parsed::Element { tag, attrs, children } => {
            let element = document.create_element(&tag);
            element.set_attrs_unchecked(attrs);
            for child in children {
                element.push_child_unchecked(&materialize(document, child));
            }
            element
        },
    }
}
