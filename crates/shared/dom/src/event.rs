use crate::node::Element;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which mouse button produced a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Primary,
    /// Usually the wheel/middle button.
    Auxiliary,
    Secondary,
}

/// Button and modifier state of a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Click {
    pub button: MouseButton,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Click {
    /// A plain primary-button click.
    #[must_use]
    pub fn primary() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    #[must_use]
    pub const fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub const fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Whether the user asked to open the target in a new tab or window.
    #[must_use]
    pub fn opens_new_context(&self) -> bool {
        self.button != MouseButton::Primary || self.ctrl || self.meta
    }
}

/// An event a host forwards into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Click(Click),
    Submit,
}

impl DomEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Click(_) => EventKind::Click,
            Self::Submit => EventKind::Submit,
        }
    }
}

/// The kind a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
}

/// The event as seen by a listener during dispatch.
pub struct Event {
    data: DomEvent,
    target: Element,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
}

impl Event {
    pub(crate) const fn new(data: DomEvent, target: Element) -> Self {
        Self {
            data,
            target,
            default_prevented: AtomicBool::new(false),
            propagation_stopped: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn data(&self) -> &DomEvent {
        &self.data
    }

    /// The element the event was dispatched on.
    #[must_use]
    pub const fn target(&self) -> &Element {
        &self.target
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Acquire)
    }

    /// Stops bubbling after the listeners of the current element have run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::Release);
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("data", &self.data)
            .field("target", &self.target)
            .field("default_prevented", &self.default_prevented())
            .finish_non_exhaustive()
    }
}

/// What happened during [`crate::Document::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// `true` when some listener cancelled the default action.
    pub default_prevented: bool,
    pub listeners_run: usize,
}

pub(crate) type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) kind: EventKind,
    pub(crate) owner: &'static str,
    pub(crate) callback: Callback,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("kind", &self.kind).field("owner", &self.owner).finish()
    }
}
