use crate::applier::ResponseApplier;
use crate::dispatcher::RequestDispatcher;
use crate::error::{ExchangeError, FailureKind};
use crate::form::{collect_payload, form_action, form_method, submit_controls};
use crate::request::NavigationRequest;
use crate::transport::Transport;
use fxhash::FxHashMap;
use http::Method;
use ln_dom::{Document, DomEvent, Element, Event, EventKind, NodeId, WeakDocument, WeakElement};
use ln_domain::config::{DedupePolicy, EnhancerConfig, FormHistoryPolicy};
use ln_domain::constants::{FEATURE_AJAX_FORM, FEATURE_AJAX_LINK};
use ln_domain::navigation::NavigationResponse;
use ln_domain::notification::NotificationEvent;
use ln_event_bus::EventBus;
use ln_lifecycle::{Feature, Matcher, MutationWatcher};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, trace, warn};
use url::Url;

/// How an activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The response was applied to the document.
    Applied,
    /// The exchange failed; nothing but the notification was applied.
    Failed(FailureKind),
    /// The element already had an exchange in flight; nothing was sent.
    Ignored,
}

/// Published on the bus after every intercepted activation has finished, once the
/// loading class is cleared and submit controls are re-enabled.
#[derive(Debug, Clone)]
pub struct ExchangeSettled {
    pub element: WeakElement,
    /// Dispatch sequence number; `None` when nothing was sent.
    pub seq: Option<u64>,
    pub outcome: ExchangeOutcome,
}

struct InFlight {
    count: usize,
    disabled: Vec<WeakElement>,
}

struct ControllerInner<T> {
    document: WeakDocument,
    config: EnhancerConfig,
    bus: EventBus,
    dispatcher: RequestDispatcher<T>,
    applier: ResponseApplier,
    in_flight: Mutex<FxHashMap<NodeId, InFlight>>,
    pending: AtomicUsize,
    idle: Notify,
    next_seq: AtomicU64,
}

/// Intercepts clicks on enhanced links and submissions of enhanced forms.
///
/// An element is enhanced when its nearest ancestor-or-self carrying the ajax marker
/// does not set it to the opt-out value. Links whose `href` contains `#` are left alone.
///
/// Interception needs a Tokio runtime on the dispatching thread; without one the
/// default action proceeds.
pub struct NavigationController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for NavigationController<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> fmt::Debug for NavigationController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("document", &self.inner.document)
            .field("pending", &self.inner.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T: Transport> NavigationController<T> {
    pub fn new(document: &Document, config: EnhancerConfig, bus: EventBus, transport: T) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                document: document.downgrade(),
                config,
                bus,
                dispatcher: RequestDispatcher::new(transport),
                applier: ResponseApplier::new(),
                in_flight: Mutex::new(FxHashMap::default()),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Registers the link and form features with `watcher`.
    pub fn install(&self, watcher: &MutationWatcher) {
        watcher.register(self.link_feature());
        watcher.register(self.form_feature());
    }

    #[must_use]
    pub fn link_feature(&self) -> Feature {
        let (marker, opt_out) = self.scope_markers();
        let weak = Arc::downgrade(&self.inner);
        let matcher = Matcher::custom(move |element| {
            element.tag() == "a"
                && !element.attr("href").is_some_and(|href| href.contains('#'))
                && in_scope(element, &marker, &opt_out)
        });

        Feature::new(FEATURE_AJAX_LINK, matcher, move |link| {
            bind(&weak, link, EventKind::Click, FEATURE_AJAX_LINK, ControllerInner::on_link_click);
        })
    }

    #[must_use]
    pub fn form_feature(&self) -> Feature {
        let (marker, opt_out) = self.scope_markers();
        let weak = Arc::downgrade(&self.inner);
        let matcher =
            Matcher::custom(move |element| element.tag() == "form" && in_scope(element, &marker, &opt_out));

        Feature::new(FEATURE_AJAX_FORM, matcher, move |form| {
            bind(&weak, form, EventKind::Submit, FEATURE_AJAX_FORM, ControllerInner::on_form_submit);
        })
    }

    /// Number of exchanges currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Resolves once no exchange is in flight.
    pub async fn idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &RequestDispatcher<T> {
        &self.inner.dispatcher
    }

    fn scope_markers(&self) -> (String, String) {
        let ajax = &self.inner.config.ajax;
        (ajax.marker.clone(), ajax.opt_out.clone())
    }
}

/// The nearest ancestor-or-self carrying `marker` decides.
fn in_scope(element: &Element, marker: &str, opt_out: &str) -> bool {
    element
        .closest(|e| e.has_attr(marker))
        .and_then(|scope| scope.attr(marker))
        .is_some_and(|value| !value.trim().eq_ignore_ascii_case(opt_out))
}

fn bind<T: Transport>(
    weak: &Weak<ControllerInner<T>>,
    element: &Element,
    kind: EventKind,
    owner: &'static str,
    handler: fn(&Arc<ControllerInner<T>>, &Element, &Event),
) {
    let controller = weak.clone();
    let bound = element.downgrade();
    element.add_listener(kind, owner, move |event| {
        if let (Some(inner), Some(element)) = (controller.upgrade(), bound.upgrade()) {
            handler(&inner, &element, event);
        }
    });
}

impl<T: Transport> ControllerInner<T> {
    fn on_link_click(self: &Arc<Self>, link: &Element, event: &Event) {
        let DomEvent::Click(click) = event.data() else { return };
        if event.default_prevented() {
            return;
        }
        if click.opens_new_context() {
            trace!(?link, "Click opens a new context; not intercepted");
            return;
        }
        let href = link.attr("href");
        if href.as_deref().is_some_and(|h| h.contains('#')) {
            return;
        }
        let Some(runtime) = current_runtime() else { return };

        event.prevent_default();
        let Some(href) = href.map(|h| h.trim().to_owned()).filter(|h| !h.is_empty()) else {
            debug!(?link, "Link without href; nothing to load");
            return;
        };
        if self.is_busy(link) {
            self.ignore(link);
            return;
        }
        let Some(document) = self.document.upgrade() else { return };

        let url = match document.resolve_url(&href) {
            Ok(url) => url,
            Err(err) => return self.reject(link, err.into()),
        };
        let request = NavigationRequest::build(
            Method::GET,
            url.clone(),
            None,
            self.csrf_token(&document),
            &self.config.ajax.csrf_field,
        );
        self.start(&runtime, link, request, Some(url), Vec::new());
    }

    fn on_form_submit(self: &Arc<Self>, form: &Element, event: &Event) {
        if event.data() != &DomEvent::Submit || event.target() != form || event.default_prevented() {
            return;
        }
        let Some(runtime) = current_runtime() else { return };

        event.prevent_default();
        if self.is_busy(form) {
            self.ignore(form);
            return;
        }
        let Some(document) = self.document.upgrade() else { return };

        let method = form_method(form);
        let action = match form_action(&document, form) {
            Ok(action) => action,
            Err(err) => return self.reject(form, err.into()),
        };
        let request = NavigationRequest::build(
            method,
            action,
            Some(collect_payload(form)),
            self.csrf_token(&document),
            &self.config.ajax.csrf_field,
        );
        let history = (request.method == Method::GET
            && self.config.ajax.form_history == FormHistoryPolicy::GetOnly)
            .then(|| request.url.clone());

        let disabled = submit_controls(form)
            .into_iter()
            .filter(|control| !control.is_disabled())
            .map(|control| {
                control.set_disabled(true);
                control.downgrade()
            })
            .collect();

        self.start(&runtime, form, request, history, disabled);
    }

    fn csrf_token(&self, document: &Document) -> Option<String> {
        document.query_meta(&self.config.ajax.csrf_meta).filter(|token| !token.is_empty())
    }

    fn is_busy(&self, element: &Element) -> bool {
        self.config.ajax.dedupe == DedupePolicy::IgnoreWhileLoading
            && self.in_flight.lock().contains_key(&element.node_id())
    }

    fn start(
        self: &Arc<Self>,
        runtime: &Handle,
        element: &Element,
        request: NavigationRequest,
        history: Option<Url>,
        disabled: Vec<WeakElement>,
    ) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(seq, ?element, method = %request.method, url = %request.url, "Navigation exchange started");

        let mut guard = self.begin(element, seq, disabled);
        let inner = self.clone();
        runtime.spawn(async move {
            let result = inner.dispatcher.dispatch(&request).await;
            guard.outcome = inner.finish(result, seq, history);
        });
    }

    fn begin(self: &Arc<Self>, element: &Element, seq: u64, disabled: Vec<WeakElement>) -> ExchangeGuard<T> {
        element.add_class(&self.config.ajax.loading_class);
        self.in_flight
            .lock()
            .entry(element.node_id())
            .or_insert_with(|| InFlight { count: 0, disabled: Vec::new() })
            .register(disabled);
        self.pending.fetch_add(1, Ordering::AcqRel);

        ExchangeGuard {
            inner: self.clone(),
            element: element.downgrade(),
            seq,
            outcome: ExchangeOutcome::Failed(FailureKind::Internal),
        }
    }

    fn finish(
        &self,
        result: Result<NavigationResponse, ExchangeError>,
        seq: u64,
        history: Option<Url>,
    ) -> ExchangeOutcome {
        let Some(document) = self.document.upgrade() else {
            debug!(seq, "Document dropped before the response arrived");
            return ExchangeOutcome::Failed(FailureKind::Internal);
        };
        match result {
            Ok(response) => {
                self.applier.apply(&document, &self.bus, response, seq, history);
                ExchangeOutcome::Applied
            },
            Err(err) => {
                self.report(&err);
                ExchangeOutcome::Failed(err.kind())
            },
        }
    }

    /// Logs the failure and forwards a best-effort notification.
    fn report(&self, err: &ExchangeError) {
        match err {
            ExchangeError::Status { .. } => warn!(error = %err, "Navigation exchange failed"),
            _ => error!(error = %err, "Navigation exchange failed"),
        }
        let notification = err
            .response()
            .and_then(|response| response.message.clone())
            .map_or_else(|| NotificationEvent::error(err.to_string()), NotificationEvent::from);
        let _ = self.bus.publish(notification);
    }

    /// A failure before anything was sent.
    fn reject(&self, element: &Element, err: ExchangeError) {
        self.report(&err);
        self.settle(element.downgrade(), None, ExchangeOutcome::Failed(err.kind()));
    }

    fn ignore(&self, element: &Element) {
        debug!(?element, "Exchange already in flight; activation ignored");
        self.settle(element.downgrade(), None, ExchangeOutcome::Ignored);
    }

    fn settle(&self, element: WeakElement, seq: Option<u64>, outcome: ExchangeOutcome) {
        let _ = self.bus.publish(ExchangeSettled { element, seq, outcome });
    }
}

impl InFlight {
    fn register(&mut self, disabled: Vec<WeakElement>) {
        self.count += 1;
        self.disabled.extend(disabled);
    }
}

fn current_runtime() -> Option<Handle> {
    match Handle::try_current() {
        Ok(handle) => Some(handle),
        Err(_) => {
            warn!("No async runtime on this thread; default navigation proceeds");
            None
        },
    }
}

/// Restores the element when an exchange ends, however it ends.
struct ExchangeGuard<T: Transport> {
    inner: Arc<ControllerInner<T>>,
    element: WeakElement,
    seq: u64,
    outcome: ExchangeOutcome,
}

impl<T: Transport> Drop for ExchangeGuard<T> {
    fn drop(&mut self) {
        let id = self.element.node_id();
        let finished = {
            let mut in_flight = self.inner.in_flight.lock();
            let done = in_flight.get_mut(&id).is_some_and(|entry| {
                entry.count = entry.count.saturating_sub(1);
                entry.count == 0
            });
            if done { in_flight.remove(&id) } else { None }
        };

        if let Some(finished) = finished {
            if let Some(element) = self.element.upgrade() {
                element.remove_class(&self.inner.config.ajax.loading_class);
            }
            for control in finished.disabled.iter().filter_map(WeakElement::upgrade) {
                control.set_disabled(false);
            }
        }

        debug!(seq = self.seq, outcome = ?self.outcome, "Navigation exchange settled");
        self.inner.settle(self.element.clone(), Some(self.seq), self.outcome);

        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
