#![allow(dead_code)]

use http::StatusCode;
use ln_ajax::{ExchangeError, NavigationController, NavigationRequest, Transport, TransportResponse};
use ln_dom::{Click, Document, DomEvent, Element};
use ln_domain::config::EnhancerConfig;
use ln_event_bus::EventBus;
use ln_lifecycle::MutationWatcher;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

enum Reply {
    Response(TransportResponse),
    Network,
}

struct Scripted {
    reply: Reply,
    delay: Duration,
}

#[derive(Default)]
struct FakeInner {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<NavigationRequest>>,
}

/// Replays queued replies in order and records every request. An empty script answers
/// `200 {}`.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<FakeInner>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_json(&self, value: Value) -> &Self {
        self.push(Reply::Response(TransportResponse::json(&value)), Duration::ZERO)
    }

    pub fn reply_json_after(&self, value: Value, delay: Duration) -> &Self {
        self.push(Reply::Response(TransportResponse::json(&value)), delay)
    }

    pub fn reply_status(&self, status: StatusCode, body: &str) -> &Self {
        self.push(Reply::Response(TransportResponse::new(status, body)), Duration::ZERO)
    }

    pub fn reply_network_error(&self) -> &Self {
        self.push(Reply::Network, Duration::ZERO)
    }

    fn push(&self, reply: Reply, delay: Duration) -> &Self {
        self.inner.script.lock().push_back(Scripted { reply, delay });
        self
    }

    pub fn requests(&self) -> Vec<NavigationRequest> {
        self.inner.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: &NavigationRequest) -> Result<TransportResponse, ExchangeError> {
        self.inner.requests.lock().push(request.clone());
        let next = self.inner.script.lock().pop_front();
        let Some(Scripted { reply, delay }) = next else {
            return Ok(TransportResponse::new(StatusCode::OK, "{}"));
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Network => {
                Err(ExchangeError::Network { message: "connection refused".into(), context: None })
            },
        }
    }
}

pub struct Harness {
    pub document: Document,
    pub bus: EventBus,
    pub transport: FakeTransport,
    pub controller: NavigationController<FakeTransport>,
    pub watcher: MutationWatcher,
}

impl Harness {
    pub fn new(body: &str) -> Self {
        Self::with_config(body, EnhancerConfig::default())
    }

    pub fn with_config(body: &str, config: EnhancerConfig) -> Self {
        let document = Document::parse(
            "https://example.test/start",
            r#"<title>Start</title><meta name="csrf-token" content="tok-123">"#,
            body,
        )
        .expect("valid document");
        let bus = EventBus::new();
        let transport = FakeTransport::new();
        let controller = NavigationController::new(&document, config, bus.clone(), transport.clone());
        let watcher = MutationWatcher::new(&document);
        controller.install(&watcher);

        Self { document, bus, transport, controller, watcher }
    }

    pub fn el(&self, id: &str) -> Element {
        self.document.get_element_by_id(id).expect("element exists")
    }

    pub fn click(&self, id: &str) -> bool {
        self.click_with(id, Click::primary())
    }

    /// Returns whether the default action was prevented.
    pub fn click_with(&self, id: &str, click: Click) -> bool {
        self.document.dispatch(&self.el(id), DomEvent::Click(click)).default_prevented
    }

    pub fn submit(&self, id: &str) -> bool {
        self.document.dispatch(&self.el(id), DomEvent::Submit).default_prevented
    }

    pub async fn settle(&self) {
        self.controller.idle().await;
    }
}
