mod common;

use common::Harness;
use http::{Method, StatusCode};
use ln_ajax::{ExchangeOutcome, ExchangeSettled, FailureKind};
use ln_dom::{Click, MouseButton, Url};
use ln_domain::constants::FEATURE_AJAX_LINK;
use ln_domain::notification::{NotificationEvent, NotificationKind};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

const PAGE: &str = r#"
<div data-ln-ajax>
  <a id="go" href="/next">Next</a>
  <a id="hash" href="/next#part">Part</a>
  <a id="plain" href="/plain" data-ln-ajax="false">Plain</a>
  <a id="broken" href="http://[::1">Broken</a>
  <div id="main">old</div>
</div>
<a id="outside" href="/outside">Outside</a>
"#;

fn collect<T: Clone + Send + Sync + 'static>(harness: &Harness) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    harness.bus.listen::<T, _>(move |event| sink.lock().push(event.clone())).unwrap();
    seen
}

#[tokio::test]
async fn primary_click_loads_response_into_page() {
    let harness = Harness::new(PAGE);
    harness.transport.reply_json(json!({
        "title": "Next",
        "content": { "main": "<p>new</p>" }
    }));

    assert!(harness.click("go"));
    assert!(harness.el("go").has_class("ln-ajax--loading"));
    harness.settle().await;

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].url.as_str(), "https://example.test/next");
    assert_eq!(requests[0].headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
    assert_eq!(requests[0].headers.get("x-csrf-token").unwrap(), "tok-123");

    assert_eq!(harness.document.title(), "Next");
    assert_eq!(harness.el("main").inner_html(), "<p>new</p>");
    assert_eq!(harness.document.location().as_str(), "https://example.test/next");
    assert_eq!(harness.document.history_len(), 2);
    assert!(!harness.el("go").has_class("ln-ajax--loading"));
}

#[tokio::test]
async fn modified_secondary_and_middle_clicks_are_left_to_the_browser() {
    let harness = Harness::new(PAGE);

    assert!(!harness.click_with("go", Click::primary().with_ctrl()));
    assert!(!harness.click_with("go", Click::primary().with_meta()));
    assert!(!harness.click_with("go", Click::primary().with_button(MouseButton::Auxiliary)));
    assert!(!harness.click_with("go", Click::primary().with_button(MouseButton::Secondary)));
    harness.settle().await;

    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn fragment_links_opted_out_links_and_unscoped_links_are_not_bound() {
    let harness = Harness::new(PAGE);

    for id in ["hash", "plain", "outside"] {
        assert!(!harness.watcher.is_attached(&harness.el(id), FEATURE_AJAX_LINK), "{id}");
        assert!(!harness.click(id), "{id}");
    }
    assert!(harness.watcher.is_attached(&harness.el("go"), FEATURE_AJAX_LINK));
    harness.settle().await;
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn links_inserted_later_are_enhanced() {
    let harness = Harness::new(PAGE);
    harness.el("main").set_inner_html(r#"<a id="late" href="/late">Late</a>"#);

    assert!(harness.click("late"));
    harness.settle().await;
    assert_eq!(harness.transport.requests()[0].url.as_str(), "https://example.test/late");
}

#[test]
fn without_a_runtime_the_default_action_proceeds() {
    let harness = Harness::new(PAGE);
    assert!(!harness.click("go"));
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn missing_target_leaves_the_page_untouched() {
    let harness = Harness::new(PAGE);
    let before = harness.document.body().inner_html();
    harness.transport.reply_json(json!({ "content": { "missing-id": "<p>x</p>" } }));

    harness.click("go");
    harness.settle().await;

    assert_eq!(harness.document.body().inner_html(), before);
    assert_eq!(harness.document.title(), "Start");
}

#[tokio::test]
async fn failed_status_only_notifies_and_restores_the_link() {
    let harness = Harness::new(PAGE);
    let notes = collect::<NotificationEvent>(&harness);
    let settled = collect::<ExchangeSettled>(&harness);
    harness.transport.reply_status(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"title":"Ignored","content":{"main":"bad"},"message":{"type":"error","title":"Invalid","body":"Nope"}}"#,
    );

    harness.click("go");
    harness.settle().await;

    assert_eq!(harness.document.title(), "Start");
    assert_eq!(harness.el("main").text_content(), "old");
    assert_eq!(harness.document.location().as_str(), "https://example.test/start");
    assert!(!harness.el("go").has_class("ln-ajax--loading"));

    let notes = notes.lock();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert_eq!(notes[0].title.as_deref(), Some("Invalid"));
    assert_eq!(notes[0].message.as_deref(), Some("Nope"));

    let settled = settled.lock();
    assert_eq!(
        settled[0].outcome,
        ExchangeOutcome::Failed(FailureKind::Status(StatusCode::UNPROCESSABLE_ENTITY))
    );
}

#[tokio::test]
async fn network_failure_produces_a_generic_error() {
    let harness = Harness::new(PAGE);
    let notes = collect::<NotificationEvent>(&harness);
    harness.transport.reply_network_error();

    harness.click("go");
    harness.settle().await;

    let notes = notes.lock();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert!(notes[0].message.as_deref().unwrap().contains("connection refused"));
    assert_eq!(harness.el("main").text_content(), "old");
}

#[tokio::test]
async fn malformed_success_body_is_a_failure() {
    let harness = Harness::new(PAGE);
    let settled = collect::<ExchangeSettled>(&harness);
    harness.transport.reply_status(StatusCode::OK, "<html>not json</html>");

    harness.click("go");
    harness.settle().await;

    assert_eq!(settled.lock()[0].outcome, ExchangeOutcome::Failed(FailureKind::Malformed));
    assert_eq!(harness.document.history_len(), 1);
}

#[tokio::test]
async fn unresolvable_href_is_rejected_without_sending() {
    let harness = Harness::new(PAGE);
    let settled = collect::<ExchangeSettled>(&harness);

    assert!(harness.click("broken"));
    harness.settle().await;

    assert_eq!(harness.transport.request_count(), 0);
    let settled = settled.lock();
    assert_eq!(settled[0].outcome, ExchangeOutcome::Failed(FailureKind::InvalidUrl));
    assert_eq!(settled[0].seq, None);
}

#[tokio::test]
async fn activations_while_loading_are_ignored() {
    let harness = Harness::new(PAGE);
    let settled = collect::<ExchangeSettled>(&harness);

    assert!(harness.click("go"));
    assert!(harness.click("go"));
    harness.settle().await;
    assert_eq!(harness.transport.request_count(), 1);

    let outcomes: Vec<_> = settled.lock().iter().map(|s| s.outcome).collect();
    assert_eq!(outcomes, vec![ExchangeOutcome::Ignored, ExchangeOutcome::Applied]);

    harness.click("go");
    harness.settle().await;
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn last_sent_request_wins_regardless_of_arrival() {
    let body = r#"<div data-ln-ajax>
        <a id="first" href="/first">1</a>
        <a id="second" href="/second">2</a>
        <div id="main">old</div>
    </div>"#;
    let harness = Harness::new(body);
    harness.transport.reply_json_after(
        json!({ "title": "First", "content": { "main": "first" } }),
        std::time::Duration::from_millis(200),
    );
    harness.transport.reply_json_after(
        json!({ "title": "Second", "content": { "main": "second" } }),
        std::time::Duration::from_millis(10),
    );

    harness.click("first");
    harness.click("second");
    harness.settle().await;

    assert_eq!(harness.el("main").text_content(), "second");
    assert_eq!(harness.document.title(), "Second");
    assert_eq!(harness.document.location(), Url::parse("https://example.test/second").unwrap());
}
