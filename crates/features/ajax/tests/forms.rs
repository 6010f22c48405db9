mod common;

use common::Harness;
use http::Method;
use ln_domain::config::{DedupePolicy, EnhancerConfig, FormHistoryPolicy};
use serde_json::json;
use std::time::Duration;

const PAGE: &str = r#"
<main data-ln-ajax>
  <form id="search" action="/search">
    <input name="q" value="a b">
    <button id="search-go" type="submit">Go</button>
  </form>
  <form id="paged" action="/search?page=2" method="get">
    <input name="q" value="rust">
  </form>
  <form id="empty" action="/refresh"></form>
  <form id="save" action="/items" method="post">
    <input name="name" value="Widget">
    <input type="checkbox" name="agree" checked>
    <input type="checkbox" name="spam">
    <button id="save-go" type="submit">Save</button>
    <input id="save-alt" type="submit" value="Alt">
    <button id="save-off" type="submit" disabled>Off</button>
  </form>
  <form id="legacy" method="get" data-ln-ajax="false"></form>
  <div id="results">none</div>
</main>
"#;

#[tokio::test]
async fn get_form_encodes_payload_into_query_and_records_it() {
    let harness = Harness::new(PAGE);
    harness.transport.reply_json(json!({ "content": { "results": "<ul><li>a b</li></ul>" } }));

    assert!(harness.submit("search"));
    harness.settle().await;

    let request = &harness.transport.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.url.as_str(), "https://example.test/search?q=a+b");
    assert!(request.body.is_none());
    assert_eq!(harness.document.location().as_str(), "https://example.test/search?q=a+b");
    assert_eq!(harness.el("results").inner_html(), "<ul><li>a b</li></ul>");
}

#[tokio::test]
async fn get_payload_merges_with_existing_query() {
    let harness = Harness::new(PAGE);
    harness.submit("paged");
    harness.settle().await;
    assert_eq!(harness.transport.requests()[0].url.as_str(), "https://example.test/search?page=2&q=rust");
}

#[tokio::test]
async fn bodyless_requests_carry_the_token_as_a_header() {
    let harness = Harness::new(PAGE);
    harness.submit("empty");
    harness.settle().await;

    let request = &harness.transport.requests()[0];
    assert_eq!(request.url.as_str(), "https://example.test/refresh");
    assert_eq!(request.headers.get("x-csrf-token").unwrap(), "tok-123");
}

#[tokio::test]
async fn post_form_sends_body_with_token_and_keeps_location() {
    let harness = Harness::new(PAGE);
    harness.submit("save");
    harness.settle().await;

    let request = &harness.transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url.as_str(), "https://example.test/items");
    assert_eq!(request.encoded_body().unwrap(), "name=Widget&agree=on&_token=tok-123");
    assert!(request.headers.get("x-csrf-token").is_none());
    assert_eq!(harness.document.location().as_str(), "https://example.test/start");
    assert_eq!(harness.document.history_len(), 1);
}

#[tokio::test]
async fn submit_controls_are_disabled_while_loading() {
    let harness = Harness::new(PAGE);
    harness.submit("save");

    assert!(harness.el("save").has_class("ln-ajax--loading"));
    assert!(harness.el("save-go").is_disabled());
    assert!(harness.el("save-alt").is_disabled());

    harness.settle().await;
    assert!(!harness.el("save").has_class("ln-ajax--loading"));
    assert!(!harness.el("save-go").is_disabled());
    assert!(!harness.el("save-alt").is_disabled());
    assert!(harness.el("save-off").is_disabled());
}

#[tokio::test]
async fn controls_are_restored_after_failure() {
    let harness = Harness::new(PAGE);
    harness.transport.reply_network_error();
    harness.submit("save");
    harness.settle().await;

    assert!(!harness.el("save").has_class("ln-ajax--loading"));
    assert!(!harness.el("save-go").is_disabled());
}

#[tokio::test]
async fn never_policy_keeps_form_navigations_out_of_history() {
    let mut config = EnhancerConfig::default();
    config.ajax.form_history = FormHistoryPolicy::Never;
    let harness = Harness::with_config(PAGE, config);

    harness.submit("search");
    harness.settle().await;

    assert_eq!(harness.transport.request_count(), 1);
    assert_eq!(harness.document.location().as_str(), "https://example.test/start");
}

#[tokio::test]
async fn opted_out_forms_submit_normally() {
    let harness = Harness::new(PAGE);
    assert!(!harness.submit("legacy"));
    harness.settle().await;
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn forms_delivered_in_a_response_are_enhanced() {
    let harness = Harness::new(PAGE);
    harness.transport.reply_json(json!({
        "content": { "results": "<form id=\"inner\" action=\"/inner\" method=\"post\"><input name=\"n\" value=\"1\"></form>" }
    }));
    harness.submit("search");
    harness.settle().await;

    assert!(harness.submit("inner"));
    harness.settle().await;
    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].url.as_str(), "https://example.test/inner");
}

#[tokio::test(start_paused = true)]
async fn allow_policy_sends_every_submission_and_restores_after_the_last() {
    let mut config = EnhancerConfig::default();
    config.ajax.dedupe = DedupePolicy::Allow;
    let harness = Harness::with_config(PAGE, config);
    harness.transport.reply_json_after(json!({}), Duration::from_millis(50));
    harness.transport.reply_json_after(json!({}), Duration::from_millis(100));

    harness.submit("save");
    harness.submit("save");
    assert_eq!(harness.controller.in_flight(), 2);

    tokio::time::sleep(Duration::from_millis(75)).await;
    assert_eq!(harness.controller.in_flight(), 1);
    assert!(harness.el("save-go").is_disabled());
    assert!(harness.el("save").has_class("ln-ajax--loading"));

    harness.settle().await;
    assert_eq!(harness.transport.request_count(), 2);
    assert!(!harness.el("save-go").is_disabled());
    assert!(!harness.el("save").has_class("ln-ajax--loading"));
}
