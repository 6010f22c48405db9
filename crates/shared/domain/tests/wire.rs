use ln_domain::navigation::{NavigationResponse, ResponseMessage};
use ln_domain::notification::{NotificationEvent, NotificationKind};
use serde_json::json;

#[test]
fn response_fields_are_optional() {
    let response: NavigationResponse = serde_json::from_str("{}").expect("empty object");
    assert!(response.is_empty());

    let response: NavigationResponse =
        serde_json::from_value(json!({ "content": { "main": "<p>x</p>" } })).expect("content only");
    assert_eq!(response.title, None);
    assert_eq!(response.content.get("main").map(String::as_str), Some("<p>x</p>"));
}

#[test]
fn message_type_is_lenient() {
    let response: NavigationResponse = serde_json::from_value(json!({
        "title": "Saved",
        "message": { "type": "SUCCESS", "title": "Done", "body": "Record saved" }
    }))
    .expect("message");
    let message = response.message.expect("message present");
    assert_eq!(message.kind, NotificationKind::Success);

    let unknown: ResponseMessage =
        serde_json::from_value(json!({ "type": "shout", "title": "", "body": "" })).expect("unknown");
    assert_eq!(unknown.kind, NotificationKind::Info);
}

#[test]
fn response_serializes_without_empty_fields() {
    let response = NavigationResponse::new().with_region("main", "<p>hi</p>");
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value, json!({ "content": { "main": "<p>hi</p>" } }));
}

#[test]
fn message_converts_to_notification() {
    let message = ResponseMessage::new(NotificationKind::Error, "", "Validation failed")
        .with_data(json!({ "errors": { "email": ["taken", "invalid"], "name": "required" } }));
    let event = NotificationEvent::from(message);

    assert_eq!(event.kind, NotificationKind::Error);
    assert_eq!(event.title, None);
    assert_eq!(event.display_title(), "Error");
    assert_eq!(event.message.as_deref(), Some("Validation failed"));
    assert_eq!(event.errors(), vec!["taken", "invalid", "required"]);
}

#[test]
fn default_titles_per_kind() {
    assert_eq!(NotificationKind::Success.default_title(), "Success");
    assert_eq!(NotificationKind::Warn.default_title(), "Warning");
    assert_eq!(NotificationKind::from("warning"), NotificationKind::Warn);
    assert_eq!(NotificationEvent::error("boom").display_title(), "Error");
}
