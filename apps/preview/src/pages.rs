use crate::config::PreviewConfig;
use axum::Router;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use lnkit::ajax::server::{AjaxRequest, NavigationReply};
use lnkit::dom::escape;
use lnkit::domain::constants::CSRF_FIELD;
use lnkit::domain::navigation::{NavigationResponse, ResponseMessage};
use lnkit::domain::notification::NotificationKind;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

type AppState = Arc<PreviewConfig>;

const TOPICS: &[(&str, &str, &str)] = &[
    ("guide", "Guide", "Getting started with enhanced links and forms."),
    ("api", "API", "The navigation response format and the signals widgets exchange."),
    ("toasts", "Toasts", "Showing notifications from any component."),
];

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/docs", get(docs))
        .route("/docs/{topic}", get(topic))
        .route("/search", get(search))
        .route("/contact", get(contact_form).post(contact_submit))
        .with_state(state)
}

/// One page, answered as a full document or as a navigation response.
struct Page {
    status: StatusCode,
    title: String,
    regions: Vec<(&'static str, String)>,
    message: Option<ResponseMessage>,
}

impl Page {
    fn new(title: impl Into<String>, main: String) -> Self {
        Self { status: StatusCode::OK, title: title.into(), regions: vec![("main", main)], message: None }
    }

    fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn message(mut self, message: ResponseMessage) -> Self {
        self.message = Some(message);
        self
    }

    fn respond(self, ajax: &AjaxRequest, config: &PreviewConfig) -> Response {
        if ajax.is_ajax() {
            let mut response = NavigationResponse::new().with_title(self.title);
            for (target, html) in self.regions {
                response = response.with_region(target, html);
            }
            if let Some(message) = self.message {
                response = response.with_message(message);
            }
            return NavigationReply::error(self.status, response).into_response();
        }

        let main = self
            .regions
            .iter()
            .find(|(target, _)| *target == "main")
            .map_or("", |(_, html)| html.as_str());
        let toasts = self.message.as_ref().map(toast_item).unwrap_or_default();
        (self.status, Html(layout(config, &self.title, main, &toasts))).into_response()
    }
}

fn layout(config: &PreviewConfig, title: &str, main: &str, toasts: &str) -> String {
    let active = escape(&config.active_class);
    let token = escape(&config.csrf_token);
    let title = escape(title);
    format!(
        r#"<!doctype html>
<html>
<head>
  <title>{title}</title>
  <meta name="csrf-token" content="{token}">
</head>
<body>
  <nav data-ln-nav="{active}" data-ln-ajax>
    <a href="/">Home</a>
    <a href="/docs">Docs</a>
    <a href="/contact">Contact</a>
  </nav>
  <main id="main" data-ln-ajax>{main}</main>
  <ul data-ln-toast>{toasts}</ul>
</body>
</html>"#
    )
}

/// A server-rendered toast, hydrated by the toast widget on load.
fn toast_item(message: &ResponseMessage) -> String {
    format!(
        r#"<li data-ln-toast-item data-type="{}" data-title="{}">{}</li>"#,
        message.kind.as_str(),
        escape(&message.title),
        escape(&message.body)
    )
}

fn topic_links() -> String {
    TOPICS
        .iter()
        .map(|(slug, name, _)| format!(r#"<li><a href="/docs/{slug}">{name}</a></li>"#))
        .collect()
}

fn search_results(query: &str) -> String {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return String::new();
    }
    let hits: String = TOPICS
        .iter()
        .filter(|(slug, name, summary)| {
            slug.contains(&needle) || name.to_lowercase().contains(&needle) || summary.to_lowercase().contains(&needle)
        })
        .map(|(slug, name, _)| format!(r#"<li><a href="/docs/{slug}">{name}</a></li>"#))
        .collect();
    if hits.is_empty() {
        format!("<p>No topics match &ldquo;{}&rdquo;.</p>", escape(query))
    } else {
        format!("<ul>{hits}</ul>")
    }
}

fn docs_body(query: &str) -> String {
    format!(
        r#"<h1>Docs</h1><ul>{links}</ul>
<form action="/search" method="get"><input name="q" value="{value}"><button type="submit">Search</button></form>
<div id="results">{results}</div>"#,
        links = topic_links(),
        value = escape(query),
        results = search_results(query),
    )
}

async fn home(State(config): State<AppState>, ajax: AjaxRequest) -> Response {
    let body = r#"<h1>Welcome</h1><p>Links and forms on this page load without a full reload.</p><a href="/docs">Read the docs</a>"#;
    Page::new("Home", body.to_owned()).respond(&ajax, &config)
}

async fn docs(State(config): State<AppState>, ajax: AjaxRequest) -> Response {
    Page::new("Docs", docs_body("")).respond(&ajax, &config)
}

async fn topic(State(config): State<AppState>, ajax: AjaxRequest, Path(slug): Path<String>) -> Response {
    match TOPICS.iter().find(|(s, _, _)| *s == slug) {
        Some((_, name, summary)) => {
            let body = format!(r#"<h1>{name}</h1><p>{summary}</p><a href="/docs">All topics</a>"#);
            Page::new(*name, body).respond(&ajax, &config)
        },
        None => {
            debug!(slug, "Unknown topic");
            Page::new("Not found", "<h1>Not found</h1>".to_owned())
                .status(StatusCode::NOT_FOUND)
                .message(ResponseMessage::new(
                    NotificationKind::Error,
                    "Not found",
                    format!("There is no topic called \"{slug}\"."),
                ))
                .respond(&ajax, &config)
        },
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: String,
}

async fn search(State(config): State<AppState>, ajax: AjaxRequest, Query(query): Query<SearchQuery>) -> Response {
    if ajax.is_ajax() {
        let response = NavigationResponse::new()
            .with_title(format!("Search: {}", query.q))
            .with_region("results", search_results(&query.q));
        return NavigationReply::ok(response).into_response();
    }
    Page::new("Docs", docs_body(&query.q)).respond(&ajax, &config)
}

fn contact_body(name: &str, message: &str) -> String {
    format!(
        r#"<h1>Contact</h1>
<form action="/contact" method="post">
  <input name="name" value="{name}">
  <textarea name="message">{message}</textarea>
  <button type="submit">Send</button>
</form>"#,
        name = escape(name),
        message = escape(message),
    )
}

async fn contact_form(State(config): State<AppState>, ajax: AjaxRequest) -> Response {
    Page::new("Contact", contact_body("", "")).respond(&ajax, &config)
}

async fn contact_submit(
    State(config): State<AppState>,
    ajax: AjaxRequest,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let field = |key: &str| fields.iter().find(|(k, _)| k == key).map_or("", |(_, v)| v.as_str());
    let token_ok = ajax.csrf_token.as_deref() == Some(config.csrf_token.as_str())
        || fields.iter().any(|(k, v)| k == CSRF_FIELD && *v == config.csrf_token);

    if !token_ok {
        return Page::new("Contact", contact_body(field("name"), field("message")))
            .status(StatusCode::FORBIDDEN)
            .message(ResponseMessage::new(
                NotificationKind::Error,
                "Session expired",
                "Reload the page and try again.",
            ))
            .respond(&ajax, &config);
    }

    let name = field("name").trim();
    if name.is_empty() {
        return Page::new("Contact", contact_body(name, field("message")))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .message(
                ResponseMessage::new(NotificationKind::Error, "Check the form", "Some fields need attention.")
                    .with_data(json!({ "errors": { "name": ["Name is required."] } })),
            )
            .respond(&ajax, &config);
    }

    let body = format!("<h1>Thanks, {}!</h1><p>We will get back to you.</p>", escape(name));
    Page::new("Contact", body)
        .message(ResponseMessage::new(NotificationKind::Success, "Sent", "Your message was delivered."))
        .respond(&ajax, &config)
}
