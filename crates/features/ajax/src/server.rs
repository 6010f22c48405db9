//! Axum helpers for endpoints that answer enhanced links and forms.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, http::HeaderValue};
use ln_domain::constants::{CSRF_HEADER, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE};
use ln_domain::navigation::NavigationResponse;
use std::convert::Infallible;

/// What an incoming request says about its origin.
///
/// Never rejects: handlers branch on [`AjaxRequest::is_ajax`] to serve a full page or
/// a [`NavigationReply`] from the same route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AjaxRequest {
    pub requested_with: bool,
    pub accepts_json: bool,
    /// Token from the CSRF header; body-carried tokens are left to the form extractor.
    pub csrf_token: Option<String>,
}

impl AjaxRequest {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let requested_with = headers
            .get(REQUESTED_WITH_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case(REQUESTED_WITH_VALUE));
        let accepts_json = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|media| media.split(';').next().is_some_and(|m| m.trim() == "application/json"));
        let csrf_token = headers
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .filter(|token| !token.is_empty());

        Self { requested_with, accepts_json, csrf_token }
    }

    /// Sent by the navigation controller rather than a plain browser navigation.
    #[must_use]
    pub const fn is_ajax(&self) -> bool {
        self.requested_with && self.accepts_json
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AjaxRequest {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// A navigation response with its status, ready to return from a handler.
#[derive(Debug, Clone)]
pub struct NavigationReply {
    pub status: StatusCode,
    pub response: NavigationResponse,
}

impl NavigationReply {
    #[must_use]
    pub const fn ok(response: NavigationResponse) -> Self {
        Self { status: StatusCode::OK, response }
    }

    /// An error reply; the controller shows `response.message` when present.
    #[must_use]
    pub const fn error(status: StatusCode, response: NavigationResponse) -> Self {
        Self { status, response }
    }
}

impl From<NavigationResponse> for NavigationReply {
    fn from(response: NavigationResponse) -> Self {
        Self::ok(response)
    }
}

impl IntoResponse for NavigationReply {
    fn into_response(self) -> Response {
        (
            self.status,
            [
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache, must-revalidate")),
                (header::VARY, HeaderValue::from_static("x-requested-with")),
            ],
            Json(self.response),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use ln_domain::navigation::ResponseMessage;
    use ln_domain::notification::NotificationKind;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/items");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_extractor_recognizes_controller_requests() {
        let mut parts = parts(&[
            ("x-requested-with", "XMLHttpRequest"),
            ("accept", "text/html;q=0.9, application/json"),
            ("x-csrf-token", "abc"),
        ]);
        let request = AjaxRequest::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(request.is_ajax());
        assert_eq!(request.csrf_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_plain_navigation_is_not_ajax() {
        let mut parts = parts(&[("accept", "text/html")]);
        let request = AjaxRequest::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!request.is_ajax());
        assert!(request.csrf_token.is_none());
    }

    #[tokio::test]
    async fn test_reply_serializes_body_and_status() {
        let reply = NavigationReply::error(
            StatusCode::UNPROCESSABLE_ENTITY,
            NavigationResponse::new().with_message(ResponseMessage::new(
                NotificationKind::Error,
                "Invalid",
                "Name is required",
            )),
        );
        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store, no-cache, must-revalidate"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let decoded: NavigationResponse = serde_json::from_slice(&bytes).unwrap();
        let message = decoded.message.unwrap();
        assert_eq!(message.kind, NotificationKind::Error);
        assert_eq!(message.body, "Name is required");
    }
}
