//! Request construction: headers, CSRF placement and payload encoding.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use ln_domain::constants::{ACCEPT_JSON, CSRF_HEADER, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE};
use std::fmt;
use url::Url;
use url::form_urlencoded;

/// Ordered form fields, as a browser would serialize them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` serialization.
    #[must_use]
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.fields).finish()
    }
}

/// One navigation exchange, built once and never modified after dispatch.
#[derive(Clone)]
pub struct NavigationRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<FormPayload>,
    pub headers: HeaderMap,
    pub csrf_token: Option<String>,
}

impl fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("body", &self.body.as_ref().map(FormPayload::encode))
            .field("csrf", &self.csrf_token.is_some())
            .finish_non_exhaustive()
    }
}

impl NavigationRequest {
    /// Builds a request the way the navigation controller sends it.
    ///
    /// * Every request carries the requested-with marker and asks for JSON.
    /// * `GET` folds a non-empty payload into the query string, merging with any query
    ///   already present.
    /// * Other methods send the payload as the body.
    /// * The CSRF token travels as `csrf_field` inside the body when there is one, and as
    ///   the CSRF header otherwise. Never both.
    #[must_use]
    pub fn build(
        method: Method,
        mut url: Url,
        payload: Option<FormPayload>,
        csrf_token: Option<String>,
        csrf_field: &str,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(REQUESTED_WITH_HEADER),
            HeaderValue::from_static(REQUESTED_WITH_VALUE),
        );
        headers.insert(http::header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let mut body = None;
        match payload {
            Some(payload) if method == Method::GET => {
                if !payload.is_empty() {
                    merge_query(&mut url, &payload.encode());
                }
            },
            Some(mut payload) => {
                if let Some(token) = &csrf_token {
                    payload.push(csrf_field, token.clone());
                }
                body = Some(payload);
            },
            None => {},
        }

        if body.is_none()
            && let Some(token) = &csrf_token
        {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(CSRF_HEADER), value);
                },
                Err(_) => tracing::warn!("CSRF token is not a valid header value; sending without it"),
            }
        }

        Self { method, url, body, headers, csrf_token }
    }

    /// The request body, urlencoded.
    #[must_use]
    pub fn encoded_body(&self) -> Option<String> {
        self.body.as_ref().map(FormPayload::encode)
    }
}

/// Appends an encoded query, joining with `&` when the URL already has one.
pub(crate) fn merge_query(url: &mut Url, encoded: &str) {
    let merged = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded.to_owned(),
    };
    url.set_query(Some(&merged));
}
