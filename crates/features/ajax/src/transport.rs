use crate::error::ExchangeError;
use crate::request::NavigationRequest;
use http::StatusCode;
use std::future::Future;

/// What came back over the wire, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    /// A `200 OK` with a JSON body.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(StatusCode::OK, value.to_string())
    }
}

/// Sends navigation requests.
///
/// Implementations only move bytes: status interpretation and JSON decoding happen in
/// the dispatcher. A transport returns [`ExchangeError::Network`] when no response was
/// received at all.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &NavigationRequest,
    ) -> impl Future<Output = Result<TransportResponse, ExchangeError>> + Send;
}

#[cfg(feature = "client")]
pub use client::ReqwestTransport;

#[cfg(feature = "client")]
mod client {
    use super::{Transport, TransportResponse};
    use crate::error::ExchangeError;
    use crate::request::NavigationRequest;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

    /// A [`Transport`] for native hosts, backed by a shared `reqwest` client.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        #[must_use]
        pub const fn new(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, request: &NavigationRequest) -> Result<TransportResponse, ExchangeError> {
            let mut builder = self
                .client
                .request(request.method.clone(), request.url.clone())
                .headers(request.headers.clone());
            if let Some(body) = request.encoded_body() {
                builder = builder
                    .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                    .body(body);
            }

            let response = builder.send().await.map_err(|e| ExchangeError::Network {
                message: e.to_string().into(),
                context: Some(format!("{} {}", request.method, request.url).into()),
            })?;
            let status = response.status();
            let body = response.bytes().await.map_err(|e| ExchangeError::Network {
                message: e.to_string().into(),
                context: Some("Reading response body".into()),
            })?;

            Ok(TransportResponse { status, body: body.to_vec() })
        }
    }
}
