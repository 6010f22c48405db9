use crate::error::ExchangeError;
use crate::request::NavigationRequest;
use crate::transport::{Transport, TransportResponse};
use ln_domain::navigation::NavigationResponse;
use std::sync::Arc;
use tracing::debug;

/// Sends requests through a [`Transport`] and interprets the answer.
#[derive(Debug)]
pub struct RequestDispatcher<T> {
    transport: Arc<T>,
}

impl<T> Clone for RequestDispatcher<T> {
    fn clone(&self) -> Self {
        Self { transport: self.transport.clone() }
    }
}

impl<T: Transport> RequestDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport: Arc::new(transport) }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs the exchange.
    ///
    /// # Errors
    /// * [`ExchangeError::Network`] when the transport got no response.
    /// * [`ExchangeError::Status`] for a non-2xx status, with the parsed body if it is a
    ///   navigation response.
    /// * [`ExchangeError::Malformed`] for a 2xx body that is not a navigation response.
    pub async fn dispatch(
        &self,
        request: &NavigationRequest,
    ) -> Result<NavigationResponse, ExchangeError> {
        debug!(method = %request.method, url = %request.url, "Dispatching navigation request");
        let TransportResponse { status, body } = self.transport.send(request).await?;

        if !status.is_success() {
            let parsed = decode(&body).ok().filter(|response| !response.is_empty());
            debug!(%status, url = %request.url, parsed = parsed.is_some(), "Navigation request rejected");
            return Err(ExchangeError::Status { status, body: parsed.map(Box::new), context: None });
        }

        decode(&body).map_err(|source| ExchangeError::Malformed {
            source,
            context: Some(format!("{} {}", request.method, request.url).into()),
        })
    }
}

/// An empty or whitespace-only body is an empty response.
fn decode(body: &[u8]) -> Result<NavigationResponse, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NavigationResponse::default());
    }
    serde_json::from_slice(body)
}
