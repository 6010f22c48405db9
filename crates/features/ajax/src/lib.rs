//! # Ajax Navigation
//!
//! Turns enhanced links and forms into JSON exchanges that patch the current page
//! instead of replacing it.
//!
//! * [`NavigationController`] binds to `<a>` and `<form>` elements inside an ajax scope,
//!   builds a [`NavigationRequest`] on activation and hands it to a [`Transport`].
//! * [`RequestDispatcher`] checks the status and decodes the [`NavigationResponse`].
//! * [`ResponseApplier`] sets the title, replaces regions by id, records history and
//!   forwards the message as a notification. The last request sent wins each target.
//!
//! Every finished activation publishes an [`ExchangeSettled`] signal on the bus.
//!
//! The `client` feature adds [`ReqwestTransport`]; `server` adds Axum helpers for the
//! endpoints on the other side.

mod applier;
mod controller;
mod dispatcher;
mod error;
mod form;
mod request;
#[cfg(feature = "server")]
pub mod server;
mod transport;

pub use applier::{AppliedResponse, ResponseApplier};
pub use controller::{ExchangeOutcome, ExchangeSettled, NavigationController};
pub use dispatcher::RequestDispatcher;
pub use error::{ExchangeError, ExchangeErrorExt, FailureKind};
pub use form::{collect_payload, form_action, form_method, submit_controls};
pub use request::{FormPayload, NavigationRequest};
#[cfg(feature = "client")]
pub use transport::ReqwestTransport;
pub use transport::{Transport, TransportResponse};
