use ln_dom::DocumentId;
use ln_event_bus::EventBusError;
use std::borrow::Cow;

#[ln_derive::ln_error]
pub enum EnhancerError {
    /// The document already carries an enhancer built for another transport type.
    #[error("Document {document:?} is already enhanced with a different transport{}", format_context(.context))]
    TransportMismatch { document: DocumentId, context: Option<Cow<'static, str>> },

    #[error("Signal bus error{}: {source}", format_context(.context))]
    Bus { source: EventBusError, context: Option<Cow<'static, str>> },
}
