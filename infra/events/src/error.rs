use std::borrow::Cow;

/// Errors that can occur during signal bus operations.
#[ln_derive::ln_error]
pub enum EventBusError {
    /// An internal dynamic cast failed; the type registry is inconsistent.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
