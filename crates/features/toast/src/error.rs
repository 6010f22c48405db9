use ln_dom::DomError;
use std::borrow::Cow;

#[ln_derive::ln_error]
pub enum ToastError {
    /// Neither an explicit container, a marked element nor the fallback id exists.
    #[error("No toast container on the page{}", format_context(.context))]
    NoContainer { context: Option<Cow<'static, str>> },

    #[error("Toast markup could not be built{}: {source}", format_context(.context))]
    Dom { source: DomError, context: Option<Cow<'static, str>> },
}
