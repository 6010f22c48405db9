use http::StatusCode;
use ln_domain::navigation::NavigationResponse;
use std::borrow::Cow;

/// Why a navigation exchange did not produce an applicable response.
///
/// A content key without a matching element is not an error; the applier skips it.
#[ln_derive::ln_error]
pub enum ExchangeError {
    /// The exchange never completed (connection refused, reset, timeout).
    #[error("Network failure{}: {message}", format_context(.context))]
    Network { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The server answered with a non-success status. `body` holds the parsed error
    /// document when the server sent one.
    #[error("Request failed with status {status}{}", format_context(.context))]
    Status {
        status: StatusCode,
        body: Option<Box<NavigationResponse>>,
        context: Option<Cow<'static, str>>,
    },

    /// A success status with a body that is not a navigation response.
    #[error("Malformed response{}: {source}", format_context(.context))]
    Malformed { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// An href or form action that cannot be resolved to a URL.
    #[error("Invalid URL{}: {source}", format_context(.context))]
    InvalidUrl { source: url::ParseError, context: Option<Cow<'static, str>> },

    #[error("Internal exchange error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A coarse, cloneable classification of [`ExchangeError`] for signals and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Status(StatusCode),
    Malformed,
    InvalidUrl,
    Internal,
}

impl ExchangeError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Status { status, .. } => FailureKind::Status(*status),
            Self::Malformed { .. } => FailureKind::Malformed,
            Self::InvalidUrl { .. } => FailureKind::InvalidUrl,
            Self::Internal { .. } => FailureKind::Internal,
        }
    }

    /// The error document a failed response carried, if any.
    #[must_use]
    pub fn response(&self) -> Option<&NavigationResponse> {
        match self {
            Self::Status { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

impl From<ln_dom::DomError> for ExchangeError {
    fn from(err: ln_dom::DomError) -> Self {
        match err {
            ln_dom::DomError::InvalidUrl { source, context } => Self::InvalidUrl { source, context },
            other => Self::Internal { message: other.to_string().into(), context: None },
        }
    }
}
