use ln_domain::notification::{NotificationEvent, NotificationKind};
use std::time::Duration;

/// One toast to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toast {
    pub kind: NotificationKind,
    pub title: Option<String>,
    pub message: Option<String>,
    /// Validation messages listed under the message.
    pub errors: Vec<String>,
    /// Overrides the container's timeout; zero keeps the toast until dismissed.
    pub timeout: Option<Duration>,
}

impl Toast {
    #[must_use]
    pub fn new(kind: NotificationKind) -> Self {
        Self { kind, ..Self::default() }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.errors.extend(errors.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The explicit title, or the kind's default.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.kind.default_title())
    }
}

impl From<&NotificationEvent> for Toast {
    fn from(event: &NotificationEvent) -> Self {
        Self {
            kind: event.kind,
            title: event.title.clone(),
            message: event.message.clone().filter(|m| !m.trim().is_empty()),
            errors: event.errors(),
            timeout: None,
        }
    }
}
