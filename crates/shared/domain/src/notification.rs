use crate::navigation::ResponseMessage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

pub const SUCCESS: &str = "success";
pub const ERROR: &str = "error";
pub const WARN: &str = "warn";
pub const INFO: &str = "info";

/// Severity of a user-facing notification.
///
/// Parsing is lenient: unknown or differently-cased names fall back to [`NotificationKind::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warn,
    #[default]
    Info,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => SUCCESS,
            Self::Error => ERROR,
            Self::Warn => WARN,
            Self::Info => INFO,
        }
    }

    /// Title used when a notification does not carry one.
    #[must_use]
    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warn => "Warning",
            Self::Info => "Information",
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            SUCCESS => Self::Success,
            ERROR => Self::Error,
            WARN | "warning" => Self::Warn,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// A fire-and-forget message for whichever widget displays notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: Option<String>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self { kind, title: None, message: Some(message.into()), data: None }
    }

    /// An error notification titled "Error".
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
            .with_title(NotificationKind::Error.default_title())
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The explicit title, or the kind's default when absent or blank.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.kind.default_title())
    }

    /// Validation messages under `data.errors`, flattened in order.
    ///
    /// Accepts `{"errors": {"field": ["a", "b"]}}`, `{"errors": ["a"]}` and plain strings.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(errors) = self.data.as_ref().and_then(|data| data.get("errors")) {
            flatten_errors(errors, &mut out);
        }
        out
    }
}

fn flatten_errors(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| flatten_errors(item, out)),
        Value::Object(map) => map.values().for_each(|item| flatten_errors(item, out)),
        Value::Null => {},
        other => out.push(other.to_string()),
    }
}

impl From<ResponseMessage> for NotificationEvent {
    fn from(message: ResponseMessage) -> Self {
        Self {
            kind: message.kind,
            title: Some(message.title).filter(|t| !t.is_empty()),
            message: Some(message.body).filter(|b| !b.is_empty()),
            data: message.data,
        }
    }
}
