//! Signals published on the page bus.

use url::Url;

/// Why the logical location changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationCause {
    /// The document was loaded or enhancers were installed.
    Initial,
    /// A history entry was pushed by the navigation controller.
    Navigation,
    /// Back/forward traversal.
    Traversal,
}

/// Published whenever the document location changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChanged {
    pub url: Url,
    pub cause: LocationCause,
}

impl LocationChanged {
    #[must_use]
    pub const fn new(url: Url, cause: LocationCause) -> Self {
        Self { url, cause }
    }
}
