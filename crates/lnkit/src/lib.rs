//! Facade crate for the page enhancers.
//! Re-exports the shared models and feature crates, and wires them to a document.
//! Keep this crate thin: it should compose other crates, not implement widget logic.
//!
//! ## Usage
//! - Mirror the page into an [`ln_dom::Document`].
//! - Call [`Enhancer::install`] with a configuration and a [`ajax::Transport`].
//! - Forward clicks and submissions through [`ln_dom::Document::dispatch`].
//!
//! ```rust,ignore
//! use lnkit::{Enhancer, ajax::ReqwestTransport, domain::config::EnhancerConfig};
//!
//! let page = lnkit::dom::Document::parse("https://example.test/", "", "<main data-ln-ajax></main>")?;
//! let enhancer = Enhancer::install(&page, EnhancerConfig::default(), ReqwestTransport::default())?;
//! ```

mod enhancer;
mod error;

pub use enhancer::{Enhancer, is_enhanced};
pub use error::{EnhancerError, EnhancerErrorExt};
pub use ln_dom as dom;
pub use ln_domain as domain;
pub use ln_event_bus as events;
pub use ln_kernel as kernel;
pub use ln_lifecycle as lifecycle;

/// Feature crates, for hosts that wire components by hand.
pub mod features {
    pub use ln_ajax as ajax;
    pub use ln_nav as nav;
    pub use ln_toast as toast;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        "ajax",
        "nav",
        "toast",
        #[cfg(feature = "server")]
        "server",
        #[cfg(feature = "client")]
        "client",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

pub use features::ajax;
