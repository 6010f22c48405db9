//! # Lifecycle
//!
//! The attachment protocol every enhancer shares.
//!
//! A feature is a tag, a [`Matcher`] deciding which elements it applies to, and an
//! initializer. The [`MutationWatcher`] runs initializers for matching elements already
//! in the document and for every element inserted later; the [`AttachmentRegistry`]
//! guarantees each `(element, feature)` pair is initialized at most once. When an
//! element leaves the document, its bindings are released, listeners registered under
//! the feature's tag are removed, and the feature's release hook runs.
//!
//! ```rust
//! use ln_dom::{Document, Url};
//! use ln_lifecycle::{Feature, Matcher, MutationWatcher};
//!
//! let document = Document::new(Url::parse("https://example.test/").unwrap());
//! let watcher = MutationWatcher::new(&document);
//! watcher.register(Feature::new("greeting", Matcher::attribute("data-greet"), |element| {
//!     element.set_text_content("hello");
//! }));
//!
//! document.body().set_inner_html("<p data-greet></p>");
//! assert_eq!(document.body().text_content(), "hello");
//! ```

mod registry;
mod watcher;

pub use registry::AttachmentRegistry;
pub use watcher::{Feature, Matcher, MutationWatcher};
