//! # Document Model
//!
//! An in-process HTML document for enhancers to bind to. A host (a wasm bridge, a
//! headless harness, a test) mirrors the real page into a [`Document`] and forwards user
//! input through [`Document::dispatch`]; enhancers observe mutations, register
//! listeners and rewrite regions exactly as they would in a browser.
//!
//! * Nodes are [`Element`] handles with identity semantics and never-reused [`NodeId`]s.
//!   [`WeakElement`] lets registries refer to nodes without keeping them alive.
//! * Child-list mutations on connected nodes are batched into [`MutationRecord`]s and
//!   delivered synchronously, one batch at a time.
//! * Click and submit events bubble from the target to the root; listeners may cancel the
//!   default action.
//! * Parsed fragments nest at most [`MAX_NESTING_DEPTH`] levels; deeper start tags are
//!   closed on the spot. Tree walks never recurse.
//! * Session history is a stack of [`HistoryEntry`] values built on [`url::Url`].
//!
//! ```rust
//! use ln_dom::Document;
//!
//! let document = Document::parse("https://example.test/", "", r#"<main id="content"></main>"#)?;
//! let main = document.get_element_by_id("content").unwrap();
//! main.set_inner_html("<p>Hello <b>world</b></p>");
//! assert_eq!(main.text_content(), "Hello world");
//! # Ok::<(), ln_dom::DomError>(())
//! ```

mod document;
mod error;
mod event;
mod history;
mod html;
mod node;

pub use document::{Document, DocumentId, MutationRecord, ObserverId, WeakDocument};
pub use error::{DomError, DomErrorExt};
pub use event::{Click, DispatchOutcome, DomEvent, Event, EventKind, MouseButton};
pub use history::{HistoryEntry, HistoryState};
pub use html::{MAX_NESTING_DEPTH, escape};
pub use node::{Element, NodeId, WeakElement};
pub use url::Url;
