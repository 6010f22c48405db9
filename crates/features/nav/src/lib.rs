//! # Active Navigation Links
//!
//! Highlights the links of a navigation container that lead to the page being shown.
//!
//! ```html
//! <nav data-ln-nav="is-active">
//!   <a href="/docs">Docs</a>
//!   <a href="/docs/guide">Guide</a>
//! </nav>
//! ```
//!
//! At `/docs/guide/intro` only the guide link gets `is-active`: the deepest link on the
//! current path wins, and `/foo` never matches `/foo2`. The tracker listens for
//! [`LocationChanged`](ln_domain::signals::LocationChanged) instead of hooking history,
//! so any component that moves the location just publishes the signal.

mod path;
mod tracker;

pub use path::{link_path, matches, normalize};
pub use tracker::ActiveLinkTracker;
