//! # Domain Models
//!
//! Pure enhancer types with minimal dependencies (`serde`, `serde_json`, `url`).
//! Keep it lean: no DOM access, networking, or scheduling. Just data, the marker
//! vocabulary shared with HTML authors, and the signals widgets exchange on the bus.

pub mod config;
pub mod constants;
pub mod navigation;
pub mod notification;
pub mod signals;
