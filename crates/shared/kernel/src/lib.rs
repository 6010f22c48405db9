//! Kernel utilities shared by enhancer hosts.
//! Keep this crate lightweight; it re-exports the domain models and loads configuration.
//!
//! ## Config loading (non-wasm)
//! ```rust,ignore
//! #[cfg(not(target_arch = "wasm32"))]
//! # {
//!     use ln_kernel::config::load_config;
//!     use ln_kernel::domain::config::EnhancerConfig;
//!     let cfg: EnhancerConfig = load_config(Some("enhancers")).unwrap();
//! # }
//! ```
#[cfg(not(target_arch = "wasm32"))]
pub mod config;

pub use ln_domain as domain;
