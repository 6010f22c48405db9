#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every enhancer crate.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! ln-derive = { path = "../../infra/derive" }
//! thiserror = "2"
//! ```
//!
//! The consuming crate must depend on `thiserror` as well; the generated code
//! refers to `::thiserror::Error`.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring a crate's error enum.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context(...)`
///   to `Result<T, Name>` and to `Result<T, Source>` for every wrapped source type.
/// * **Conversions**: Implements `From<Source>` for variants holding a `source` field
///   (or a field marked `#[source]`/`#[from]`) so `?` works on upstream errors.
/// * **Internal Fallback**: Adds `From<&'static str>` and `From<String>` when an
///   `Internal` variant is declared.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Every variant uses named fields; tuple and unit variants are rejected.
/// 3. Variants with a source must also declare `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use ln_derive::ln_error;
/// use std::borrow::Cow;
///
/// #[ln_error]
/// pub enum ExchangeError {
///     #[error("Malformed response{}: {source}", format_context(.context))]
///     Malformed { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn parse(body: &[u8]) -> Result<Response, ExchangeError> {
///     serde_json::from_slice(body).context("Decoding navigation response")
/// }
/// ```
#[proc_macro_attribute]
pub fn ln_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
