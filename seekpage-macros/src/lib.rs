// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
// Note: unreachable_pub is not applicable to proc-macro crates where internal
// functions need pub visibility for module organization but aren't exported
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION FOR PROC-MACRO CRATES
// =============================================================================
#![allow(clippy::doc_markdown)] // Code in docs
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy

//! Derive macro for `seekpage` - `#[derive(SortKeys)]` on row types.

use proc_macro::TokenStream;

mod case;
mod sort_keys;

/// Derive `seekpage::SortKeys` for a struct with named fields.
///
/// Each field becomes a sort key under its external name:
///
/// - `#[sort_key(rename = "createdAt")]` sets it explicitly,
/// - otherwise `#[serde(rename = "...")]` is honored,
/// - otherwise the container's `rename_all` (either attribute) is applied,
/// - otherwise the field name is used.
///
/// `#[sort_key(skip)]`, `#[serde(skip)]` and `#[serde(skip_serializing)]`
/// leave a field out. Every remaining field type must implement
/// `seekpage::ToCursorValue`.
///
/// ```ignore
/// #[derive(SortKeys)]
/// #[serde(rename_all = "camelCase")]
/// struct Post {
///     id: i64,
///     created_at: String,       // "createdAt"
///     #[sort_key(skip)]
///     body: String,
/// }
/// ```
#[proc_macro_derive(SortKeys, attributes(sort_key))]
pub fn derive_sort_keys(input: TokenStream) -> TokenStream {
    sort_keys::derive_sort_keys_impl(input)
}
