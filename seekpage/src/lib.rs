// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs
#![allow(clippy::missing_errors_doc)] // Error variants are documented on PaginateError
#![allow(clippy::missing_panics_doc)] // Builder panics are documented per method
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self
#![allow(clippy::must_use_candidate)] // Fluent builder API
#![allow(clippy::format_push_string)] // String building style preference
#![allow(clippy::double_must_use)] // Functions returning must_use types can have their own docs

//! # seekpage - Keyset pagination with opaque tokens
//!
//! Paginates a pre-filtered SQL query and returns pages with previous/next
//! tokens. The first page is a plain sorted scan, a positive starting offset
//! uses a deferred join, and token navigation uses a keyset comparison so
//! deep pages cost the same as the first.
//!
//! Values never reach the SQL text: filters and token values are bound
//! parameters. Supports Postgres and `SQLite` placeholders.
//!
//! ## Quick Start
//!
//! ```
//! use seekpage::prelude::*;
//!
//! #[derive(SortKeys)]
//! struct Post {
//!     id: i64,
//!     created_at: String,
//! }
//!
//! struct Canned(Vec<Post>);
//!
//! impl Executor for Canned {
//!     type Row = Post;
//!
//!     fn count(&mut self, _: &Statement, _: &CancelToken) -> Result<u64, ExecError> {
//!         Ok(self.0.len() as u64)
//!     }
//!
//!     fn fetch(&mut self, stmt: &Statement, _: &CancelToken) -> Result<Vec<Post>, ExecError> {
//!         assert!(stmt.sql.ends_with("ORDER BY created_at DESC, id DESC LIMIT 3"));
//!         Ok(std::mem::take(&mut self.0))
//!     }
//! }
//!
//! let rows = (1..=3)
//!     .rev()
//!     .map(|id| Post { id, created_at: format!("2024-01-0{id}") })
//!     .collect();
//!
//! let paginator = Paginator::new(postgres("posts"), 2).sort_fields("created_at, id")?;
//! let page = paginator.paginate(&mut Canned(rows), "", "")?;
//!
//! assert_eq!(page.total, 3);
//! assert_eq!(page.data.len(), 2);
//! assert!(page.has_next);
//!
//! let next = Cursor::decode(page.next_token.as_deref().unwrap_or_default())?;
//! assert_eq!(next, Cursor::new().string("created_at", "2024-01-02").int("id", 2));
//! # Ok::<(), PaginateError>(())
//! ```
//!
//! ## Tokens
//!
//! A token is a JSON object of the boundary row's sort-key values, URL-safe
//! base64 encoded. It is readable and forgeable by clients but can only move
//! the page window. Tokens carry no version marker: they stay valid only while
//! the sort fields and their types stay the same.
//!
//! ## Configuration
//!
//! ```
//! use seekpage::{Paginator, PaginatorConfig, sqlite};
//!
//! let config = PaginatorConfig::from_toml_str(r#"
//!     sort_fields = "p.created_at, p.id"
//!     direction = "asc"
//!     limit = 50
//! "#)?;
//! let paginator = Paginator::from_config(sqlite("posts").alias("p"), &config)?;
//! assert_eq!(paginator.limit(), 50);
//! # Ok::<(), seekpage::PaginateError>(())
//! ```

extern crate self as seekpage;

mod builder;
mod config;
mod dialect;
mod error;
mod executor;
mod pagination;
mod validate;

pub use builder::{
    CompoundFilter, Filter, FilterExpr, Join, JoinKind, LogicalOp, Operator, QueryBuilder,
    SortDir, SortField, Statement, Value, and, not, or, simple,
};
pub use config::{DEFAULT_LIMIT, DEFAULT_MAX_LIMIT, PaginatorConfig};
pub use dialect::{Dialect, Postgres, Sqlite};
pub use error::{ErrorKind, ExecError, PaginateError, Stage};
pub use executor::{CancelToken, Executor};
pub use pagination::{
    Cursor, CursorValue, KeysetCondition, Page, PageInfo, Paginator, SortKeys, Strategy,
    ToCursorValue, TupleComparison, extract_boundary,
};
pub use validate::{
    assert_valid_qualified_identifier, is_valid_join_condition, is_valid_qualified_identifier,
    is_valid_sql_identifier, unqualified,
};

/// Derive [`SortKeys`] for a struct with named fields.
///
/// A field's external name is `#[sort_key(rename = "...")]`, else
/// `#[serde(rename = "...")]`, else the field name. `#[sort_key(skip)]` or
/// `#[serde(skip)]` leaves a field out. Field types must implement
/// [`ToCursorValue`].
#[cfg(feature = "derive")]
pub use seekpage_macros::SortKeys;

/// Build a query for Postgres.
///
/// Convenience function that creates a `QueryBuilder` with Postgres dialect.
#[must_use]
pub fn postgres(table: &str) -> QueryBuilder<Postgres> {
    QueryBuilder::new(Postgres, table)
}

/// Build a query for `SQLite`.
///
/// Convenience function that creates a `QueryBuilder` with `SQLite` dialect.
#[must_use]
pub fn sqlite(table: &str) -> QueryBuilder<Sqlite> {
    QueryBuilder::new(Sqlite, table)
}

/// Prelude module for convenient imports.
///
/// ```
/// use seekpage::prelude::*;
/// let stmt = postgres("users").fields(&["id"]).build();
/// assert_eq!(stmt.sql, "SELECT id FROM users");
/// ```
pub mod prelude {
    pub use crate::{
        CancelToken, Cursor, CursorValue, Dialect, ExecError, Executor, Join, KeysetCondition,
        Operator, Page, PageInfo, PaginateError, Paginator, PaginatorConfig, Postgres,
        QueryBuilder, SortDir, SortKeys, Sqlite, Statement, Strategy, ToCursorValue,
        TupleComparison, Value, and, not, or, postgres, simple, sqlite,
    };
}


// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
