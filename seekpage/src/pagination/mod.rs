//! Keyset pagination with opaque prev/next tokens.
//!
//! # Strategies
//!
//! | Strategy          | Chosen when                | Statement                                    |
//! |-------------------|----------------------------|----------------------------------------------|
//! | **Plain**         | no token, offset 0         | `ORDER BY … LIMIT n`                         |
//! | **Deferred join** | no token, offset > 0       | `WHERE pk IN (SELECT pk … LIMIT n OFFSET m)` |
//! | **Cursor**        | a prev or next token       | `WHERE (a, b) > ($1, $2) ORDER BY … LIMIT n` |
//!
//! A previous-token page is fetched in the inverted direction and reversed,
//! so rows always come back in the configured order.
//!
//! # Example
//!
//! ```
//! use seekpage::{Cursor, KeysetCondition, SortDir, postgres};
//!
//! let cursor = Cursor::decode(&Cursor::new().string("created_at", "2024-01-15").int("id", 42).encode()?)?;
//! let fields = ["created_at".to_string(), "id".to_string()];
//! let keyset = KeysetCondition::new(&fields, SortDir::Desc, &cursor)?;
//!
//! let stmt = postgres("posts")
//!     .keyset(keyset)
//!     .sort("created_at", SortDir::Desc)
//!     .sort("id", SortDir::Desc)
//!     .limit(20)
//!     .build();
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT * FROM posts WHERE (created_at, id) < ($1, $2) ORDER BY created_at DESC, id DESC LIMIT 20"
//! );
//! # Ok::<(), seekpage::PaginateError>(())
//! ```

mod boundary;
mod cursor;
mod keyset;
mod page_info;
mod paginator;
mod value;

pub use boundary::{SortKeys, extract_boundary};
pub use cursor::Cursor;
pub use keyset::{KeysetCondition, TupleComparison};
pub use page_info::PageInfo;
pub use paginator::{Page, Paginator, Strategy};
pub use value::{CursorValue, ToCursorValue};
