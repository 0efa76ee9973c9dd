//! Parameterized SELECT builder the paginator renders its statements with.

mod filter;
mod select;
mod types;

pub use select::QueryBuilder;
pub use types::{
    CompoundFilter, Filter, FilterExpr, Join, JoinKind, LogicalOp, Operator, SortDir, SortField,
    Statement, Value, and, not, or, simple,
};
