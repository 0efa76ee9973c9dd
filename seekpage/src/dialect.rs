//! Placeholder syntax and list membership for the supported databases.

use crate::Value;

/// Database-specific rendering used by the statement builder.
pub trait Dialect: Clone + Copy {
    /// Placeholder for the `idx`-th bound parameter (1-based).
    fn param(&self, idx: usize) -> String;

    /// `field IN (..)`, or `NOT IN` when `negated`, binding from `start_idx`.
    ///
    /// Returns the fragment and the parameters it consumed.
    fn list_membership(
        &self,
        field: &str,
        values: &[Value],
        negated: bool,
        start_idx: usize,
    ) -> (String, Vec<Value>);

    /// Whether `(a, b) > (x, y)` row-value comparison is understood.
    fn supports_row_values(&self) -> bool {
        true
    }
}

/// Postgres: `$n` placeholders, lists bound as one array parameter.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct Postgres;

impl Dialect for Postgres {
    fn param(&self, idx: usize) -> String {
        format!("${idx}")
    }

    fn list_membership(
        &self,
        field: &str,
        values: &[Value],
        negated: bool,
        start_idx: usize,
    ) -> (String, Vec<Value>) {
        let test = if negated { "<> ALL" } else { "= ANY" };
        (
            format!("{field} {test}({})", self.param(start_idx)),
            vec![Value::Array(values.to_vec())],
        )
    }
}

/// `SQLite`: `?n` placeholders, one per list element.
///
/// Row values need SQLite 3.15 or newer.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn param(&self, idx: usize) -> String {
        format!("?{idx}")
    }

    fn list_membership(
        &self,
        field: &str,
        values: &[Value],
        negated: bool,
        start_idx: usize,
    ) -> (String, Vec<Value>) {
        // `x IN ()` does not parse
        if values.is_empty() {
            let truth = if negated { "1=1" } else { "1=0" };
            return (truth.to_string(), Vec::new());
        }
        let placeholders = (start_idx..start_idx + values.len())
            .map(|idx| self.param(idx))
            .collect::<Vec<_>>()
            .join(", ");
        let keyword = if negated { "NOT IN" } else { "IN" };
        (format!("{field} {keyword} ({placeholders})"), values.to_vec())
    }
}
