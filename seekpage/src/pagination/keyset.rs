//! Keyset comparison: the predicate that continues a scan past a boundary row.

use crate::builder::{CompoundFilter, Filter, FilterExpr, LogicalOp, Operator, SortDir, Value};
use crate::dialect::Dialect;
use crate::error::PaginateError;
use crate::validate::unqualified;

use super::cursor::Cursor;
use super::value::CursorValue;

/// How a multi-field keyset condition is written into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TupleComparison {
    /// Row-value comparison: `(a, b) > ($1, $2)`.
    #[default]
    Native,
    /// Equivalent disjunction: `(a > $1) OR (a = $2 AND b > $3)`.
    Expanded,
}

/// Keyset pagination condition.
///
/// The operator depends only on the direction the fetch is sorted in:
/// ascending scans continue with `>`, descending scans with `<`. A backward
/// page is fetched in the inverted direction, so the same rule applies.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetCondition {
    /// Sort fields as written in SQL (possibly alias-qualified).
    pub fields: Vec<String>,
    /// Boundary value for each field, bound as parameters.
    pub values: Vec<Value>,
    /// `Gt` or `Lt`.
    pub op: Operator,
}

impl KeysetCondition {
    /// Build the condition for rows strictly past `cursor` when sorted by
    /// `fields` in `dir`.
    ///
    /// Cursor entries are matched to fields by unqualified name. A field with
    /// no entry, or with a null entry, is a `MalformedPayload`.
    pub fn new(fields: &[String], dir: SortDir, cursor: &Cursor) -> Result<Self, PaginateError> {
        if fields.is_empty() {
            return Err(PaginateError::InvalidRequest(
                "keyset condition needs at least one sort field".into(),
            ));
        }

        let values = fields
            .iter()
            .map(|field| {
                let key = unqualified(field);
                match cursor.get(key) {
                    None => Err(PaginateError::MalformedPayload(format!(
                        "token has no value for '{key}'"
                    ))),
                    // Comparisons against NULL match no rows
                    Some(CursorValue::Null) => Err(PaginateError::MalformedPayload(format!(
                        "token value for '{key}' is null; nullable sort keys cannot anchor a page"
                    ))),
                    Some(value) => Ok(Value::from(value.clone())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fields: fields.to_vec(),
            values,
            op: Self::operator_for(dir),
        })
    }

    /// `Gt` for ascending, `Lt` for descending.
    #[must_use]
    pub const fn operator_for(dir: SortDir) -> Operator {
        match dir {
            SortDir::Asc => Operator::Gt,
            SortDir::Desc => Operator::Lt,
        }
    }

    /// Render as a row-value comparison.
    ///
    /// Single field: `field > $1`. Several: `(a, b) > ($1, $2)`.
    pub fn to_sql<D: Dialect>(&self, dialect: &D, start_idx: usize) -> (String, Vec<Value>, usize) {
        let op = self.op.as_sql();
        let placeholders: Vec<String> = (0..self.values.len())
            .map(|i| dialect.param(start_idx + i))
            .collect();

        let sql = if self.fields.len() == 1 {
            format!("{} {op} {}", self.fields.join(""), placeholders.join(""))
        } else {
            format!(
                "({}) {op} ({})",
                self.fields.join(", "),
                placeholders.join(", ")
            )
        };

        (sql, self.values.clone(), start_idx + self.values.len())
    }

    /// Convert to a filter expression for collaborators without row values.
    ///
    /// `(a, b, c) > (1, 2, 3)` expands to:
    ///
    /// ```text
    /// (a > 1)
    /// OR (a = 1 AND b > 2)
    /// OR (a = 1 AND b = 2 AND c > 3)
    /// ```
    ///
    /// See: <https://use-the-index-luke.com/no-offset>
    #[must_use]
    pub fn to_filter_expr(&self) -> FilterExpr {
        let pairs: Vec<(&String, &Value)> = self.fields.iter().zip(&self.values).collect();

        let mut or_conditions: Vec<FilterExpr> = pairs
            .iter()
            .enumerate()
            .map(|(i, (field, value))| {
                let mut and_conditions: Vec<FilterExpr> = pairs
                    .iter()
                    .take(i)
                    .map(|(prev, prev_value)| {
                        FilterExpr::Simple(Filter {
                            field: (*prev).clone(),
                            op: Operator::Eq,
                            value: (*prev_value).clone(),
                        })
                    })
                    .collect();
                and_conditions.push(FilterExpr::Simple(Filter {
                    field: (*field).clone(),
                    op: self.op,
                    value: (*value).clone(),
                }));

                if and_conditions.len() == 1 {
                    and_conditions.swap_remove(0)
                } else {
                    FilterExpr::Compound(CompoundFilter::and(and_conditions))
                }
            })
            .collect();

        if or_conditions.len() == 1 {
            or_conditions.swap_remove(0)
        } else {
            FilterExpr::Compound(CompoundFilter {
                op: LogicalOp::Or,
                filters: or_conditions,
            })
        }
    }
}
