//! Core types for the SELECT builder.

use crate::validate::{assert_valid_join_condition, assert_valid_qualified_identifier};

/// SQL comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal: `=`
    Eq,
    /// Not equal: `!=`
    Ne,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Gte,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Lte,
    /// List membership, rendered per dialect
    In,
    /// Negated list membership
    NotIn,
    /// Pattern match: `LIKE`
    Like,
}

impl Operator {
    /// SQL token for the scalar comparison operators.
    pub(crate) const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
        }
    }
}

/// Logical operators for compound filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// All conditions must match: `AND`
    And,
    /// At least one condition must match: `OR`
    Or,
    /// Negate the condition: `NOT`
    Not,
}

/// A filter expression that can be simple or compound.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// A simple field comparison.
    Simple(Filter),
    /// A compound filter with logical operator.
    Compound(CompoundFilter),
}

/// A compound filter combining multiple expressions with a logical operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundFilter {
    /// How `filters` combine.
    pub op: LogicalOp,
    /// Operands. `Not` negates their conjunction.
    pub filters: Vec<FilterExpr>,
}

impl CompoundFilter {
    /// Create an AND compound filter.
    #[must_use]
    pub const fn and(filters: Vec<FilterExpr>) -> Self {
        Self {
            op: LogicalOp::And,
            filters,
        }
    }

    /// Create an OR compound filter.
    #[must_use]
    pub const fn or(filters: Vec<FilterExpr>) -> Self {
        Self {
            op: LogicalOp::Or,
            filters,
        }
    }

    /// Create a NOT compound filter (wraps a single filter).
    #[must_use]
    pub fn not(filter: FilterExpr) -> Self {
        Self {
            op: LogicalOp::Not,
            filters: vec![filter],
        }
    }
}

/// SQL parameter values.
///
/// Every value reaching a statement travels through the parameter list,
/// never through the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// Text.
    String(String),
    /// List operand of `In` / `NotIn`.
    Array(Vec<Value>),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortDir {
    /// The opposite direction.
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub(crate) const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort field with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Column, optionally alias-qualified.
    pub field: String,
    /// Direction for this column.
    pub dir: SortDir,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

/// Filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column, optionally alias-qualified.
    pub field: String,
    /// Comparison.
    pub op: Operator,
    /// Bound operand.
    pub value: Value,
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
}

/// A join clause attached to a query.
///
/// Joins are first-class so the paginator can detach them for the count and
/// the key-only subquery, then reattach them for the outer fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Inner or left.
    pub kind: JoinKind,
    /// Joined table, optionally followed by an alias (`"authors a"`).
    pub table: String,
    /// The `ON` condition, column equalities joined with `AND`.
    pub on: String,
}

impl Join {
    /// Create an inner join.
    ///
    /// # Panics
    ///
    /// Panics if the table or condition contains anything besides
    /// identifiers, `=` and `AND`.
    pub fn inner(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, table.into(), on.into())
    }

    /// Create a left join.
    ///
    /// # Panics
    ///
    /// Same rules as [`Join::inner`].
    pub fn left(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, table.into(), on.into())
    }

    fn new(kind: JoinKind, table: String, on: String) -> Self {
        let mut parts = table.split_whitespace();
        if let Some(name) = parts.next() {
            assert_valid_qualified_identifier(name, "join table");
        }
        for alias in parts {
            assert_valid_qualified_identifier(alias, "join alias");
        }
        assert_valid_join_condition(&on);
        Self { kind, table, on }
    }

    pub(crate) fn to_sql(&self) -> String {
        let kw = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        };
        format!("{kw} {} ON {}", self.table, self.on)
    }
}

/// A rendered statement: SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "Statement must be handed to an executor"]
pub struct Statement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<Value>,
}

/// Helper function to create a simple filter expression.
///
/// # Panics
///
/// Panics if the field name is not a valid (optionally qualified) SQL identifier.
pub fn simple(field: impl Into<String>, op: Operator, value: Value) -> FilterExpr {
    let field = field.into();
    assert_valid_qualified_identifier(&field, "filter field");
    FilterExpr::Simple(Filter { field, op, value })
}

/// Helper function to create an AND compound filter.
#[must_use]
pub const fn and(filters: Vec<FilterExpr>) -> FilterExpr {
    FilterExpr::Compound(CompoundFilter::and(filters))
}

/// Helper function to create an OR compound filter.
#[must_use]
pub const fn or(filters: Vec<FilterExpr>) -> FilterExpr {
    FilterExpr::Compound(CompoundFilter::or(filters))
}

/// Helper function to create a NOT filter.
#[must_use]
pub fn not(filter: FilterExpr) -> FilterExpr {
    FilterExpr::Compound(CompoundFilter::not(filter))
}
