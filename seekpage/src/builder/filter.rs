//! Filter rendering shared by the statements the paginator issues.

use super::types::{CompoundFilter, Filter, FilterExpr, LogicalOp, Operator, Value};
use crate::dialect::Dialect;

/// Render a filter expression (simple or compound).
///
/// Returns the SQL fragment, its parameters, and the next free placeholder index.
pub(crate) fn build_filter_expr_impl<D: Dialect>(
    dialect: &D,
    expr: &FilterExpr,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    match expr {
        FilterExpr::Simple(filter) => build_condition_impl(dialect, filter, start_idx),
        FilterExpr::Compound(compound) => build_compound_filter_impl(dialect, compound, start_idx),
    }
}

fn build_compound_filter_impl<D: Dialect>(
    dialect: &D,
    compound: &CompoundFilter,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    let mut idx = start_idx;
    let mut all_params = Vec::new();
    let mut conditions = Vec::with_capacity(compound.filters.len());

    for filter_expr in &compound.filters {
        let (condition, params, new_idx) = build_filter_expr_impl(dialect, filter_expr, idx);
        conditions.push(condition);
        all_params.extend(params);
        idx = new_idx;
    }

    let joiner = match compound.op {
        LogicalOp::And => " AND ",
        LogicalOp::Or => " OR ",
        LogicalOp::Not => {
            // Several operands negate their conjunction
            let inner = if conditions.is_empty() {
                "1=1".to_string()
            } else {
                conditions.join(" AND ")
            };
            return (format!("NOT ({inner})"), all_params, idx);
        },
    };

    let sql = match conditions.len() {
        // Empty AND is vacuously true, empty OR is false
        0 if compound.op == LogicalOp::And => "1=1".to_string(),
        0 => "1=0".to_string(),
        1 => conditions.swap_remove(0),
        _ => format!("({})", conditions.join(joiner)),
    };

    (sql, all_params, idx)
}

/// Render a single comparison.
pub(crate) fn build_condition_impl<D: Dialect>(
    dialect: &D,
    filter: &Filter,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    let field = &filter.field;
    let idx = start_idx;

    match (filter.op, &filter.value) {
        (Operator::Eq, Value::Null) => (format!("{field} IS NULL"), vec![], idx),
        (Operator::Ne, Value::Null) => (format!("{field} IS NOT NULL"), vec![], idx),

        (Operator::In | Operator::NotIn, Value::Array(values)) => {
            let negated = filter.op == Operator::NotIn;
            let (sql, params) = dialect.list_membership(field, values, negated, idx);
            let next = idx + params.len();
            (sql, params, next)
        },
        // A scalar operand degrades to (in)equality
        (Operator::In | Operator::NotIn, value) => {
            let op = if filter.op == Operator::In { "=" } else { "!=" };
            let sql = format!("{field} {op} {}", dialect.param(idx));
            (sql, vec![value.clone()], idx + 1)
        },

        (op, value) => {
            let sql = format!("{field} {} {}", op.as_sql(), dialect.param(idx));
            (sql, vec![value.clone()], idx + 1)
        },
    }
}
