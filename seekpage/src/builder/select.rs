//! SELECT statement builder.
//!
//! This is the statement side of the query collaborator: the caller describes
//! a pre-filtered query once, and the paginator derives the count, key-only
//! subquery and page fetch statements from it. Source, projection and joins
//! are exposed as explicit accessors so strategies can swap them without
//! reaching into builder internals.

use crate::dialect::Dialect;
use crate::pagination::{KeysetCondition, TupleComparison};
use crate::validate::assert_valid_qualified_identifier;

use super::filter::build_filter_expr_impl;
use super::types::{Filter, FilterExpr, Join, Operator, SortDir, SortField, Statement, Value};

/// Restriction `(pk...) IN (SELECT pk... FROM ...)`.
#[derive(Debug, Clone)]
struct InSubquery<D: Dialect> {
    fields: Vec<String>,
    query: Box<QueryBuilder<D>>,
}

/// SQL query builder with dialect support.
#[derive(Debug, Clone)]
pub struct QueryBuilder<D: Dialect> {
    dialect: D,
    table: String,
    alias: Option<String>,
    projection: Vec<String>,
    joins: Vec<Join>,
    filters: Vec<FilterExpr>,
    in_subquery: Option<InSubquery<D>>,
    keyset: Option<KeysetCondition>,
    tuple_comparison: TupleComparison,
    sorts: Vec<SortField>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<D: Dialect> QueryBuilder<D> {
    /// Create a new query builder for the given table.
    ///
    /// # Panics
    ///
    /// Panics if the table name is not a valid SQL identifier.
    pub fn new(dialect: D, table: impl Into<String>) -> Self {
        let table = table.into();
        assert_valid_qualified_identifier(&table, "table");
        Self {
            dialect,
            table,
            alias: None,
            projection: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            in_subquery: None,
            keyset: None,
            tuple_comparison: TupleComparison::default(),
            sorts: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Alias the source table (`FROM posts p`).
    ///
    /// # Panics
    ///
    /// Panics if the alias is not a valid SQL identifier.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        assert_valid_qualified_identifier(&alias, "table alias");
        self.alias = Some(alias);
        self
    }

    /// Set the columns to SELECT. Empty means `*`.
    ///
    /// # Panics
    ///
    /// Panics if any field name is not a valid SQL identifier.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.set_projection(fields.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Add a join clause.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add a filter condition.
    ///
    /// # Panics
    ///
    /// Panics if the field name is not a valid SQL identifier.
    pub fn filter(mut self, field: impl Into<String>, op: Operator, value: Value) -> Self {
        let field = field.into();
        assert_valid_qualified_identifier(&field, "filter field");
        self.filters
            .push(FilterExpr::Simple(Filter { field, op, value }));
        self
    }

    /// Add a filter expression. Multiple expressions are combined with `AND`.
    pub fn filter_expr(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    /// Add a sort field.
    ///
    /// # Panics
    ///
    /// Panics if the field name is not a valid SQL identifier.
    pub fn sort(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        let field = field.into();
        assert_valid_qualified_identifier(&field, "sort field");
        self.sorts.push(SortField::new(field, dir));
        self
    }

    /// Replace the sort order.
    pub fn order_by(mut self, sorts: Vec<SortField>) -> Self {
        self.sorts = sorts;
        self
    }

    /// Set a row limit.
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set a row offset.
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Restrict to rows past a keyset boundary.
    pub fn keyset(mut self, condition: KeysetCondition) -> Self {
        self.keyset = Some(condition);
        self
    }

    /// Choose how multi-field keyset conditions are rendered.
    pub const fn tuple_comparison(mut self, mode: TupleComparison) -> Self {
        self.tuple_comparison = mode;
        self
    }

    /// Restrict to rows whose `fields` appear in the result of `subquery`.
    ///
    /// # Panics
    ///
    /// Panics if any field name is not a valid SQL identifier.
    pub fn where_in_subquery(mut self, fields: Vec<String>, subquery: Self) -> Self {
        for field in &fields {
            assert_valid_qualified_identifier(field, "subquery key");
        }
        self.in_subquery = Some(InSubquery {
            fields,
            query: Box::new(subquery),
        });
        self
    }

    /// Drop ordering, limit, offset and keyset restriction, keeping source,
    /// projection, joins and filters.
    pub fn without_paging(mut self) -> Self {
        self.sorts.clear();
        self.limit = None;
        self.offset = None;
        self.keyset = None;
        self
    }

    /// The source table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The active column projection (empty means `*`).
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Replace the column projection.
    ///
    /// # Panics
    ///
    /// Panics if any field name is not a valid SQL identifier.
    pub fn set_projection(&mut self, projection: Vec<String>) {
        for field in &projection {
            assert_valid_qualified_identifier(field, "field");
        }
        self.projection = projection;
    }

    /// The attached join clauses.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Detach and return all join clauses.
    pub fn take_joins(&mut self) -> Vec<Join> {
        std::mem::take(&mut self.joins)
    }

    /// Replace the join clauses.
    pub fn set_joins(&mut self, joins: Vec<Join>) {
        self.joins = joins;
    }

    /// The current sort order.
    pub fn sort_fields(&self) -> &[SortField] {
        &self.sorts
    }

    /// `SELECT COUNT(*)` over the same source and filters.
    ///
    /// Ordering, limit and offset are not part of a count.
    pub fn count_statement(&self) -> Statement {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.source_sql());
        let (where_sql, params, _) = self.where_sql(1);
        sql.push_str(&where_sql);
        Statement { sql, params }
    }

    /// Build the SQL statement and parameters.
    pub fn build(&self) -> Statement {
        let (sql, params, _) = self.render(1);
        Statement { sql, params }
    }

    fn render(&self, start_idx: usize) -> (String, Vec<Value>, usize) {
        let select_str = if self.projection.is_empty() {
            "*".to_string()
        } else {
            self.projection.join(", ")
        };

        let mut sql = format!("SELECT {select_str} FROM {}", self.source_sql());
        let (where_sql, params, idx) = self.where_sql(start_idx);
        sql.push_str(&where_sql);

        if !self.sorts.is_empty() {
            let sort_parts: Vec<String> = self
                .sorts
                .iter()
                .map(|s| format!("{} {}", s.field, s.dir.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&sort_parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params, idx)
    }

    fn source_sql(&self) -> String {
        let mut sql = self.table.clone();
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(alias);
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql
    }

    /// Render ` WHERE ...` (or nothing) with placeholders from `start_idx`.
    fn where_sql(&self, start_idx: usize) -> (String, Vec<Value>, usize) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        let mut idx = start_idx;

        if let Some(sub) = &self.in_subquery {
            let (sub_sql, sub_params, new_idx) = sub.query.render(idx);
            let keys = if sub.fields.len() == 1 {
                sub.fields.join("")
            } else {
                format!("({})", sub.fields.join(", "))
            };
            conditions.push(format!("{keys} IN ({sub_sql})"));
            params.extend(sub_params);
            idx = new_idx;
        }

        for expr in &self.filters {
            let (condition, new_params, new_idx) = build_filter_expr_impl(&self.dialect, expr, idx);
            conditions.push(condition);
            params.extend(new_params);
            idx = new_idx;
        }

        if let Some(keyset) = &self.keyset {
            let native = self.tuple_comparison == TupleComparison::Native
                && self.dialect.supports_row_values();
            let (condition, new_params, new_idx) = if native {
                keyset.to_sql(&self.dialect, idx)
            } else {
                build_filter_expr_impl(&self.dialect, &keyset.to_filter_expr(), idx)
            };
            conditions.push(condition);
            params.extend(new_params);
            idx = new_idx;
        }

        if conditions.is_empty() {
            (String::new(), params, idx)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params, idx)
        }
    }
}
