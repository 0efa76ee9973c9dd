//! Strategy selection and page assembly.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::builder::{QueryBuilder, SortDir, SortField, Statement};
use crate::config::{PaginatorConfig, check_limit};
use crate::dialect::Dialect;
use crate::error::{PaginateError, Stage};
use crate::executor::{CancelToken, Executor};
use crate::validate::{parse_field_list, unqualified};

use super::boundary::{SortKeys, extract_boundary};
use super::cursor::Cursor;
use super::keyset::{KeysetCondition, TupleComparison};
use super::page_info::PageInfo;

/// How a page was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// First page: sort and limit.
    Plain,
    /// Positive offset: key-only subquery, then the full rows for those keys.
    DeferredJoin,
    /// Token navigation. `backward` is set for previous-token calls.
    Cursor {
        /// Fetched in the inverted direction, then reversed.
        backward: bool,
    },
}

/// One page of results with navigation tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Rows in the configured sort direction.
    pub data: Vec<T>,
    /// Rows matching the query filters, ignoring pagination.
    pub total: u64,
    /// Token pointing at the first row. `None` when `data` is empty.
    pub prev_token: Option<String>,
    /// Token pointing at the last row. `None` when `data` is empty.
    pub next_token: Option<String>,
    /// Whether rows exist before this page.
    pub has_prev: bool,
    /// Whether rows exist after this page.
    pub has_next: bool,
    /// `None` for the zero-total short circuit.
    pub strategy: Option<Strategy>,
}

impl<T> Page<T> {
    fn empty(total: u64, strategy: Option<Strategy>) -> Self {
        Self {
            data: Vec::new(),
            total,
            prev_token: None,
            next_token: None,
            has_prev: false,
            has_next: false,
            strategy,
        }
    }

    /// Number of rows on this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Response metadata. A token is only exposed when its flag is set.
    pub fn page_info(&self) -> PageInfo {
        PageInfo::new(self.has_prev, self.has_next)
            .with_cursors(self.prev_token.clone(), self.next_token.clone())
            .with_total(self.total)
    }
}

/// A fetch statement and what the paginator needs to interpret its rows.
struct Plan {
    strategy: Strategy,
    statement: Statement,
    fetch_dir: SortDir,
}

/// Paginates a pre-filtered query.
///
/// The paginator owns ordering, limit and offset of the fetch statements;
/// any set on the query are replaced. It is never mutated by a call, so one
/// value can serve many requests.
///
/// The count and the deferred-join key subquery run without the query's
/// joins, so filters must only reference the base table. Queries filtering
/// on joined columns should page with tokens from `start(0)`.
///
/// ```
/// use seekpage::prelude::*;
///
/// let query = sqlite("posts").filter("published", Operator::Eq, Value::Bool(true));
/// let paginator = Paginator::new(query, 10)
///     .sort_fields("created_at, id")
///     .unwrap()
///     .direction(SortDir::Asc);
///
/// assert_eq!(paginator.limit(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct Paginator<D: Dialect> {
    query: QueryBuilder<D>,
    sort_fields: Vec<String>,
    primary_keys: Vec<String>,
    start: u64,
    limit: u64,
    direction: SortDir,
    tuple_comparison: TupleComparison,
    max_limit: Option<u64>,
}

impl<D: Dialect> Paginator<D> {
    /// Paginate `query`, `limit` rows per page, sorted by `created_at`
    /// descending.
    pub fn new(query: QueryBuilder<D>, limit: u64) -> Self {
        Self {
            query,
            sort_fields: vec!["created_at".to_string()],
            primary_keys: vec!["id".to_string()],
            start: 0,
            limit,
            direction: SortDir::default(),
            tuple_comparison: TupleComparison::default(),
            max_limit: None,
        }
    }

    /// Build from loaded settings.
    pub fn from_config(
        query: QueryBuilder<D>,
        config: &PaginatorConfig,
    ) -> Result<Self, PaginateError> {
        config.validate()?;
        Ok(Self::new(query, config.limit)
            .sort_fields(&config.sort_fields)?
            .primary_keys(&config.primary_keys)?
            .direction(config.direction)
            .tuple_comparison(config.tuple_comparison)
            .max_limit(config.max_limit))
    }

    /// Comma separated sort fields, e.g. `"p.created_at, p.id"`.
    pub fn sort_fields(mut self, fields: &str) -> Result<Self, PaginateError> {
        self.sort_fields = parse_field_list(fields, "sort field")?;
        Ok(self)
    }

    /// Comma separated primary-key fields used by the deferred-join subquery.
    pub fn primary_keys(mut self, fields: &str) -> Result<Self, PaginateError> {
        self.primary_keys = parse_field_list(fields, "primary key")?;
        Ok(self)
    }

    /// Configured sort direction.
    pub const fn direction(mut self, direction: SortDir) -> Self {
        self.direction = direction;
        self
    }

    /// Starting offset for token-less calls.
    pub const fn start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// How multi-field keyset conditions are rendered.
    pub const fn tuple_comparison(mut self, mode: TupleComparison) -> Self {
        self.tuple_comparison = mode;
        self
    }

    /// Reject calls whose limit exceeds `max`.
    pub const fn max_limit(mut self, max: u64) -> Self {
        self.max_limit = Some(max);
        self
    }

    /// Page size.
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// The configured direction. Backward navigation never changes it.
    pub const fn configured_direction(&self) -> SortDir {
        self.direction
    }

    /// The sort fields as written in SQL.
    pub fn sort_field_names(&self) -> &[String] {
        &self.sort_fields
    }

    /// Fetch one page.
    ///
    /// Pass empty strings for absent tokens. With neither token the page
    /// starts at the configured offset; `next` continues after the row it
    /// points at, `prev` ends before it. If both are given, `prev` wins.
    pub fn paginate<E>(
        &self,
        exec: &mut E,
        prev: &str,
        next: &str,
    ) -> Result<Page<E::Row>, PaginateError>
    where
        E: Executor + ?Sized,
        E::Row: SortKeys,
    {
        self.paginate_with_cancel(exec, &CancelToken::new(), prev, next)
    }

    /// [`paginate`](Self::paginate) observing a cancel signal.
    ///
    /// The token is checked before and after every statement and handed to
    /// the executor. A canceled call returns [`PaginateError::Canceled`] and
    /// no rows.
    pub fn paginate_with_cancel<E>(
        &self,
        exec: &mut E,
        cancel: &CancelToken,
        prev: &str,
        next: &str,
    ) -> Result<Page<E::Row>, PaginateError>
    where
        E: Executor + ?Sized,
        E::Row: SortKeys,
    {
        check_limit(self.limit, self.max_limit)?;
        ensure_live(cancel)?;

        let total = self.count(exec, cancel)?;
        ensure_live(cancel)?;
        if total == 0 {
            debug!(total, "no matching rows");
            return Ok(Page::empty(0, None));
        }

        let plan = self.plan(prev, next)?;
        trace!(sql = %plan.statement.sql, "fetch statement");
        let mut rows = exec
            .fetch(&plan.statement, cancel)
            .map_err(|e| e.at(Stage::Fetch))?;
        ensure_live(cancel)?;

        let keep = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let more = rows.len() > keep;
        rows.truncate(keep);

        debug!(
            strategy = ?plan.strategy,
            direction = ?plan.fetch_dir,
            total,
            rows = rows.len(),
            more,
            "fetched page"
        );

        if rows.is_empty() {
            debug!(total, "page is past the end of the result set");
            return Ok(Page::empty(total, Some(plan.strategy)));
        }

        let (has_prev, has_next) = match plan.strategy {
            Strategy::Plain => (false, more),
            Strategy::DeferredJoin => (self.start > 0, more),
            Strategy::Cursor { backward: false } => (true, more),
            Strategy::Cursor { backward: true } => {
                rows.reverse();
                (more, true)
            },
        };

        let (prev_token, next_token) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (
                extract_boundary(first, &self.sort_fields)?.encode()?,
                extract_boundary(last, &self.sort_fields)?.encode()?,
            ),
            _ => return Ok(Page::empty(total, Some(plan.strategy))),
        };

        Ok(Page {
            data: rows,
            total,
            prev_token: Some(prev_token),
            next_token: Some(next_token),
            has_prev,
            has_next,
            strategy: Some(plan.strategy),
        })
    }

    /// Count the filtered set with joins detached.
    fn count<E: Executor + ?Sized>(
        &self,
        exec: &mut E,
        cancel: &CancelToken,
    ) -> Result<u64, PaginateError> {
        let mut counted = self.query.clone().without_paging();
        counted.take_joins();
        let stmt = counted.count_statement();
        trace!(sql = %stmt.sql, "count statement");
        exec.count(&stmt, cancel).map_err(|e| e.at(Stage::Count))
    }

    fn plan(&self, prev: &str, next: &str) -> Result<Plan, PaginateError> {
        let fetch = self.limit.saturating_add(1);
        let base = self.query.clone().without_paging();

        if prev.is_empty() && next.is_empty() {
            let sorts = self.sorts(self.direction);
            if self.start == 0 {
                return Ok(Plan {
                    strategy: Strategy::Plain,
                    statement: base.order_by(sorts).limit(fetch).build(),
                    fetch_dir: self.direction,
                });
            }

            let mut keys = base.clone();
            keys.take_joins();
            keys.set_projection(self.primary_keys.clone());
            let keys = keys.order_by(sorts.clone()).limit(fetch).offset(self.start);

            return Ok(Plan {
                strategy: Strategy::DeferredJoin,
                statement: base
                    .where_in_subquery(self.primary_keys.clone(), keys)
                    .order_by(sorts)
                    .build(),
                fetch_dir: self.direction,
            });
        }

        if !prev.is_empty() && !next.is_empty() {
            warn!("both prev and next tokens supplied; using prev");
        }
        let backward = !prev.is_empty();
        let token = if backward { prev } else { next };

        let cursor = Cursor::decode(token)?;
        let names: Vec<&str> = self.sort_fields.iter().map(|f| unqualified(f)).collect();
        cursor.ensure_keys(&names)?;

        let fetch_dir = if backward {
            self.direction.invert()
        } else {
            self.direction
        };
        let keyset = KeysetCondition::new(&self.sort_fields, fetch_dir, &cursor)?;

        Ok(Plan {
            strategy: Strategy::Cursor { backward },
            statement: base
                .keyset(keyset)
                .tuple_comparison(self.tuple_comparison)
                .order_by(self.sorts(fetch_dir))
                .limit(fetch)
                .build(),
            fetch_dir,
        })
    }

    fn sorts(&self, dir: SortDir) -> Vec<SortField> {
        self.sort_fields
            .iter()
            .map(|field| SortField::new(field.clone(), dir))
            .collect()
    }
}

fn ensure_live(cancel: &CancelToken) -> Result<(), PaginateError> {
    if cancel.is_canceled() {
        return Err(PaginateError::Canceled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ExecError};
    use crate::pagination::CursorValue;
    use crate::{Join, Operator, Value, postgres};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        created_at: String,
    }

    impl SortKeys for Item {
        const SORT_KEYS: &'static [&'static str] = &["id", "created_at"];

        fn sort_key(&self, name: &str) -> Option<CursorValue> {
            match name {
                "id" => Some(self.id.into()),
                "created_at" => Some(self.created_at.as_str().into()),
                _ => None,
            }
        }
    }

    fn item(id: i64) -> Item {
        Item {
            id,
            created_at: format!("2024-01-{id:02}"),
        }
    }

    /// Records statements and replays canned results.
    #[derive(Default)]
    struct Scripted {
        total: u64,
        rows: Vec<Item>,
        statements: Vec<Statement>,
        fail_count: bool,
        fail_fetch: bool,
        cancel_on_fetch: Option<CancelToken>,
    }

    impl Executor for Scripted {
        type Row = Item;

        fn count(&mut self, stmt: &Statement, _cancel: &CancelToken) -> Result<u64, ExecError> {
            self.statements.push(stmt.clone());
            if self.fail_count {
                return Err(ExecError::failed("connection reset"));
            }
            Ok(self.total)
        }

        fn fetch(
            &mut self,
            stmt: &Statement,
            _cancel: &CancelToken,
        ) -> Result<Vec<Item>, ExecError> {
            self.statements.push(stmt.clone());
            if self.fail_fetch {
                return Err(ExecError::failed("relation does not exist"));
            }
            if let Some(cancel) = &self.cancel_on_fetch {
                cancel.cancel();
            }
            Ok(self.rows.clone())
        }
    }

    fn paginator() -> Paginator<crate::Postgres> {
        Paginator::new(
            postgres("items")
                .alias("i")
                .join(Join::inner("owners o", "o.id = i.owner_id"))
                .filter("i.active", Operator::Eq, Value::Bool(true)),
            2,
        )
        .sort_fields("i.id")
        .unwrap()
        .primary_keys("i.id")
        .unwrap()
        .direction(SortDir::Asc)
    }

    #[test]
    fn test_count_detaches_joins() {
        let mut exec = Scripted {
            total: 5,
            rows: vec![item(1), item(2), item(3)],
            ..Scripted::default()
        };
        paginator().paginate(&mut exec, "", "").unwrap();

        assert_eq!(
            exec.statements[0].sql,
            "SELECT COUNT(*) FROM items i WHERE i.active = $1"
        );
    }

    #[test]
    fn test_plain_scan_fetches_one_extra_row() {
        let mut exec = Scripted {
            total: 5,
            rows: vec![item(1), item(2), item(3)],
            ..Scripted::default()
        };
        let page = paginator().paginate(&mut exec, "", "").unwrap();

        insta::assert_snapshot!(exec.statements[1].sql, @"SELECT * FROM items i JOIN owners o ON o.id = i.owner_id WHERE i.active = $1 ORDER BY i.id ASC LIMIT 3");
        assert_eq!(page.data, vec![item(1), item(2)]);
        assert_eq!(page.total, 5);
        assert_eq!(page.strategy, Some(Strategy::Plain));
        assert!(page.has_next);
        assert!(!page.has_prev);

        let next = Cursor::decode(page.next_token.as_deref().unwrap()).unwrap();
        assert_eq!(next, Cursor::new().int("id", 2));
        let prev = Cursor::decode(page.prev_token.as_deref().unwrap()).unwrap();
        assert_eq!(prev, Cursor::new().int("id", 1));
    }

    #[test]
    fn test_deferred_join_statement() {
        let mut exec = Scripted {
            total: 10,
            rows: vec![item(5), item(6)],
            ..Scripted::default()
        };
        let page = paginator().start(4).paginate(&mut exec, "", "").unwrap();

        insta::assert_snapshot!(exec.statements[1].sql, @"SELECT * FROM items i JOIN owners o ON o.id = i.owner_id WHERE i.id IN (SELECT i.id FROM items i WHERE i.active = $1 ORDER BY i.id ASC LIMIT 3 OFFSET 4) AND i.active = $2 ORDER BY i.id ASC");
        assert_eq!(page.strategy, Some(Strategy::DeferredJoin));
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn test_next_token_uses_configured_direction() {
        let token = Cursor::new().int("id", 2).encode().unwrap();
        let mut exec = Scripted {
            total: 5,
            rows: vec![item(3), item(4)],
            ..Scripted::default()
        };
        let page = paginator().start(8).paginate(&mut exec, "", &token).unwrap();

        insta::assert_snapshot!(exec.statements[1].sql, @"SELECT * FROM items i JOIN owners o ON o.id = i.owner_id WHERE i.active = $1 AND i.id > $2 ORDER BY i.id ASC LIMIT 3");
        assert_eq!(exec.statements[1].params[1], Value::Int(2));
        assert_eq!(page.strategy, Some(Strategy::Cursor { backward: false }));
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn test_prev_token_inverts_then_restores_order() {
        let token = Cursor::new().int("id", 5).encode().unwrap();
        let mut exec = Scripted {
            total: 5,
            // Fetched in inverted (descending) order
            rows: vec![item(4), item(3), item(2)],
            ..Scripted::default()
        };
        let paginator = paginator();
        let page = paginator.paginate(&mut exec, &token, "").unwrap();

        insta::assert_snapshot!(exec.statements[1].sql, @"SELECT * FROM items i JOIN owners o ON o.id = i.owner_id WHERE i.active = $1 AND i.id < $2 ORDER BY i.id DESC LIMIT 3");
        assert_eq!(page.data, vec![item(3), item(4)]);
        assert!(page.has_prev);
        assert!(page.has_next);
        assert_eq!(paginator.configured_direction(), SortDir::Asc);
    }

    #[test]
    fn test_prev_wins_over_next() {
        let prev = Cursor::new().int("id", 5).encode().unwrap();
        let next = Cursor::new().int("id", 1).encode().unwrap();
        let mut exec = Scripted {
            total: 5,
            rows: vec![item(4)],
            ..Scripted::default()
        };
        let page = paginator().paginate(&mut exec, &prev, &next).unwrap();

        assert_eq!(page.strategy, Some(Strategy::Cursor { backward: true }));
        assert_eq!(exec.statements[1].params[1], Value::Int(5));
    }

    #[test]
    fn test_zero_total_short_circuits() {
        let mut exec = Scripted::default();
        let page = paginator().paginate(&mut exec, "", "").unwrap();

        assert_eq!(exec.statements.len(), 1);
        assert_eq!(page, Page::empty(0, None));
    }

    #[test]
    fn test_past_the_end_is_empty_not_error() {
        let token = Cursor::new().int("id", 99).encode().unwrap();
        let mut exec = Scripted {
            total: 5,
            ..Scripted::default()
        };
        let page = paginator().paginate(&mut exec, "", &token).unwrap();

        assert_eq!(page.total, 5);
        assert!(page.is_empty());
        assert!(page.next_token.is_none());
        assert!(page.prev_token.is_none());
        assert!(!page.has_next);
    }

    #[test]
    fn test_token_shape_must_match_sort_fields() {
        let token = Cursor::new().int("id", 2).int("extra", 1).encode().unwrap();
        let mut exec = Scripted {
            total: 5,
            ..Scripted::default()
        };
        let err = paginator().paginate(&mut exec, "", &token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
        assert_eq!(exec.statements.len(), 1);
    }

    #[test]
    fn test_count_failure_stops_before_fetch() {
        let mut exec = Scripted {
            fail_count: true,
            ..Scripted::default()
        };
        let err = paginator().paginate(&mut exec, "", "").unwrap_err();

        assert!(matches!(
            err,
            PaginateError::QueryExecutionFailed {
                stage: Stage::Count,
                ..
            }
        ));
        assert_eq!(exec.statements.len(), 1);
    }

    #[test]
    fn test_fetch_failure() {
        let mut exec = Scripted {
            total: 3,
            fail_fetch: true,
            ..Scripted::default()
        };
        let err = paginator().paginate(&mut exec, "", "").unwrap_err();
        assert!(matches!(
            err,
            PaginateError::QueryExecutionFailed {
                stage: Stage::Fetch,
                ..
            }
        ));
    }

    #[test]
    fn test_cancel_mid_call_returns_no_page() {
        let cancel = CancelToken::new();
        let mut exec = Scripted {
            total: 3,
            rows: vec![item(1)],
            cancel_on_fetch: Some(cancel.clone()),
            ..Scripted::default()
        };
        let err = paginator()
            .paginate_with_cancel(&mut exec, &cancel, "", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);
    }

    #[test]
    fn test_canceled_before_start_runs_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut exec = Scripted::default();
        let err = paginator()
            .paginate_with_cancel(&mut exec, &cancel, "", "")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Canceled);
        assert!(exec.statements.is_empty());
    }

    #[test]
    fn test_extraction_failure_discards_rows() {
        let mut exec = Scripted {
            total: 3,
            rows: vec![item(1)],
            ..Scripted::default()
        };
        let err = paginator()
            .sort_fields("i.rank")
            .unwrap()
            .paginate(&mut exec, "", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_limit_validation() {
        let mut exec = Scripted::default();
        let err = Paginator::new(postgres("items"), 0)
            .paginate(&mut exec, "", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = Paginator::new(postgres("items"), 50)
            .max_limit(10)
            .paginate(&mut exec, "", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(exec.statements.is_empty());
    }

    #[test]
    fn test_invalid_sort_fields() {
        let err = Paginator::new(postgres("items"), 5)
            .sort_fields("id; DROP TABLE items")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_sort_fields_must_have_distinct_token_keys() {
        let err = Paginator::new(postgres("items"), 5)
            .sort_fields("i.id, o.id")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.to_string().contains("'o.id'"));
    }

    #[test]
    fn test_null_boundary_token_fails_loudly() {
        let token = Cursor::new().null("created_at").int("id", 2).encode().unwrap();
        let mut exec = Scripted {
            total: 3,
            ..Scripted::default()
        };
        let err = Paginator::new(postgres("items"), 2)
            .sort_fields("created_at, id")
            .unwrap()
            .paginate(&mut exec, "", &token)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
        assert_eq!(exec.statements.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let paginator = Paginator::new(postgres("items"), 5);
        assert_eq!(paginator.sort_field_names(), ["created_at".to_string()]);
        assert_eq!(paginator.configured_direction(), SortDir::Desc);
    }

    #[test]
    fn test_from_config() {
        let config = PaginatorConfig::from_toml_str(
            "sort_fields = \"created_at,id\"\ndirection = \"asc\"\nlimit = 2",
        )
        .unwrap();
        let paginator = Paginator::from_config(postgres("items"), &config).unwrap();
        let mut exec = Scripted {
            total: 3,
            rows: vec![item(1), item(2), item(3)],
            ..Scripted::default()
        };
        let page = paginator.paginate(&mut exec, "", "").unwrap();

        let next = Cursor::decode(page.next_token.as_deref().unwrap()).unwrap();
        assert_eq!(
            next,
            Cursor::new().string("created_at", "2024-01-02").int("id", 2)
        );
    }

    #[test]
    fn test_page_info_hides_tokens_without_flag() {
        let mut exec = Scripted {
            total: 2,
            rows: vec![item(1), item(2)],
            ..Scripted::default()
        };
        let page = paginator().paginate(&mut exec, "", "").unwrap();
        let info = page.page_info();

        assert!(page.next_token.is_some());
        assert!(!info.has_next);
        assert!(info.next_cursor.is_none());
        assert!(info.prev_cursor.is_none());
        assert_eq!(info.total, Some(2));
    }
}
