//! In-memory SQLite fixtures shared by the integration tests.
#![allow(dead_code)]

use rusqlite::{Connection, Row, params, params_from_iter};
use seekpage::{CancelToken, ExecError, Executor, QueryBuilder, SortKeys, Sqlite, Statement, Value};

/// A row of the `events` table joined with its author.
#[derive(Debug, Clone, PartialEq, SortKeys)]
pub struct Event {
    pub id: i64,
    pub seq: i64,
    pub grp: i64,
    pub title: String,
    #[sort_key(skip)]
    pub author: String,
}

/// Columns matching [`event_row`].
pub const EVENT_COLUMNS: &[&str] = &["e.id", "e.seq", "e.grp", "e.title", "a.name"];

pub fn event_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        seq: row.get(1)?,
        grp: row.get(2)?,
        title: row.get(3)?,
        author: row.get(4)?,
    })
}

/// `events e JOIN authors a`, projected for [`event_row`].
pub fn events_query() -> QueryBuilder<Sqlite> {
    seekpage::sqlite("events")
        .alias("e")
        .fields(EVENT_COLUMNS)
        .join(seekpage::Join::inner("authors a", "a.id = e.author_id"))
}

/// Fresh database with `n` events: `seq` runs 1..=n, `grp` groups every
/// four consecutive events so it ties.
pub fn seeded(n: i64) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE events (
             id INTEGER PRIMARY KEY,
             seq INTEGER NOT NULL,
             grp INTEGER NOT NULL,
             title TEXT NOT NULL,
             author_id INTEGER NOT NULL REFERENCES authors(id)
         );
         INSERT INTO authors (id, name) VALUES (1, 'ada'), (2, 'grace'), (3, 'linus');",
    )
    .unwrap();

    for seq in 1..=n {
        conn.execute(
            "INSERT INTO events (id, seq, grp, title, author_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![100 + seq, seq, (seq - 1) / 4, format!("event {seq}"), seq % 3 + 1],
        )
        .unwrap();
    }
    conn
}

/// Runs statements against SQLite and records their SQL.
pub struct SqliteExec<R> {
    pub conn: Connection,
    map: fn(&Row<'_>) -> rusqlite::Result<R>,
    pub log: Vec<String>,
    /// Trip the call's cancel token once the count has run.
    pub cancel_after_count: bool,
}

impl SqliteExec<Event> {
    pub fn events(conn: Connection) -> Self {
        Self::new(conn, event_row)
    }
}

impl<R> SqliteExec<R> {
    pub fn new(conn: Connection, map: fn(&Row<'_>) -> rusqlite::Result<R>) -> Self {
        Self {
            conn,
            map,
            log: Vec::new(),
            cancel_after_count: false,
        }
    }

    /// Run a statement outside the paginator.
    pub fn query(&self, stmt: &Statement) -> Vec<R> {
        let params = bind_all(&stmt.params).unwrap();
        let mut prepared = self.conn.prepare(&stmt.sql).unwrap();
        prepared
            .query_map(params_from_iter(params.iter()), self.map)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }
}

fn bind(value: &Value) -> Result<rusqlite::types::Value, ExecError> {
    use rusqlite::types::Value as Sql;

    Ok(match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Int(i) => Sql::Integer(*i),
        Value::Float(f) => Sql::Real(*f),
        Value::String(s) => Sql::Text(s.clone()),
        Value::Array(_) => return Err(ExecError::failed("array parameters need Postgres")),
    })
}

fn bind_all(values: &[Value]) -> Result<Vec<rusqlite::types::Value>, ExecError> {
    values.iter().map(bind).collect()
}

impl<R> Executor for SqliteExec<R> {
    type Row = R;

    fn count(&mut self, stmt: &Statement, cancel: &CancelToken) -> Result<u64, ExecError> {
        self.log.push(stmt.sql.clone());
        let params = bind_all(&stmt.params)?;
        let n: i64 = self
            .conn
            .query_row(&stmt.sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(ExecError::failed)?;
        if self.cancel_after_count {
            cancel.cancel();
        }
        u64::try_from(n).map_err(ExecError::failed)
    }

    fn fetch(&mut self, stmt: &Statement, cancel: &CancelToken) -> Result<Vec<R>, ExecError> {
        if cancel.is_canceled() {
            return Err(ExecError::Canceled);
        }
        self.log.push(stmt.sql.clone());
        let params = bind_all(&stmt.params)?;
        let mut prepared = self.conn.prepare(&stmt.sql).map_err(ExecError::failed)?;
        let rows = prepared
            .query_map(params_from_iter(params.iter()), self.map)
            .map_err(ExecError::failed)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(ExecError::failed)
    }
}

/// Print pagination events for `cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn seqs(events: &[Event]) -> Vec<i64> {
    events.iter().map(|e| e.seq).collect()
}
