//! Statement execution seam.
//!
//! The paginator renders statements; an [`Executor`] runs them against a
//! database and maps rows into the caller's row type. Drivers stay outside
//! this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::builder::Statement;
use crate::error::ExecError;

/// Runs the statements issued by a [`Paginator`](crate::Paginator).
///
/// Both methods receive the call's [`CancelToken`]. Executors that can
/// interrupt a running statement should do so and return
/// [`ExecError::Canceled`]; the paginator also checks the token between
/// statements.
pub trait Executor {
    /// Row type produced by [`fetch`](Executor::fetch).
    type Row;

    /// Run a `SELECT COUNT(*)` statement and return the count.
    fn count(&mut self, stmt: &Statement, cancel: &CancelToken) -> Result<u64, ExecError>;

    /// Run a `SELECT` statement and map every row.
    fn fetch(&mut self, stmt: &Statement, cancel: &CancelToken)
    -> Result<Vec<Self::Row>, ExecError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    type Row = E::Row;

    fn count(&mut self, stmt: &Statement, cancel: &CancelToken) -> Result<u64, ExecError> {
        (**self).count(stmt, cancel)
    }

    fn fetch(
        &mut self,
        stmt: &Statement,
        cancel: &CancelToken,
    ) -> Result<Vec<Self::Row>, ExecError> {
        (**self).fetch(stmt, cancel)
    }
}

/// Cooperative cancellation flag shared between a caller and a pagination
/// call. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been canceled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
