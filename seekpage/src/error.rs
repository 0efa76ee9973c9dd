//! Error types surfaced by pagination calls.

use thiserror::Error as ThisError;

/// Which statement of a pagination call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The `COUNT(*)` statement.
    Count,
    /// The page fetch (plain, cursor, or the deferred-join outer query).
    Fetch,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count => f.write_str("count"),
            Self::Fetch => f.write_str("fetch"),
        }
    }
}

/// Coarse error classification, one per documented failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`PaginateError::MalformedToken`].
    MalformedToken,
    /// See [`PaginateError::MalformedPayload`].
    MalformedPayload,
    /// See [`PaginateError::SchemaMismatch`].
    SchemaMismatch,
    /// See [`PaginateError::QueryExecutionFailed`].
    QueryExecutionFailed,
    /// See [`PaginateError::Canceled`].
    Canceled,
    /// See [`PaginateError::InvalidRequest`].
    InvalidRequest,
}

/// Errors returned by [`Paginator::paginate`](crate::Paginator::paginate)
/// and the token codec.
///
/// None of these are retried internally.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum PaginateError {
    /// The token is not valid base64 text, or is oversized.
    #[error("malformed pagination token: {0}")]
    MalformedToken(String),

    /// The token decoded, but its payload is not a field/scalar mapping
    /// matching the sort fields.
    #[error("malformed pagination token payload: {0}")]
    MalformedPayload(String),

    /// A sort field has no matching external name on the row type.
    #[error("sort field '{field}' is not a sort key of {entity}")]
    SchemaMismatch {
        /// Unqualified sort field name.
        field: String,
        /// Row type name.
        entity: &'static str,
    },

    /// The executor failed to run a statement.
    #[error("{stage} statement failed")]
    QueryExecutionFailed {
        /// Statement that failed.
        stage: Stage,
        /// Driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The call was canceled before it could complete.
    #[error("pagination canceled")]
    Canceled,

    /// The paginator configuration is unusable.
    #[error("invalid pagination request: {0}")]
    InvalidRequest(String),
}

impl PaginateError {
    /// The classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedToken(_) => ErrorKind::MalformedToken,
            Self::MalformedPayload(_) => ErrorKind::MalformedPayload,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::QueryExecutionFailed { .. } => ErrorKind::QueryExecutionFailed,
            Self::Canceled => ErrorKind::Canceled,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Returns `true` if the caller supplied a bad token.
    ///
    /// Includes `MalformedToken` and `MalformedPayload`.
    #[inline]
    #[must_use]
    pub const fn is_token_error(&self) -> bool {
        matches!(self, Self::MalformedToken(_) | Self::MalformedPayload(_))
    }

    /// Returns `true` if this came from the executor or cancellation.
    #[inline]
    #[must_use]
    pub const fn is_execution_error(&self) -> bool {
        matches!(self, Self::QueryExecutionFailed { .. } | Self::Canceled)
    }
}

/// Failure reported by an [`Executor`](crate::Executor).
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum ExecError {
    /// The executor observed the cancel signal.
    #[error("statement canceled")]
    Canceled,

    /// The statement could not be executed.
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl ExecError {
    /// Wrap any driver error.
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(err.into())
    }

    pub(crate) fn at(self, stage: Stage) -> PaginateError {
        match self {
            Self::Canceled => PaginateError::Canceled,
            Self::Failed(source) => PaginateError::QueryExecutionFailed { stage, source },
        }
    }
}
