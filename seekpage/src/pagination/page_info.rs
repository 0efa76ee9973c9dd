//! Response metadata returned next to a page's rows.

use serde::Serialize;

/// Navigation metadata for a paginated response.
///
/// Tokens are only carried in the direction their flag allows, so a client
/// never receives a token that leads to an empty page.
///
/// ```
/// use seekpage::PageInfo;
///
/// let info = PageInfo::new(false, true)
///     .with_cursors(Some("eyJpZCI6MX0".into()), Some("eyJpZCI6MjB9".into()))
///     .with_total(45);
///
/// assert_eq!(info.prev_cursor, None);
/// let json = serde_json::to_value(&info).unwrap();
/// assert_eq!(json["next_cursor"], "eyJpZCI6MjB9");
/// assert_eq!(json["total"], 45);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Rows exist after this page.
    pub has_next: bool,
    /// Rows exist before this page.
    pub has_prev: bool,
    /// Token for the following page.
    pub next_cursor: Option<String>,
    /// Token for the preceding page.
    pub prev_cursor: Option<String>,
    /// Rows matching the filters, when counted.
    pub total: Option<u64>,
}

impl PageInfo {
    /// Metadata with the given navigation flags and no tokens.
    #[must_use]
    pub fn new(has_prev: bool, has_next: bool) -> Self {
        Self {
            has_next,
            has_prev,
            ..Self::default()
        }
    }

    /// Attach tokens. Each is dropped unless its flag is set.
    #[must_use]
    pub fn with_cursors(mut self, prev: Option<String>, next: Option<String>) -> Self {
        self.prev_cursor = prev.filter(|_| self.has_prev);
        self.next_cursor = next.filter(|_| self.has_next);
        self
    }

    /// Set the total count.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}
