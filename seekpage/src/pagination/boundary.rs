//! Boundary extraction: turn a fetched row into the cursor that points at it.

use crate::error::PaginateError;
use crate::validate::unqualified;

use super::cursor::Cursor;
use super::value::CursorValue;

/// Rows that can mint pagination tokens.
///
/// `SORT_KEYS` lists the row's external (serialized) field names. `sort_key`
/// looks a value up by one of those names. Usually derived:
///
/// ```
/// use seekpage::SortKeys;
///
/// #[derive(SortKeys)]
/// struct Post {
///     id: i64,
///     #[sort_key(rename = "createdAt")]
///     created_at: String,
///     #[sort_key(skip)]
///     body: String,
/// }
///
/// assert_eq!(Post::SORT_KEYS, &["id", "createdAt"]);
/// ```
pub trait SortKeys {
    /// External names of the fields usable as sort keys.
    const SORT_KEYS: &'static [&'static str];

    /// Value of the field with external name `name`, if there is one.
    fn sort_key(&self, name: &str) -> Option<CursorValue>;
}

impl<T: SortKeys> SortKeys for &T {
    const SORT_KEYS: &'static [&'static str] = T::SORT_KEYS;

    fn sort_key(&self, name: &str) -> Option<CursorValue> {
        (**self).sort_key(name)
    }
}

/// Build the cursor for `row` under `sort_fields`.
///
/// Alias qualifiers are stripped (`p.created_at` → `created_at`). The result
/// holds one entry per sort field, in sort order, keyed by external name.
pub fn extract_boundary<T: SortKeys>(
    row: &T,
    sort_fields: &[String],
) -> Result<Cursor, PaginateError> {
    let mut cursor = Cursor::new();
    for field in sort_fields {
        let name = unqualified(field);
        let value = T::SORT_KEYS
            .contains(&name)
            .then(|| row.sort_key(name))
            .flatten()
            .ok_or_else(|| PaginateError::SchemaMismatch {
                field: name.to_string(),
                entity: std::any::type_name::<T>(),
            })?;
        cursor = cursor.field(name, value);
    }
    Ok(cursor)
}
