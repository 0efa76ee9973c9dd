//! Identifier validation for everything that lands in SQL text.
//!
//! Values never reach SQL text (they are bound parameters), so the only
//! caller-controlled text is table, column and alias names. Those are held
//! to a strict identifier grammar here.

use crate::error::PaginateError;

/// Maximum length for SQL identifiers (`PostgreSQL` limit is 63).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Validate that a string is a safe, unqualified SQL identifier.
///
/// A valid SQL identifier starts with an ASCII letter or underscore, contains
/// only ASCII letters, digits and underscores, and is 1-63 bytes long.
///
/// ```
/// use seekpage::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("created_at"));
/// assert!(!is_valid_sql_identifier("p.created_at"));
/// assert!(!is_valid_sql_identifier("id; DROP TABLE posts"));
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an identifier that may carry one table-alias qualifier
/// (`created_at` or `p.created_at`).
///
/// ```
/// use seekpage::is_valid_qualified_identifier;
///
/// assert!(is_valid_qualified_identifier("p.created_at"));
/// assert!(is_valid_qualified_identifier("id"));
/// assert!(!is_valid_qualified_identifier("a.b.c"));
/// assert!(!is_valid_qualified_identifier(".id"));
/// ```
#[must_use]
pub fn is_valid_qualified_identifier(s: &str) -> bool {
    match s.split_once('.') {
        Some((alias, column)) => is_valid_sql_identifier(alias) && is_valid_sql_identifier(column),
        None => is_valid_sql_identifier(s),
    }
}

/// Assert that a string is a valid, optionally qualified, SQL identifier.
///
/// # Panics
///
/// Panics with a descriptive error if the identifier is invalid.
/// This is intended for programmer errors (invalid table/column names in code),
/// not for user input validation.
#[inline]
pub fn assert_valid_qualified_identifier(s: &str, context: &str) {
    assert!(
        is_valid_qualified_identifier(s),
        "Invalid SQL {context} name '{s}': must be an identifier (letter/underscore, \
         then ASCII alphanumeric/underscore, 1-63 chars), optionally prefixed by 'alias.'"
    );
}

/// Validate a join `ON` condition: one or more `col = col` equalities
/// joined with `AND`. No literals, no functions.
#[must_use]
pub fn is_valid_join_condition(on: &str) -> bool {
    let spaced = on.replace('=', " = ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();

    // ident = ident (AND ident = ident)*
    if tokens.len() < 3 || (tokens.len() + 1) % 4 != 0 {
        return false;
    }
    tokens.chunks(4).all(|chunk| match chunk {
        [l, "=", r] => is_valid_qualified_identifier(l) && is_valid_qualified_identifier(r),
        [l, "=", r, and] => {
            is_valid_qualified_identifier(l)
                && is_valid_qualified_identifier(r)
                && and.eq_ignore_ascii_case("and")
        },
        _ => false,
    })
}

/// Assert that a join condition is valid.
///
/// # Panics
///
/// Panics if [`is_valid_join_condition`] rejects the condition.
pub(crate) fn assert_valid_join_condition(on: &str) {
    assert!(
        is_valid_join_condition(on),
        "Invalid SQL join condition '{on}': expected `a.col = b.col [AND ...]`"
    );
}

/// Strip any alias qualifier, keeping the segment after the last `.`.
#[must_use]
pub fn unqualified(field: &str) -> &str {
    field.rsplit_once('.').map_or(field, |(_, column)| column)
}

/// Parse a comma separated field list such as `"p.created_at, id"`.
///
/// Whitespace is removed and empty entries are rejected. Each entry must be
/// a valid (optionally qualified) identifier, and no two entries may share
/// an unqualified name.
pub(crate) fn parse_field_list(list: &str, context: &str) -> Result<Vec<String>, PaginateError> {
    let compact: String = list.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(PaginateError::InvalidRequest(format!(
            "{context} list must not be empty"
        )));
    }

    let mut fields: Vec<String> = Vec::new();
    for field in compact.split(',') {
        if !is_valid_qualified_identifier(field) {
            return Err(PaginateError::InvalidRequest(format!(
                "invalid {context} '{field}'"
            )));
        }
        // Tokens key on the unqualified name, so `e.id, a.id` would collide
        let name = unqualified(field);
        if let Some(seen) = fields.iter().find(|f| unqualified(f) == name) {
            return Err(PaginateError::InvalidRequest(format!(
                "{context} '{field}' duplicates '{seen}': unqualified names must be unique"
            )));
        }
        fields.push(field.to_string());
    }
    Ok(fields)
}
