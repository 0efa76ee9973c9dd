//! Token codec: a field→value mapping serialized as JSON and wrapped in
//! URL-safe base64.
//!
//! Tokens carry no version marker. A token is only meaningful to a paginator
//! with the same sort fields and the same field types as the one that minted
//! it; keeping those stable across deployments is the caller's job.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::PaginateError;

use super::value::CursorValue;

/// Maximum allowed token size in bytes (4KB).
const MAX_CURSOR_SIZE: usize = 4 * 1024;

/// Maximum number of fields allowed in a token.
const MAX_CURSOR_FIELDS: usize = 16;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Emits unpadded URL-safe text; decodes with or without padding.
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Standard alphabet, accepted on decode only.
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// A decoded pagination token: the sort-key values of a boundary row.
///
/// # Security Note
///
/// Tokens use base64, **not encryption**. Clients can read and forge them.
/// Every value is bound as a statement parameter, so a forged token can only
/// move the page window, never alter the SQL.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
#[must_use = "cursor must be encoded with .encode() or used with a keyset condition"]
pub struct Cursor {
    /// Field values that define the cursor position, in sort-field order.
    pub fields: Vec<(String, CursorValue)>,
}

impl Cursor {
    /// Create a new empty cursor.
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field value to the cursor.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<CursorValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add an integer field.
    pub fn int(self, name: impl Into<String>, value: i64) -> Self {
        self.field(name, CursorValue::Int(value))
    }

    /// Add a string field.
    pub fn string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, CursorValue::Text(value.into()))
    }

    /// Add a float field.
    pub fn float(self, name: impl Into<String>, value: f64) -> Self {
        self.field(name, CursorValue::Float(value))
    }

    /// Add a boolean field.
    pub fn bool(self, name: impl Into<String>, value: bool) -> Self {
        self.field(name, CursorValue::Bool(value))
    }

    /// Add a null field.
    pub fn null(self, name: impl Into<String>) -> Self {
        self.field(name, CursorValue::Null)
    }

    /// Look up a field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CursorValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the cursor has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode the cursor to an opaque token.
    ///
    /// Fails with `MalformedPayload` for non-finite floats, which JSON
    /// cannot carry without changing their kind.
    pub fn encode(&self) -> Result<String, PaginateError> {
        if let Some((name, _)) = self
            .fields
            .iter()
            .find(|(_, v)| matches!(v, CursorValue::Float(f) if !f.is_finite()))
        {
            return Err(PaginateError::MalformedPayload(format!(
                "field '{name}' holds a non-finite float"
            )));
        }
        let json = serde_json::to_vec(self)
            .map_err(|e| PaginateError::MalformedPayload(e.to_string()))?;
        Ok(URL_SAFE.encode(json))
    }

    /// Decode a cursor from an opaque token.
    ///
    /// - `MalformedToken`: oversized, or not base64.
    /// - `MalformedPayload`: not a JSON object of scalars, duplicate keys, or
    ///   more than 16 fields.
    pub fn decode(token: &str) -> Result<Self, PaginateError> {
        if token.len() > MAX_CURSOR_SIZE {
            return Err(PaginateError::MalformedToken(format!(
                "token exceeds maximum size ({}KB limit)",
                MAX_CURSOR_SIZE / 1024
            )));
        }
        let bytes = URL_SAFE
            .decode(token)
            .or_else(|_| STANDARD.decode(token))
            .map_err(|e| PaginateError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| PaginateError::MalformedPayload(e.to_string()))
    }

    /// Check that the keys are exactly `names`, in that order.
    pub fn ensure_keys(&self, names: &[&str]) -> Result<(), PaginateError> {
        let keys = self.fields.iter().map(|(k, _)| k.as_str());
        if self.fields.len() == names.len() && keys.eq(names.iter().copied()) {
            return Ok(());
        }
        let found: Vec<&str> = self.fields.iter().map(|(k, _)| k.as_str()).collect();
        Err(PaginateError::MalformedPayload(format!(
            "token keys {found:?} do not match sort fields {names:?}"
        )))
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct CursorVisitor;

impl<'de> Visitor<'de> for CursorVisitor {
    type Value = Cursor;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping sort fields to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Cursor, A::Error> {
        let mut cursor = Cursor::new();
        while let Some((name, value)) = access.next_entry::<String, CursorValue>()? {
            if cursor.get(&name).is_some() {
                return Err(de::Error::custom(format_args!("duplicate field '{name}'")));
            }
            cursor.fields.push((name, value));
            if cursor.fields.len() > MAX_CURSOR_FIELDS {
                return Err(de::Error::custom(format_args!(
                    "too many fields (max {MAX_CURSOR_FIELDS})"
                )));
            }
        }
        Ok(cursor)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CursorVisitor)
    }
}
