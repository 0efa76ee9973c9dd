//! Scalar values carried inside pagination tokens.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::builder::Value;

/// A sort-key value as stored in a token.
///
/// Only scalars are representable, so a token round-trips without coercion:
/// an integer decodes as [`CursorValue::Int`], a float as
/// [`CursorValue::Float`], text as [`CursorValue::Text`].
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    /// SQL `NULL` / absent value.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<CursorValue> for Value {
    fn from(v: CursorValue) -> Self {
        match v {
            CursorValue::Null => Self::Null,
            CursorValue::Bool(b) => Self::Bool(b),
            CursorValue::Int(i) => Self::Int(i),
            CursorValue::Float(f) => Self::Float(f),
            CursorValue::Text(s) => Self::String(s),
        }
    }
}

/// Borrowing conversion used by `#[derive(SortKeys)]`.
pub trait ToCursorValue {
    /// The token representation of this value.
    fn to_cursor_value(&self) -> CursorValue;
}

macro_rules! int_cursor_value {
    ($($t:ty),*) => {$(
        impl ToCursorValue for $t {
            fn to_cursor_value(&self) -> CursorValue {
                CursorValue::Int(i64::from(*self))
            }
        }

        impl From<$t> for CursorValue {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

int_cursor_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToCursorValue for f64 {
    fn to_cursor_value(&self) -> CursorValue {
        CursorValue::Float(*self)
    }
}

impl ToCursorValue for f32 {
    fn to_cursor_value(&self) -> CursorValue {
        CursorValue::Float(f64::from(*self))
    }
}

impl ToCursorValue for bool {
    fn to_cursor_value(&self) -> CursorValue {
        CursorValue::Bool(*self)
    }
}

impl ToCursorValue for str {
    fn to_cursor_value(&self) -> CursorValue {
        CursorValue::Text(self.to_string())
    }
}

impl ToCursorValue for String {
    fn to_cursor_value(&self) -> CursorValue {
        CursorValue::Text(self.clone())
    }
}

impl<T: ToCursorValue + ?Sized> ToCursorValue for &T {
    fn to_cursor_value(&self) -> CursorValue {
        (**self).to_cursor_value()
    }
}

impl<T: ToCursorValue> ToCursorValue for Option<T> {
    fn to_cursor_value(&self) -> CursorValue {
        self.as_ref().map_or(CursorValue::Null, ToCursorValue::to_cursor_value)
    }
}

impl From<f64> for CursorValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for CursorValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for CursorValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for CursorValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for CursorValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for CursorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct CursorValueVisitor;

impl<'de> Visitor<'de> for CursorValueVisitor {
    type Value = CursorValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, boolean, number or string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<CursorValue, E> {
        Ok(CursorValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<CursorValue, E> {
        Ok(CursorValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<CursorValue, E> {
        Ok(CursorValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CursorValue, E> {
        Ok(CursorValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CursorValue, E> {
        i64::try_from(v)
            .map(CursorValue::Int)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &"a 64-bit signed integer"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CursorValue, E> {
        Ok(CursorValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CursorValue, E> {
        Ok(CursorValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CursorValue, E> {
        Ok(CursorValue::Text(v))
    }
}

impl<'de> Deserialize<'de> for CursorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CursorValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(CursorValue::from(42i32), CursorValue::Int(42));
        assert_eq!(CursorValue::from(7u8), CursorValue::Int(7));
        assert_eq!(CursorValue::from("x"), CursorValue::Text("x".into()));
        assert_eq!(CursorValue::from(None::<i64>), CursorValue::Null);
        assert_eq!(CursorValue::from(Some(true)), CursorValue::Bool(true));
        assert_eq!(Some(3i64).to_cursor_value(), CursorValue::Int(3));
        assert_eq!("abc".to_cursor_value(), CursorValue::Text("abc".into()));
    }

    #[test]
    fn test_into_bind_value() {
        assert_eq!(Value::from(CursorValue::Int(1)), Value::Int(1));
        assert_eq!(
            Value::from(CursorValue::Text("a".into())),
            Value::String("a".into())
        );
        assert_eq!(Value::from(CursorValue::Null), Value::Null);
    }

    #[test]
    fn test_json_keeps_number_kinds() {
        let int: CursorValue = serde_json::from_str("3").unwrap();
        let neg: CursorValue = serde_json::from_str("-3").unwrap();
        let float: CursorValue = serde_json::from_str("3.0").unwrap();
        let text: CursorValue = serde_json::from_str("\"3\"").unwrap();

        assert_eq!(int, CursorValue::Int(3));
        assert_eq!(neg, CursorValue::Int(-3));
        assert_eq!(float, CursorValue::Float(3.0));
        assert_eq!(text, CursorValue::Text("3".into()));
    }

    #[test]
    fn test_json_rejects_containers() {
        assert!(serde_json::from_str::<CursorValue>("[1,2]").is_err());
        assert!(serde_json::from_str::<CursorValue>("{\"a\":1}").is_err());
        assert!(serde_json::from_str::<CursorValue>("18446744073709551615").is_err());
    }
}
