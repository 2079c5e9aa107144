//! Runtime values and their T-SQL literal form.
//!
//! [`SqlValue`] is the only way a caller-supplied value reaches statement text.
//! Rendering goes through [`SqlValue::to_sql_literal`] (or one of its enum-aware
//! variants), which quotes and escapes everything that needs it.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

use crate::error::MapResult;

/// How enum values are written into SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumMode {
    /// Underlying integer value, unquoted.
    #[default]
    AsInt,
    /// Variant name as a quoted string.
    AsString,
}

/// Static descriptor of a Rust enum mapped to a column.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumMeta {
    pub name: &'static str,
    pub variants: &'static [(&'static str, i64)],
}

impl EnumMeta {
    pub const fn new(name: &'static str, variants: &'static [(&'static str, i64)]) -> Self {
        Self { name, variants }
    }

    /// Variant name for an integer value.
    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| *name)
    }

    /// Integer value for a variant name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// Implemented by Rust enums that can be stored in a column.
pub trait SqlEnum {
    fn enum_meta() -> &'static EnumMeta;

    fn to_i64(&self) -> i64;

    fn to_sql_value(&self) -> SqlValue
    where
        Self: Sized,
    {
        SqlValue::Enum(EnumValue::new(Self::enum_meta(), self.to_i64()))
    }
}

/// An enum value together with its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub meta: &'static EnumMeta,
    pub value: i64,
}

impl EnumValue {
    pub fn new(meta: &'static EnumMeta, value: i64) -> Self {
        Self { meta, value }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.meta.name_of(self.value)
    }

    fn write_literal(&self, out: &mut String, mode: EnumMode) {
        match (mode, self.name()) {
            (EnumMode::AsString, Some(name)) => write_quoted(out, name),
            // Values without a named variant (combined flags) fall back to the integer.
            _ => {
                let _ = write!(out, "{}", self.value);
            }
        }
    }
}

/// A runtime value that can be rendered as a T-SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    String(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Binary(Vec<u8>),
    Json(serde_json::Value),
    Enum(EnumValue),
    /// Collection used on the right side of `IN`.
    List(Vec<SqlValue>),
}

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
pub(crate) const DATETIME_OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.7f %:z";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.7f";

impl SqlValue {
    /// Build a list value from anything convertible into values.
    pub fn list<T: Into<SqlValue>>(items: impl IntoIterator<Item = T>) -> Self {
        SqlValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Serialize a value to JSON.
    pub fn json<T: Serialize>(value: &T) -> MapResult<Self> {
        Ok(SqlValue::Json(serde_json::to_value(value)?))
    }

    pub fn enumerated<E: SqlEnum>(value: &E) -> Self {
        value.to_sql_value()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render as a literal, enums as integers.
    pub fn to_sql_literal(&self) -> String {
        self.to_sql_literal_with(EnumMode::AsInt)
    }

    /// Render as a literal, enums per `mode`.
    pub fn to_sql_literal_with(&self, mode: EnumMode) -> String {
        let mut out = String::new();
        self.write_literal(&mut out, mode);
        out
    }

    /// Render as a literal after coercing to the given enum type.
    ///
    /// Integers and variant-name strings become enum values of `meta`; enum
    /// values keep their own descriptor but take `mode`. Lists coerce item by
    /// item. Anything else renders unchanged.
    pub fn to_sql_literal_as_enum(&self, meta: &'static EnumMeta, mode: EnumMode) -> String {
        let mut out = String::new();
        self.write_coerced(&mut out, meta, mode);
        out
    }

    fn write_coerced(&self, out: &mut String, meta: &'static EnumMeta, mode: EnumMode) {
        match self {
            SqlValue::Int(v) => EnumValue::new(meta, *v).write_literal(out, mode),
            SqlValue::String(s) => match meta.value_of(s) {
                Some(v) => EnumValue::new(meta, v).write_literal(out, mode),
                None => self.write_literal(out, mode),
            },
            SqlValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_coerced(out, meta, mode);
                }
            }
            other => other.write_literal(out, mode),
        }
    }

    fn write_literal(&self, out: &mut String, mode: EnumMode) {
        match self {
            SqlValue::Null => out.push_str("NULL"),
            SqlValue::Bool(b) => out.push(if *b { '1' } else { '0' }),
            SqlValue::Int(v) => {
                let _ = write!(out, "{v}");
            }
            SqlValue::Float(v) if v.is_finite() => {
                let _ = write!(out, "{v}");
            }
            SqlValue::Float(_) => out.push_str("NULL"),
            #[cfg(feature = "rust_decimal")]
            SqlValue::Decimal(d) => {
                let _ = write!(out, "{d}");
            }
            SqlValue::String(s) => write_quoted(out, s),
            SqlValue::Guid(g) => {
                let _ = write!(out, "'{g}'");
            }
            SqlValue::DateTime(dt) => {
                let _ = write!(out, "'{}'", dt.format(DATETIME_FORMAT));
            }
            SqlValue::DateTimeOffset(dt) => {
                let _ = write!(out, "'{}'", dt.format(DATETIME_OFFSET_FORMAT));
            }
            SqlValue::Date(d) => {
                let _ = write!(out, "'{}'", d.format(DATE_FORMAT));
            }
            SqlValue::Time(t) => {
                let _ = write!(out, "'{}'", t.format(TIME_FORMAT));
            }
            SqlValue::Binary(bytes) => {
                out.push_str("0x");
                for b in bytes {
                    let _ = write!(out, "{b:02X}");
                }
            }
            SqlValue::Json(v) => write_quoted(out, &v.to_string()),
            SqlValue::Enum(e) => e.write_literal(out, mode),
            SqlValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_literal(out, mode);
                }
            }
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

#[cfg(feature = "rust_decimal")]
impl From<rust_decimal::Decimal> for SqlValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::String(v.clone())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Guid(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        SqlValue::DateTimeOffset(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTimeOffset(v.fixed_offset())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Binary(v)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        SqlValue::Binary(v.to_vec())
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        SqlValue::Json(v)
    }
}

impl From<EnumValue> for SqlValue {
    fn from(v: EnumValue) -> Self {
        SqlValue::Enum(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static STATUS: EnumMeta = EnumMeta::new("Status", &[("Active", 1), ("Retired", 2)]);

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(SqlValue::from("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(SqlValue::from("").to_sql_literal(), "''");
    }

    #[test]
    fn null_and_none_render_null() {
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(SqlValue::from(None::<i32>).to_sql_literal(), "NULL");
    }

    #[test]
    fn numbers_and_bools_are_unquoted() {
        assert_eq!(SqlValue::from(42i32).to_sql_literal(), "42");
        assert_eq!(SqlValue::from(-7i64).to_sql_literal(), "-7");
        assert_eq!(SqlValue::from(1.5f64).to_sql_literal(), "1.5");
        assert_eq!(SqlValue::from(true).to_sql_literal(), "1");
        assert_eq!(SqlValue::from(false).to_sql_literal(), "0");
    }

    #[test]
    fn non_finite_float_renders_null() {
        assert_eq!(SqlValue::Float(f64::NAN).to_sql_literal(), "NULL");
    }

    #[test]
    fn dates_use_server_parseable_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(8, 5, 1, 250)
            .unwrap();
        assert_eq!(SqlValue::from(dt).to_sql_literal(), "'2024-03-09 08:05:01.250'");
        assert_eq!(
            SqlValue::from(dt.date()).to_sql_literal(),
            "'2024-03-09'"
        );
    }

    #[test]
    fn binary_renders_hex() {
        assert_eq!(SqlValue::from(vec![0x0au8, 0xff]).to_sql_literal(), "0x0AFF");
    }

    #[test]
    fn enum_modes() {
        let v = SqlValue::Enum(EnumValue::new(&STATUS, 2));
        assert_eq!(v.to_sql_literal_with(EnumMode::AsInt), "2");
        assert_eq!(v.to_sql_literal_with(EnumMode::AsString), "'Retired'");
    }

    #[test]
    fn unnamed_enum_value_falls_back_to_int() {
        let v = SqlValue::Enum(EnumValue::new(&STATUS, 3));
        assert_eq!(v.to_sql_literal_with(EnumMode::AsString), "3");
    }

    #[test]
    fn coercion_to_enum() {
        assert_eq!(
            SqlValue::Int(1).to_sql_literal_as_enum(&STATUS, EnumMode::AsString),
            "'Active'"
        );
        assert_eq!(
            SqlValue::from("Retired").to_sql_literal_as_enum(&STATUS, EnumMode::AsInt),
            "2"
        );
        assert_eq!(
            SqlValue::list([1i32, 2]).to_sql_literal_as_enum(&STATUS, EnumMode::AsString),
            "'Active','Retired'"
        );
    }

    #[test]
    fn json_is_quoted_text() {
        let v = SqlValue::Json(serde_json::json!({"a": "it's"}));
        assert_eq!(v.to_sql_literal(), r#"'{"a":"it''s"}'"#);
    }
}
