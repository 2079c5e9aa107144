//! Table metadata and record access.
//!
//! A type takes part in statements by implementing [`Mapped`], which hands out
//! a `'static` [`TableMetadata`] (table name, schema, and per-member column
//! policy) and reads member values through [`Record`].
//!
//! # Example
//! ```
//! use tablemap::{ColumnMetadata, Field, Mapped, Record, TableMetadata};
//!
//! #[derive(Debug)]
//! struct Employee {
//!     id: i32,
//!     name: String,
//! }
//!
//! static EMPLOYEE_COLUMNS: [ColumnMetadata; 2] = [
//!     ColumnMetadata::new("Id", "Id").search_key(),
//!     ColumnMetadata::new("Name", "Name"),
//! ];
//!
//! static EMPLOYEE: TableMetadata = TableMetadata::new("Employee")
//!     .schema("dbo")
//!     .members(&EMPLOYEE_COLUMNS);
//!
//! impl Record for Employee {
//!     fn field(&self, member: &str) -> Option<Field> {
//!         match member {
//!             "Id" => Some(Field::value(self.id)),
//!             "Name" => Some(Field::value(self.name.as_str())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Mapped for Employee {
//!     fn metadata() -> &'static TableMetadata {
//!         &EMPLOYEE
//!     }
//! }
//! ```

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::error::{MapError, MapResult};
use crate::ident::quote;
use crate::value::{EnumMeta, EnumMode, SqlValue};

/// Which statements a column takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl Inclusion {
    pub const ALL: Inclusion = Inclusion {
        insert: true,
        update: true,
        delete: true,
    };
}

/// Role of a column in generated conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Part of the natural key; used for generated WHERE clauses and never
    /// written by a generated UPDATE SET.
    SearchKey,
    /// Plain data column.
    Data,
}

/// How a member's values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Plain,
    /// Enum column: integers, names and enum values are coerced to `meta` and
    /// written per `mode`.
    Enum {
        meta: &'static EnumMeta,
        mode: EnumMode,
    },
    /// Column stores JSON text.
    Json,
}

/// Mapping of one struct member onto a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub member: &'static str,
    pub column: &'static str,
    pub role: ColumnRole,
    pub include: Inclusion,
    pub kind: ValueKind,
}

impl ColumnMetadata {
    pub const fn new(member: &'static str, column: &'static str) -> Self {
        Self {
            member,
            column,
            role: ColumnRole::Data,
            include: Inclusion::ALL,
            kind: ValueKind::Plain,
        }
    }

    pub const fn search_key(mut self) -> Self {
        self.role = ColumnRole::SearchKey;
        self
    }

    pub const fn skip_insert(mut self) -> Self {
        self.include.insert = false;
        self
    }

    pub const fn skip_update(mut self) -> Self {
        self.include.update = false;
        self
    }

    pub const fn skip_delete(mut self) -> Self {
        self.include.delete = false;
        self
    }

    pub const fn enumerated(mut self, meta: &'static EnumMeta, mode: EnumMode) -> Self {
        self.kind = ValueKind::Enum { meta, mode };
        self
    }

    pub const fn json(mut self) -> Self {
        self.kind = ValueKind::Json;
        self
    }

    pub fn is_search_key(&self) -> bool {
        matches!(self.role, ColumnRole::SearchKey)
    }

    /// `[Column]`
    pub fn quoted(&self) -> String {
        quote(self.column)
    }

    /// Render a member value as a literal under this column's policy.
    pub fn render_value(&self, value: &SqlValue, default_mode: EnumMode) -> MapResult<String> {
        match (self.kind, value) {
            (ValueKind::Enum { meta, mode }, v) => Ok(v.to_sql_literal_as_enum(meta, mode)),
            (ValueKind::Json, SqlValue::Json(_) | SqlValue::String(_) | SqlValue::Null) => {
                Ok(value.to_sql_literal_with(default_mode))
            }
            (ValueKind::Json, other) => Err(MapError::configuration(format!(
                "JSON column '{}' cannot hold {:?}",
                self.column, other
            ))),
            (ValueKind::Plain, SqlValue::Json(_)) => Err(MapError::configuration(format!(
                "member '{}' holds JSON but is not marked as a JSON column",
                self.member
            ))),
            (ValueKind::Plain, v) => Ok(v.to_sql_literal_with(default_mode)),
        }
    }
}

/// Table-level metadata for a mapped type.
#[derive(Debug, PartialEq, Eq)]
pub struct TableMetadata {
    pub name: &'static str,
    pub schema: Option<&'static str>,
    pub members: &'static [ColumnMetadata],
}

impl TableMetadata {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            schema: None,
            members: &[],
        }
    }

    pub const fn schema(mut self, schema: &'static str) -> Self {
        self.schema = Some(schema);
        self
    }

    pub const fn members(mut self, members: &'static [ColumnMetadata]) -> Self {
        self.members = members;
        self
    }

    /// Look up a member by its Rust-side name.
    pub fn member(&self, member: &str) -> Option<&'static ColumnMetadata> {
        self.members.iter().find(|m| m.member == member)
    }

    /// Look up a member by column name.
    pub fn column(&self, column: &str) -> Option<&'static ColumnMetadata> {
        self.members.iter().find(|m| m.column == column)
    }

    pub fn search_keys(&self) -> impl Iterator<Item = &'static ColumnMetadata> {
        self.members.iter().filter(|m| m.is_search_key())
    }

    /// `[schema].[name]`, using `default_schema` when none is declared.
    pub fn qualified_name(&self, default_schema: &str) -> String {
        let schema = self.schema.unwrap_or(default_schema);
        if schema.is_empty() {
            quote(self.name)
        } else {
            format!("{}.{}", quote(schema), quote(self.name))
        }
    }

    /// Whether two metadata records describe the same table.
    pub fn same_table(&self, other: &TableMetadata) -> bool {
        self.name == other.name && self.schema == other.schema
    }
}

/// A member read from a record.
#[derive(Debug, Clone)]
pub enum Field {
    Value(SqlValue),
    /// Nested object, for member chains like `local.inner.value`.
    Record(Arc<dyn Record>),
}

impl Field {
    pub fn value(v: impl Into<SqlValue>) -> Self {
        Field::Value(v.into())
    }

    pub fn record(r: impl Record + 'static) -> Self {
        Field::Record(Arc::new(r))
    }
}

/// Member access on a runtime object.
pub trait Record: fmt::Debug + Send + Sync {
    fn field(&self, member: &str) -> Option<Field>;
}

/// A type mapped onto a table.
pub trait Mapped: Record + 'static {
    fn metadata() -> &'static TableMetadata;

    fn table_type() -> TableType
    where
        Self: Sized,
    {
        TableType::of::<Self>()
    }
}

/// Identity and metadata accessor of a mapped type, usable without generics.
#[derive(Clone, Copy)]
pub struct TableType {
    id: TypeId,
    type_name: &'static str,
    metadata: fn() -> &'static TableMetadata,
}

impl TableType {
    pub fn of<T: Mapped>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            metadata: T::metadata,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn metadata(&self) -> &'static TableMetadata {
        (self.metadata)()
    }

    /// Column metadata for `member`, or `UnknownMember`.
    pub fn column(&self, member: &str) -> MapResult<&'static ColumnMetadata> {
        self.metadata()
            .member(member)
            .ok_or_else(|| MapError::unknown_member(self.type_name, member))
    }
}

impl PartialEq for TableType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableType {}

impl fmt::Debug for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TableType").field(&self.type_name).finish()
    }
}

/// One rendered column value of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnValue {
    pub column: String,
    pub literal: String,
    pub search_key: bool,
}

/// Read and render every member of `record` accepted by `filter`.
pub(crate) fn collect_values<T: Mapped>(
    record: &T,
    default_mode: EnumMode,
    filter: impl Fn(&ColumnMetadata) -> bool,
) -> MapResult<Vec<ColumnValue>> {
    let meta = T::metadata();
    let mut out = Vec::with_capacity(meta.members.len());
    for member in meta.members.iter().filter(|m| filter(m)) {
        let value = match record.field(member.member) {
            Some(Field::Value(v)) => v,
            Some(Field::Record(_)) => {
                return Err(MapError::not_supported(format!(
                    "Nested record in column '{}'",
                    member.column
                )));
            }
            None => {
                return Err(MapError::MissingValue(format!(
                    "member '{}' of '{}'",
                    member.member,
                    std::any::type_name::<T>()
                )));
            }
        };
        out.push(ColumnValue {
            column: member.column.to_string(),
            literal: member.render_value(&value, default_mode)?,
            search_key: member.is_search_key(),
        });
    }
    Ok(out)
}

/// `([A]=1 AND [B]='x')` from key columns of a row.
pub(crate) fn key_condition<'a>(keys: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let parts: Vec<String> = keys
        .into_iter()
        .map(|(column, literal)| {
            if literal == "NULL" {
                format!("{} IS NULL", quote(column))
            } else {
                format!("{}={}", quote(column), literal)
            }
        })
        .collect();
    format!("({})", parts.join(" AND "))
}
