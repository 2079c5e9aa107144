//! # tablemap
//!
//! Maps Rust structs onto SQL Server tables and builds T-SQL statement text.
//!
//! ## Features
//!
//! - **Declared mapping**: a type implements [`Mapped`] to hand out `'static`
//!   table metadata and [`Record`] to expose member values
//! - **Expression compiler**: typed [`Expr`] trees (the stand-in for lambda
//!   bodies) compile to alias-qualified, safely quoted T-SQL fragments
//! - **Statement builders**: SELECT / INSERT / UPDATE / DELETE / MERGE with
//!   joins, table hints, TOP, GROUP BY variants and key-derived WHERE clauses
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET, builder
//!   misuse surfaces as an error from `build()`
//! - **Logging**: built statements are emitted as `tracing` events
//! - **Flat files**: a streaming [`DelimitedReader`] for CSV-like input
//!
//! ## Query Builders
//!
//! ```ignore
//! use tablemap::expr::col;
//! use tablemap::{DeleteBuilder, LogicalOp, QueryBuilder, SqlStatement};
//!
//! // SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0] WHERE (t0.[Id] = 5);
//! let sql = QueryBuilder::from::<Employee>()
//!     .select_all::<Employee>()
//!     .where_expr::<Employee>(col::<Employee>("Id").eq(5))
//!     .build()?;
//!
//! // DELETE FROM [dbo].[Employee] [t0] WHERE ([Id]=5);
//! let sql = DeleteBuilder::from::<Employee>()
//!     .where_keys(&employee, LogicalOp::And)
//!     .build()?;
//! ```

pub mod alias;
pub mod builder;
pub mod clause;
pub mod config;
pub mod delimited;
pub mod error;
pub mod expr;
pub mod hint;
pub mod ident;
pub mod metadata;
pub mod value;

mod log;

#[cfg(test)]
mod fixtures;

pub use alias::{AliasEntry, TableAliasRegistry};
pub use builder::{
    DeleteBuilder, Direction, Grouping, InsertBuilder, MergeAction, MergeBuilder, QueryBuilder,
    SqlStatement, Top, UpdateBuilder,
};
pub use clause::{JoinType, LogicalOp, SqlJoin, SqlWhere};
pub use config::SqlConfig;
pub use delimited::{DelimitedOptions, DelimitedReader};
pub use error::{MapError, MapResult};
pub use expr::{BinaryOp, Expr, IntoExpr, SqlCompiler, UnaryOp};
pub use hint::{TableHint, TableHints};
pub use ident::{Ident, IntoIdent, quote};
pub use log::StatementKind;
pub use metadata::{
    ColumnMetadata, ColumnRole, ColumnValue, Field, Inclusion, Mapped, Record, TableMetadata,
    TableType, ValueKind,
};
pub use value::{EnumMeta, EnumMode, EnumValue, SqlEnum, SqlValue};
