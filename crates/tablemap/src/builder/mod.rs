//! Fluent T-SQL statement builders.
//!
//! Each builder is a single-owner value assembled through consuming calls
//! (`mut self -> Self`). Fluent calls never fail: the first error is recorded
//! and returned by [`SqlStatement::build`], which also never mutates the
//! builder.
//!
//! ```
//! # use tablemap::{ColumnMetadata, Field, Mapped, Record, TableMetadata};
//! # #[derive(Debug)] struct Employee;
//! # static COLUMNS: [ColumnMetadata; 2] = [ColumnMetadata::new("Id", "Id").search_key(), ColumnMetadata::new("Name", "Name")];
//! # static EMPLOYEE: TableMetadata = TableMetadata::new("Employee").schema("dbo").members(&COLUMNS);
//! # impl Record for Employee { fn field(&self, _: &str) -> Option<Field> { None } }
//! # impl Mapped for Employee { fn metadata() -> &'static TableMetadata { &EMPLOYEE } }
//! use tablemap::expr::col;
//! use tablemap::{QueryBuilder, SqlStatement};
//!
//! let sql = QueryBuilder::from::<Employee>()
//!     .select_all::<Employee>()
//!     .where_expr::<Employee>(col::<Employee>("Id").eq(5))
//!     .build()?;
//! assert_eq!(sql, "SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0] WHERE (t0.[Id] = 5);");
//! # Ok::<(), tablemap::MapError>(())
//! ```

pub mod delete;
pub mod insert;
pub mod merge;
pub mod select;
pub mod traits;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use merge::{MergeAction, MergeBuilder};
pub use select::{Direction, Grouping, QueryBuilder};
pub use traits::SqlStatement;
pub use update::UpdateBuilder;

use crate::error::{MapError, MapResult};
use crate::log::{self, StatementKind};

#[cfg(test)]
mod tests;

/// `TOP n` / `TOP n PERCENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Top {
    pub count: u64,
    pub percent: bool,
}

impl Top {
    /// SELECT accepts the bare form; UPDATE, DELETE and MERGE need `TOP (n)`.
    fn render(&self, parenthesized: bool) -> String {
        let mut sql = if parenthesized {
            format!("TOP ({})", self.count)
        } else {
            format!("TOP {}", self.count)
        };
        if self.percent {
            sql.push_str(" PERCENT");
        }
        sql
    }
}

/// Keep the first error of a fluent chain.
fn record(slot: &mut Option<MapError>, kind: StatementKind, result: MapResult<()>) {
    if let Err(err) = result {
        log::builder_error(kind, &err);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}
