//! SQL Server table hints (`WITH (NOLOCK, ...)`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single table hint. Rendered as its upper-cased name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableHint {
    NoLock,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
    HoldLock,
    UpdLock,
    XLock,
    RowLock,
    PagLock,
    TabLock,
    TabLockX,
    NoWait,
    ReadPast,
    ForceSeek,
    ForceScan,
    NoExpand,
}

impl TableHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableHint::NoLock => "NOLOCK",
            TableHint::ReadUncommitted => "READUNCOMMITTED",
            TableHint::ReadCommitted => "READCOMMITTED",
            TableHint::RepeatableRead => "REPEATABLEREAD",
            TableHint::Serializable => "SERIALIZABLE",
            TableHint::Snapshot => "SNAPSHOT",
            TableHint::HoldLock => "HOLDLOCK",
            TableHint::UpdLock => "UPDLOCK",
            TableHint::XLock => "XLOCK",
            TableHint::RowLock => "ROWLOCK",
            TableHint::PagLock => "PAGLOCK",
            TableHint::TabLock => "TABLOCK",
            TableHint::TabLockX => "TABLOCKX",
            TableHint::NoWait => "NOWAIT",
            TableHint::ReadPast => "READPAST",
            TableHint::ForceSeek => "FORCESEEK",
            TableHint::ForceScan => "FORCESCAN",
            TableHint::NoExpand => "NOEXPAND",
        }
    }
}

/// A set of table hints, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableHints(BTreeSet<TableHint>);

impl TableHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hint: TableHint) {
        self.0.insert(hint);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `WITH (A,B)`, or `None` when empty.
    pub fn render(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let names: Vec<&str> = self.0.iter().map(TableHint::as_str).collect();
        Some(format!("WITH ({})", names.join(",")))
    }
}

impl FromIterator<TableHint> for TableHints {
    fn from_iter<I: IntoIterator<Item = TableHint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
