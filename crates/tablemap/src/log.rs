//! `tracing` integration.
//!
//! Built statements are emitted at `DEBUG` on target `tablemap.sql`. Enable via
//! the crate feature `tracing` (on by default); without it these are no-ops.

use crate::config::SqlConfig;

/// The kind of statement a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Merge => "MERGE",
        }
    }
}

/// Truncate a SQL string to at most `max_bytes`, respecting UTF-8 boundaries.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
pub(crate) fn statement_built(kind: StatementKind, sql: &str, config: &SqlConfig) {
    if !config.log_statements {
        return;
    }
    match config.max_logged_sql_length {
        Some(max) if sql.len() > max => tracing::debug!(
            target: "tablemap.sql",
            statement = kind.as_str(),
            sql = %format_args!("{}...", truncate_sql_bytes(sql, max)),
            "statement built"
        ),
        _ => tracing::debug!(
            target: "tablemap.sql",
            statement = kind.as_str(),
            sql = %sql,
            "statement built"
        ),
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn statement_built(_kind: StatementKind, _sql: &str, _config: &SqlConfig) {}

#[cfg(feature = "tracing")]
pub(crate) fn alias_assigned(type_name: &str, alias: &str, is_primary: bool) {
    tracing::trace!(target: "tablemap.sql", type_name, alias, is_primary, "alias assigned");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn alias_assigned(_type_name: &str, _alias: &str, _is_primary: bool) {}

#[cfg(feature = "tracing")]
pub(crate) fn builder_error(kind: StatementKind, error: &crate::error::MapError) {
    tracing::debug!(target: "tablemap.sql", statement = kind.as_str(), %error, "builder error recorded");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn builder_error(_kind: StatementKind, _error: &crate::error::MapError) {}
