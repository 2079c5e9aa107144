//! DELETE statement builder.

use crate::alias::TableAliasRegistry;
use crate::clause::{LogicalOp, SqlWhere};
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::expr::Expr;
use crate::hint::{TableHint, TableHints};
use crate::ident::IntoIdent;
use crate::log::StatementKind;
use crate::metadata::{Mapped, collect_values, key_condition};

use super::traits::SqlStatement;
use super::{Top, record};

/// DELETE builder.
///
/// A DELETE without WHERE is rejected unless [`allow_delete_all`](Self::allow_delete_all)
/// was called.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    config: SqlConfig,
    registry: TableAliasRegistry,
    table: Option<String>,
    wheres: SqlWhere,
    top: Option<Top>,
    hints: TableHints,
    allow_delete_all: bool,
    build_error: Option<MapError>,
}

impl DeleteBuilder {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            registry: TableAliasRegistry::new(config.default_schema.clone()),
            config,
            table: None,
            wheres: SqlWhere::new(),
            top: None,
            hints: TableHints::new(),
            allow_delete_all: false,
            build_error: None,
        }
    }

    /// `DELETE FROM T`
    pub fn from<T: Mapped>() -> Self {
        Self::new(SqlConfig::default()).target::<T>()
    }

    pub fn from_with<T: Mapped>(config: SqlConfig) -> Self {
        Self::new(config).target::<T>()
    }

    /// `DELETE FROM` a named table.
    pub fn from_table(table: impl IntoIdent) -> Self {
        Self::from_table_with(table, SqlConfig::default())
    }

    pub fn from_table_with(table: impl IntoIdent, config: SqlConfig) -> Self {
        let mut this = Self::new(config);
        match table.into_ident() {
            Ok(ident) => this.table = Some(ident.to_sql()),
            Err(err) => record(&mut this.build_error, StatementKind::Delete, Err(err)),
        }
        this
    }

    /// Register `T` as the primary (target) table.
    pub fn target<T: Mapped>(mut self) -> Self {
        self.registry.add(T::table_type(), true);
        self
    }

    pub fn top(mut self, count: u64) -> Self {
        self.top = Some(Top {
            count,
            percent: false,
        });
        self
    }

    pub fn top_percent(mut self, percent: u64) -> Self {
        self.top = Some(Top {
            count: percent,
            percent: true,
        });
        self
    }

    pub fn with_hints(mut self, hints: impl IntoIterator<Item = TableHint>) -> Self {
        for hint in hints {
            self.hints.insert(hint);
        }
        self
    }

    /// Permit a DELETE with no WHERE clause.
    pub fn allow_delete_all(mut self) -> Self {
        self.allow_delete_all = true;
        self
    }

    // ==================== WHERE ====================

    pub fn where_expr<T: Mapped>(self, condition: Expr) -> Self {
        self.and_where::<T>(condition)
    }

    pub fn and_where<T: Mapped>(self, condition: Expr) -> Self {
        self.push_where::<T>(condition, LogicalOp::And)
    }

    pub fn or_where<T: Mapped>(self, condition: Expr) -> Self {
        self.push_where::<T>(condition, LogicalOp::Or)
    }

    pub fn where_raw(mut self, condition: &str, op: LogicalOp) -> Self {
        self.wheres.add_raw(condition, op);
        self
    }

    /// Key equality on the search-key members of `item`: `([Id]=5)`.
    pub fn where_keys<T: Mapped>(mut self, item: &T, op: LogicalOp) -> Self {
        let result = collect_values(item, self.config.enum_mode, |m| {
            m.is_search_key() && m.include.delete
        })
        .and_then(|keys| {
            if keys.is_empty() {
                return Err(MapError::configuration(format!(
                    "'{}' has no search key columns",
                    std::any::type_name::<T>()
                )));
            }
            Ok(key_condition(
                keys.iter().map(|k| (k.column.as_str(), k.literal.as_str())),
            ))
        });
        match result {
            Ok(condition) => self.wheres.add_raw(&condition, op),
            Err(err) => record(&mut self.build_error, StatementKind::Delete, Err(err)),
        }
        self
    }

    fn push_where<T: Mapped>(mut self, condition: Expr, op: LogicalOp) -> Self {
        let result = self
            .wheres
            .add::<T>(&mut self.registry, &self.config, &condition, op);
        record(&mut self.build_error, StatementKind::Delete, result);
        self
    }
}

impl SqlStatement for DeleteBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn config(&self) -> &SqlConfig {
        &self.config
    }

    fn build_error(&self) -> Option<&MapError> {
        self.build_error.as_ref()
    }

    fn render(&self) -> MapResult<String> {
        self.validate()?;
        let target = match (self.registry.primary(), &self.table) {
            (Some(primary), _) => primary.table_with_alias(),
            (None, Some(_)) if !self.registry.is_empty() => {
                return Err(MapError::configuration(
                    "typed WHERE needs a typed DELETE target; use from::<T>() or where_raw",
                ));
            }
            (None, Some(table)) => table.clone(),
            (None, None) => return Err(MapError::NoPrimaryTable),
        };
        if self.wheres.is_empty() && !self.allow_delete_all {
            return Err(MapError::configuration(
                "DELETE without WHERE; call allow_delete_all() to delete every row",
            ));
        }

        let mut sql = String::from("DELETE ");
        if let Some(top) = &self.top {
            sql.push_str(&top.render(true));
            sql.push(' ');
        }
        sql.push_str("FROM ");
        sql.push_str(&target);
        if let Some(hints) = self.hints.render() {
            sql.push(' ');
            sql.push_str(&hints);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.to_string());
        }
        sql.push(';');
        Ok(sql)
    }
}
