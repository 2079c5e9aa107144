//! UPDATE statement builder.

use crate::alias::TableAliasRegistry;
use crate::clause::{LogicalOp, SqlWhere};
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::expr::Expr;
use crate::hint::{TableHint, TableHints};
use crate::ident::{IntoIdent, quote};
use crate::log::StatementKind;
use crate::metadata::{ColumnValue, Mapped, collect_values, key_condition};
use crate::value::SqlValue;

use super::traits::SqlStatement;
use super::{Top, record};

/// UPDATE builder.
///
/// Every value row becomes its own `UPDATE ... ;` statement; `build()` joins
/// them with newlines. Without an explicit WHERE, each statement is keyed on
/// the search-key columns of its own row.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    config: SqlConfig,
    registry: TableAliasRegistry,
    /// Untyped target set by `for_table`.
    table: Option<String>,
    rows: Vec<Vec<ColumnValue>>,
    wheres: SqlWhere,
    top: Option<Top>,
    hints: TableHints,
    build_error: Option<MapError>,
}

impl UpdateBuilder {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            registry: TableAliasRegistry::new(config.default_schema.clone()),
            config,
            table: None,
            rows: Vec::new(),
            wheres: SqlWhere::new(),
            top: None,
            hints: TableHints::new(),
            build_error: None,
        }
    }

    /// `UPDATE T`
    pub fn for_type<T: Mapped>() -> Self {
        Self::new(SqlConfig::default()).target::<T>()
    }

    pub fn for_type_with<T: Mapped>(config: SqlConfig) -> Self {
        Self::new(config).target::<T>()
    }

    /// `UPDATE` a named table; rows come from [`values_map`](Self::values_map)
    /// or [`set`](Self::set).
    pub fn for_table(table: impl IntoIdent) -> Self {
        Self::for_table_with(table, SqlConfig::default())
    }

    pub fn for_table_with(table: impl IntoIdent, config: SqlConfig) -> Self {
        let mut this = Self::new(config);
        match table.into_ident() {
            Ok(ident) => this.table = Some(ident.to_sql()),
            Err(err) => record(&mut this.build_error, StatementKind::Update, Err(err)),
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

    // ==================== Values ====================

    /// One row from the updatable members of `item`, search keys included.
    pub fn values<T: Mapped>(mut self, item: &T) -> Self {
        match collect_values(item, self.config.enum_mode, |m| {
            m.include.update || m.is_search_key()
        }) {
            Ok(row) => self.rows.push(row),
            Err(err) => record(&mut self.build_error, StatementKind::Update, Err(err)),
        }
        self
    }

    pub fn values_many<'a, T: Mapped>(mut self, items: impl IntoIterator<Item = &'a T>) -> Self {
        for item in items {
            self = self.values(item);
        }
        self
    }

    /// One row from column/value pairs. Columns flagged as search keys in
    /// the target's metadata key the generated WHERE.
    pub fn values_map<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let mut row = Vec::new();
        for (column, value) in pairs {
            match self.column_value(column.into(), value.into()) {
                Ok(v) => row.push(v),
                Err(err) => {
                    record(&mut self.build_error, StatementKind::Update, Err(err));
                    return self;
                }
            }
        }
        self.rows.push(row);
        self
    }

    /// Set one column on the last row, starting a row if there is none.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        match self.column_value(column.into(), value.into()) {
            Ok(v) => match self.rows.last_mut() {
                Some(row) => {
                    row.retain(|c| c.column != v.column);
                    row.push(v);
                }
                None => self.rows.push(vec![v]),
            },
            Err(err) => record(&mut self.build_error, StatementKind::Update, Err(err)),
        }
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

    fn push_where<T: Mapped>(mut self, condition: Expr, op: LogicalOp) -> Self {
        let result = self
            .wheres
            .add::<T>(&mut self.registry, &self.config, &condition, op);
        record(&mut self.build_error, StatementKind::Update, result);
        self
    }

    fn column_value(&self, column: String, value: SqlValue) -> MapResult<ColumnValue> {
        let meta = self
            .registry
            .primary()
            .and_then(|p| p.metadata().column(&column));
        let (literal, search_key) = match meta {
            Some(meta) => (
                meta.render_value(&value, self.config.enum_mode)?,
                meta.is_search_key(),
            ),
            None => (value.to_sql_literal_with(self.config.enum_mode), false),
        };
        Ok(ColumnValue {
            column,
            literal,
            search_key,
        })
    }

    /// Head of each statement: `UPDATE [TOP (n)] target` plus the FROM part
    /// that introduces the alias, if any.
    fn render_target(&self) -> MapResult<(String, String)> {
        let hints = self.hints.render();
        let top = self
            .top
            .map(|t| format!("{} ", t.render(true)))
            .unwrap_or_default();

        match (self.registry.primary(), &self.table) {
            (Some(primary), _) => {
                let mut from = format!(" FROM {}", primary.table_with_alias());
                if let Some(hints) = hints {
                    from.push(' ');
                    from.push_str(&hints);
                }
                Ok((format!("UPDATE {top}{}", quote(primary.alias())), from))
            }
            (None, Some(_)) if !self.registry.is_empty() => Err(MapError::configuration(
                "typed WHERE needs a typed UPDATE target; use for_type::<T>() or where_raw",
            )),
            (None, Some(table)) => {
                let mut head = format!("UPDATE {top}{table}");
                if let Some(hints) = hints {
                    head.push(' ');
                    head.push_str(&hints);
                }
                Ok((head, String::new()))
            }
            (None, None) => Err(MapError::NoPrimaryTable),
        }
    }

    fn render_where(&self, index: usize, row: &[ColumnValue]) -> MapResult<String> {
        if !self.wheres.is_empty() {
            return Ok(self.wheres.to_string());
        }
        let keys: Vec<(&str, &str)> = match self.registry.primary() {
            Some(primary) => primary
                .metadata()
                .search_keys()
                .map(|key| {
                    row.iter()
                        .find(|c| c.column == key.column)
                        .map(|c| (c.column.as_str(), c.literal.as_str()))
                        .ok_or_else(|| {
                            MapError::MissingValue(format!(
                                "search key '{}' in update row {index}",
                                key.column
                            ))
                        })
                })
                .collect::<MapResult<_>>()?,
            None => row
                .iter()
                .filter(|c| c.search_key)
                .map(|c| (c.column.as_str(), c.literal.as_str()))
                .collect(),
        };
        if keys.is_empty() {
            return Err(MapError::configuration(
                "UPDATE without WHERE needs search key columns",
            ));
        }
        Ok(key_condition(keys))
    }
}

impl SqlStatement for UpdateBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn config(&self) -> &SqlConfig {
        &self.config
    }

    fn build_error(&self) -> Option<&MapError> {
        self.build_error.as_ref()
    }

    fn render(&self) -> MapResult<String> {
        self.validate()?;
        let (head, from) = self.render_target()?;
        if self.rows.is_empty() {
            return Err(MapError::configuration("UPDATE has no values"));
        }

        let mut statements = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let sets: Vec<String> = row
                .iter()
                .filter(|c| !c.search_key)
                .map(|c| format!("{}={}", quote(&c.column), c.literal))
                .collect();
            if sets.is_empty() {
                return Err(MapError::configuration(format!(
                    "update row {index} sets no columns"
                )));
            }
            let condition = self.render_where(index, row)?;
            statements.push(format!(
                "{head} SET {}{from} WHERE {condition};",
                sets.join(",")
            ));
        }
        Ok(statements.join("\n"))
    }
}
