//! SELECT statement builder.

use crate::alias::TableAliasRegistry;
use crate::clause::{JoinType, LogicalOp, SqlJoin, SqlWhere};
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::expr::{Expr, SqlCompiler};
use crate::hint::{TableHint, TableHints};
use crate::ident::IntoIdent;
use crate::log::StatementKind;
use crate::metadata::{Mapped, TableType};

use super::traits::SqlStatement;
use super::{Top, record};

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// GROUP BY variants.
#[derive(Debug, Clone)]
pub enum Grouping {
    /// `GROUP BY a,b`
    Standard(Vec<Expr>),
    /// `GROUP BY ROLLUP (a,b)`
    Rollup(Vec<Expr>),
    /// `GROUP BY CUBE (a,b)`
    Cube(Vec<Expr>),
    /// `GROUP BY GROUPING SETS ((a,b),(a),())`
    GroupingSets(Vec<Vec<Expr>>),
    /// `GROUP BY ()`
    Empty,
}

/// SELECT query builder.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: SqlConfig,
    registry: TableAliasRegistry,
    columns: Vec<String>,
    distinct: bool,
    top: Option<Top>,
    hints: TableHints,
    into: Option<String>,
    joins: SqlJoin,
    wheres: SqlWhere,
    group_by: Option<String>,
    having: Option<String>,
    order_by: Vec<String>,
    build_error: Option<MapError>,
}

impl QueryBuilder {
    /// Create a builder with no primary table; set one with [`from_type`](Self::from_type).
    pub fn new(config: SqlConfig) -> Self {
        Self {
            registry: TableAliasRegistry::new(config.default_schema.clone()),
            config,
            columns: Vec::new(),
            distinct: false,
            top: None,
            hints: TableHints::new(),
            into: None,
            joins: SqlJoin::new(),
            wheres: SqlWhere::new(),
            group_by: None,
            having: None,
            order_by: Vec::new(),
            build_error: None,
        }
    }

    /// `SELECT ... FROM T` with the default configuration.
    pub fn from<T: Mapped>() -> Self {
        Self::new(SqlConfig::default()).from_type::<T>()
    }

    pub fn from_with<T: Mapped>(config: SqlConfig) -> Self {
        Self::new(config).from_type::<T>()
    }

    /// Register `T` as the primary (FROM) table.
    pub fn from_type<T: Mapped>(mut self) -> Self {
        self.registry.add(T::table_type(), true);
        self
    }

    // ==================== Columns ====================

    /// Every mapped column of `T`, qualified by its alias.
    pub fn select_all<T: Mapped>(mut self) -> Self {
        let entry = self.registry.add(T::table_type(), false);
        let columns: Vec<String> = entry.qualified_columns().collect();
        for column in columns {
            self.push_column(column);
        }
        self
    }

    /// Compiled projections of `T`. Identity selectors add nothing.
    pub fn select<T: Mapped>(mut self, selectors: impl IntoIterator<Item = Expr>) -> Self {
        let table_type = T::table_type();
        self.registry.add(table_type, false);
        for selector in selectors {
            match self.compile(table_type, &selector, true) {
                Ok(sql) if sql.is_empty() => {}
                Ok(sql) => self.push_column(sql),
                Err(err) => {
                    record(&mut self.build_error, StatementKind::Select, Err(err));
                }
            }
        }
        self
    }

    /// Every column of every table registered so far.
    pub fn select_every(mut self) -> Self {
        let columns: Vec<String> = self
            .registry
            .entries()
            .iter()
            .flat_map(|e| e.qualified_columns())
            .collect();
        for column in columns {
            self.push_column(column);
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
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

    /// Table hints on the FROM table.
    pub fn with_hints(mut self, hints: impl IntoIterator<Item = TableHint>) -> Self {
        for hint in hints {
            self.hints.insert(hint);
        }
        self
    }

    /// `SELECT ... INTO` the table mapped by `T`.
    pub fn into<T: Mapped>(mut self) -> Self {
        self.into = Some(T::metadata().qualified_name(&self.config.default_schema));
        self
    }

    /// `SELECT ... INTO` a named table.
    pub fn into_table(mut self, table: impl IntoIdent) -> Self {
        match table.into_ident() {
            Ok(ident) => self.into = Some(ident.to_sql()),
            Err(err) => record(&mut self.build_error, StatementKind::Select, Err(err)),
        }
        self
    }

    // ==================== JOIN ====================

    /// Join `R` onto the registered `L`.
    pub fn join<L: Mapped, R: Mapped>(mut self, condition: Expr, join_type: JoinType) -> Self {
        let result = self
            .joins
            .add::<L, R>(&mut self.registry, &self.config, &condition, join_type);
        record(&mut self.build_error, StatementKind::Select, result);
        self
    }

    pub fn inner_join<L: Mapped, R: Mapped>(self, condition: Expr) -> Self {
        self.join::<L, R>(condition, JoinType::Inner)
    }

    pub fn left_join<L: Mapped, R: Mapped>(self, condition: Expr) -> Self {
        self.join::<L, R>(condition, JoinType::Left)
    }

    pub fn cross_join<L: Mapped, R: Mapped>(mut self) -> Self {
        let result = self.joins.add_cross::<L, R>(&mut self.registry, &self.config);
        record(&mut self.build_error, StatementKind::Select, result);
        self
    }

    /// Join a named table with a caller-written condition.
    pub fn join_raw(mut self, table: impl IntoIdent, condition: &str, join_type: JoinType) -> Self {
        let result = self.joins.add_raw(table, condition, join_type, &self.config);
        record(&mut self.build_error, StatementKind::Select, result);
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

    /// Pre-rendered condition, used verbatim.
    pub fn where_raw(mut self, condition: &str, op: LogicalOp) -> Self {
        self.wheres.add_raw(condition, op);
        self
    }

    fn push_where<T: Mapped>(mut self, condition: Expr, op: LogicalOp) -> Self {
        let result = self
            .wheres
            .add::<T>(&mut self.registry, &self.config, &condition, op);
        record(&mut self.build_error, StatementKind::Select, result);
        self
    }

    // ==================== GROUP BY / ORDER BY ====================

    /// GROUP BY over columns of `T`, with an optional HAVING condition.
    ///
    /// Allowed once per statement.
    pub fn group_by<T: Mapped>(mut self, grouping: Grouping, having: Option<Expr>) -> Self {
        if self.group_by.is_some() {
            record(
                &mut self.build_error,
                StatementKind::Select,
                Err(MapError::configuration("GROUP BY can only be specified once")),
            );
            return self;
        }
        let table_type = T::table_type();
        self.registry.add(table_type, false);

        let result = self.render_grouping(table_type, &grouping).and_then(|group| {
            let having = having
                .map(|h| self.compile(table_type, &h, false))
                .transpose()?;
            Ok((group, having))
        });
        match result {
            Ok((group, having)) => {
                self.group_by = Some(group);
                self.having = having;
            }
            Err(err) => record(&mut self.build_error, StatementKind::Select, Err(err)),
        }
        self
    }

    /// Append an ORDER BY key; repeated calls accumulate.
    pub fn order_by<T: Mapped>(mut self, selector: Expr, direction: Direction) -> Self {
        let table_type = T::table_type();
        self.registry.add(table_type, false);
        match self.compile(table_type, &selector, false) {
            Ok(sql) if sql.is_empty() => record(
                &mut self.build_error,
                StatementKind::Select,
                Err(MapError::configuration("ORDER BY selector rendered empty")),
            ),
            Ok(sql) => self.order_by.push(format!("{sql} {}", direction.as_str())),
            Err(err) => record(&mut self.build_error, StatementKind::Select, Err(err)),
        }
        self
    }

    // ==================== Build ====================

    /// The statement without its terminator, for embedding in another
    /// statement.
    pub fn to_subquery(&self) -> MapResult<String> {
        self.validate()?;
        let primary = self.registry.primary().ok_or(MapError::NoPrimaryTable)?;

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if let Some(top) = &self.top {
            sql.push_str(&top.render(false));
            sql.push(' ');
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(","));
        }
        if let Some(into) = &self.into {
            sql.push_str(" INTO ");
            sql.push_str(into);
        }
        sql.push_str(" FROM ");
        sql.push_str(&primary.table_with_alias());
        if let Some(hints) = self.hints.render() {
            sql.push(' ');
            sql.push_str(&hints);
        }
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.joins.to_string());
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.to_string());
        }
        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(having);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(","));
        }
        Ok(sql)
    }

    /// Alias registry of this statement.
    pub fn registry(&self) -> &TableAliasRegistry {
        &self.registry
    }

    fn push_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    fn compile(&self, table_type: TableType, expr: &Expr, as_alias: bool) -> MapResult<String> {
        let params = [table_type];
        SqlCompiler::new(&self.registry, &params)
            .enum_mode(self.config.enum_mode)
            .compile(expr, as_alias)
    }

    fn render_keys(&self, table_type: TableType, keys: &[Expr]) -> MapResult<String> {
        let mut parts = Vec::with_capacity(keys.len());
        for key in keys {
            let sql = self.compile(table_type, key, false)?;
            if sql.is_empty() {
                return Err(MapError::configuration("GROUP BY key rendered empty"));
            }
            parts.push(sql);
        }
        Ok(parts.join(","))
    }

    fn render_grouping(&self, table_type: TableType, grouping: &Grouping) -> MapResult<String> {
        Ok(match grouping {
            Grouping::Standard(keys) => {
                if keys.is_empty() {
                    return Err(MapError::configuration("GROUP BY needs at least one key"));
                }
                self.render_keys(table_type, keys)?
            }
            Grouping::Rollup(keys) => format!("ROLLUP ({})", self.render_keys(table_type, keys)?),
            Grouping::Cube(keys) => format!("CUBE ({})", self.render_keys(table_type, keys)?),
            Grouping::GroupingSets(sets) => {
                let sets = sets
                    .iter()
                    .map(|set| Ok(format!("({})", self.render_keys(table_type, set)?)))
                    .collect::<MapResult<Vec<_>>>()?;
                format!("GROUPING SETS ({})", sets.join(","))
            }
            Grouping::Empty => "()".to_string(),
        })
    }
}

impl SqlStatement for QueryBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }

    fn config(&self) -> &SqlConfig {
        &self.config
    }

    fn build_error(&self) -> Option<&MapError> {
        self.build_error.as_ref()
    }

    fn render(&self) -> MapResult<String> {
        let mut sql = self.to_subquery()?;
        sql.push(';');
        Ok(sql)
    }
}
