//! INSERT statement builder.

use crate::alias::TableAliasRegistry;
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::hint::{TableHint, TableHints};
use crate::ident::{IntoIdent, quote};
use crate::log::StatementKind;
use crate::metadata::{Mapped, collect_values};
use crate::value::SqlValue;

use super::select::QueryBuilder;
use super::traits::SqlStatement;
use super::record;

/// Where inserted rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// Explicit `VALUES` rows, each a list of `(column, literal)`.
    Values(Vec<Vec<(String, String)>>),
    /// `INSERT ... SELECT`
    Query(String),
    DefaultValues,
}

/// INSERT builder.
///
/// All value rows must carry exactly the destination column set. The column
/// list is taken from the first row unless given with [`columns`](Self::columns).
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    config: SqlConfig,
    registry: TableAliasRegistry,
    destination: Option<String>,
    columns: Vec<String>,
    hints: TableHints,
    source: Option<Source>,
    build_error: Option<MapError>,
}

impl InsertBuilder {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            registry: TableAliasRegistry::new(config.default_schema.clone()),
            config,
            destination: None,
            columns: Vec::new(),
            hints: TableHints::new(),
            source: None,
            build_error: None,
        }
    }

    /// `INSERT INTO T`
    pub fn into<T: Mapped>() -> Self {
        Self::new(SqlConfig::default()).into_type::<T>()
    }

    pub fn into_with<T: Mapped>(config: SqlConfig) -> Self {
        Self::new(config).into_type::<T>()
    }

    /// Set `T` as destination and primary table.
    pub fn into_type<T: Mapped>(mut self) -> Self {
        let entry = self.registry.add(T::table_type(), true);
        self.destination = Some(entry.qualified_name().to_string());
        self
    }

    /// `INSERT INTO` a named table.
    pub fn into_table(mut self, table: impl IntoIdent) -> Self {
        match table.into_ident() {
            Ok(ident) => self.destination = Some(ident.to_sql()),
            Err(err) => record(&mut self.build_error, StatementKind::Insert, Err(err)),
        }
        self
    }

    /// Destination column list, replacing any derived one.
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hints(mut self, hints: impl IntoIterator<Item = TableHint>) -> Self {
        for hint in hints {
            self.hints.insert(hint);
        }
        self
    }

    // ==================== Values ====================

    /// One row from the insertable members of `item`.
    pub fn values<T: Mapped>(mut self, item: &T) -> Self {
        let result = collect_values(item, self.config.enum_mode, |m| m.include.insert).map(|cols| {
            cols.into_iter()
                .map(|c| (c.column, c.literal))
                .collect::<Vec<_>>()
        });
        match result {
            Ok(row) => self.push_row(row),
            Err(err) => record(&mut self.build_error, StatementKind::Insert, Err(err)),
        }
        self
    }

    /// One row per record.
    pub fn values_many<'a, T: Mapped>(mut self, records: impl IntoIterator<Item = &'a T>) -> Self {
        for item in records {
            self = self.values(item);
        }
        self
    }

    /// One row from column/value pairs, in the given order.
    ///
    /// Columns known to the destination's metadata use its value policy.
    pub fn values_map<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let mut row = Vec::new();
        for (column, value) in pairs {
            let column = column.into();
            match self.render_for_column(&column, &value.into()) {
                Ok(literal) => row.push((column, literal)),
                Err(err) => {
                    record(&mut self.build_error, StatementKind::Insert, Err(err));
                    return self;
                }
            }
        }
        self.push_row(row);
        self
    }

    /// `INSERT INTO t DEFAULT VALUES`. Exclusive with any other source.
    pub fn default_values(mut self) -> Self {
        match self.source {
            None | Some(Source::DefaultValues) => self.source = Some(Source::DefaultValues),
            Some(_) => record(
                &mut self.build_error,
                StatementKind::Insert,
                Err(MapError::configuration(
                    "DEFAULT VALUES cannot be combined with other values",
                )),
            ),
        }
        self
    }

    /// `INSERT INTO t (cols) SELECT ...` from a query builder.
    pub fn from_query(mut self, query: &QueryBuilder) -> Self {
        match query.to_subquery() {
            Ok(sql) => self.set_query(sql),
            Err(err) => {
                record(&mut self.build_error, StatementKind::Insert, Err(err));
                self
            }
        }
    }

    /// `INSERT INTO t (cols) <sql>`; the SQL is used verbatim.
    pub fn from_sql(self, sql: impl Into<String>) -> Self {
        self.set_query(sql.into())
    }

    fn set_query(mut self, sql: String) -> Self {
        match self.source {
            None => self.source = Some(Source::Query(sql)),
            Some(_) => record(
                &mut self.build_error,
                StatementKind::Insert,
                Err(MapError::configuration(
                    "INSERT source query cannot be combined with other values",
                )),
            ),
        }
        self
    }

    fn push_row(&mut self, row: Vec<(String, String)>) {
        match &mut self.source {
            None => {
                if self.columns.is_empty() {
                    self.columns = row.iter().map(|(c, _)| c.clone()).collect();
                }
                self.source = Some(Source::Values(vec![row]));
            }
            Some(Source::Values(rows)) => rows.push(row),
            Some(_) => record(
                &mut self.build_error,
                StatementKind::Insert,
                Err(MapError::configuration(
                    "VALUES cannot be combined with DEFAULT VALUES or a source query",
                )),
            ),
        }
    }

    fn render_for_column(&self, column: &str, value: &SqlValue) -> MapResult<String> {
        match self
            .registry
            .primary()
            .and_then(|p| p.metadata().column(column))
        {
            Some(meta) => meta.render_value(value, self.config.enum_mode),
            None => Ok(value.to_sql_literal_with(self.config.enum_mode)),
        }
    }

    fn render_columns(&self) -> String {
        let quoted: Vec<String> = self.columns.iter().map(|c| quote(c)).collect();
        format!("({})", quoted.join(","))
    }

    fn render_row(&self, index: usize, row: &[(String, String)]) -> MapResult<String> {
        if row.len() != self.columns.len() {
            return Err(MapError::ColumnMismatch {
                row: index,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        let mut literals = Vec::with_capacity(row.len());
        for column in &self.columns {
            let literal = row
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, l)| l.as_str())
                .ok_or_else(|| {
                    MapError::configuration(format!(
                        "row {index} has no value for column '{column}'"
                    ))
                })?;
            literals.push(literal);
        }
        Ok(format!("({})", literals.join(",")))
    }
}

impl SqlStatement for InsertBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn config(&self) -> &SqlConfig {
        &self.config
    }

    fn build_error(&self) -> Option<&MapError> {
        self.build_error.as_ref()
    }

    fn render(&self) -> MapResult<String> {
        self.validate()?;
        let destination = self.destination.as_deref().ok_or(MapError::NoPrimaryTable)?;

        let mut sql = format!("INSERT INTO {destination}");
        if let Some(hints) = self.hints.render() {
            sql.push(' ');
            sql.push_str(&hints);
        }

        match &self.source {
            Some(Source::DefaultValues) => sql.push_str(" DEFAULT VALUES"),
            Some(Source::Query(query)) => {
                if self.columns.is_empty() {
                    return Err(MapError::configuration("INSERT has no destination columns"));
                }
                sql.push(' ');
                sql.push_str(&self.render_columns());
                sql.push(' ');
                sql.push_str(query);
            }
            Some(Source::Values(rows)) => {
                if self.columns.is_empty() {
                    return Err(MapError::configuration("INSERT has no destination columns"));
                }
                let rows = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.render_row(i, row))
                    .collect::<MapResult<Vec<_>>>()?;
                sql.push(' ');
                sql.push_str(&self.render_columns());
                sql.push_str(" VALUES ");
                sql.push_str(&rows.join(","));
            }
            None => {
                return Err(MapError::configuration(
                    "INSERT has no values, source query or DEFAULT VALUES",
                ));
            }
        }
        sql.push(';');
        Ok(sql)
    }
}
