//! MERGE statement builder.

use crate::alias::TableAliasRegistry;
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::hint::{TableHint, TableHints};
use crate::ident::{IntoIdent, quote};
use crate::log::StatementKind;
use crate::metadata::{Mapped, collect_values};
use crate::value::{EnumMode, SqlValue};

use super::select::QueryBuilder;
use super::traits::SqlStatement;
use super::{Top, record};

/// What a `WHEN [NOT] MATCHED` branch does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// `UPDATE SET [col]=expr,...` with already rendered expressions.
    Update(Vec<(String, String)>),
    /// `INSERT ([a],[b]) VALUES (x,y)`
    Insert {
        columns: Vec<String>,
        values: Vec<String>,
    },
    Delete,
    /// Caller-written action, used verbatim.
    Raw(String),
}

impl MergeAction {
    /// `UPDATE SET` from column/value pairs.
    pub fn update<K, V>(assignments: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        MergeAction::Update(
            assignments
                .into_iter()
                .map(|(k, v)| (k.into(), v.into().to_sql_literal()))
                .collect(),
        )
    }

    /// `UPDATE SET` of the updatable, non-key members of `item`.
    pub fn update_from<T: Mapped>(item: &T) -> MapResult<Self> {
        let values = collect_values(item, EnumMode::default(), |m| {
            m.include.update && !m.is_search_key()
        })?;
        Ok(MergeAction::Update(
            values.into_iter().map(|v| (v.column, v.literal)).collect(),
        ))
    }

    /// `UPDATE SET [Col]=[src].[Col]` for the updatable, non-key columns of `T`.
    pub fn update_from_source<T: Mapped>(source_alias: &str) -> Self {
        let source = quote(source_alias);
        MergeAction::Update(
            T::metadata()
                .members
                .iter()
                .filter(|m| m.include.update && !m.is_search_key())
                .map(|m| (m.column.to_string(), format!("{source}.{}", m.quoted())))
                .collect(),
        )
    }

    /// `INSERT` of the insertable members of `item`.
    pub fn insert_from<T: Mapped>(item: &T) -> MapResult<Self> {
        let values = collect_values(item, EnumMode::default(), |m| m.include.insert)?;
        let (columns, values) = values.into_iter().map(|v| (v.column, v.literal)).unzip();
        Ok(MergeAction::Insert { columns, values })
    }

    /// `INSERT ([Col],...) VALUES ([src].[Col],...)` for the insertable columns of `T`.
    pub fn insert_from_source<T: Mapped>(source_alias: &str) -> Self {
        let source = quote(source_alias);
        let (columns, values) = T::metadata()
            .members
            .iter()
            .filter(|m| m.include.insert)
            .map(|m| (m.column.to_string(), format!("{source}.{}", m.quoted())))
            .unzip();
        MergeAction::Insert { columns, values }
    }

    /// Inner statement text; empty when the action has nothing to do.
    fn render(&self) -> MapResult<String> {
        Ok(match self {
            MergeAction::Update(assignments) if assignments.is_empty() => String::new(),
            MergeAction::Update(assignments) => {
                let sets: Vec<String> = assignments
                    .iter()
                    .map(|(column, value)| format!("{}={value}", quote(column)))
                    .collect();
                format!("UPDATE SET {}", sets.join(","))
            }
            MergeAction::Insert { columns, .. } if columns.is_empty() => String::new(),
            MergeAction::Insert { columns, values } => {
                if columns.len() != values.len() {
                    return Err(MapError::ColumnMismatch {
                        row: 0,
                        expected: columns.len(),
                        found: values.len(),
                    });
                }
                let columns: Vec<String> = columns.iter().map(|c| quote(c)).collect();
                format!(
                    "INSERT ({}) VALUES ({})",
                    columns.join(","),
                    values.join(",")
                )
            }
            MergeAction::Delete => "DELETE".to_string(),
            MergeAction::Raw(sql) => sql.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MatchClause {
    matched: bool,
    condition: Option<String>,
    action: MergeAction,
}

impl MatchClause {
    fn render(&self) -> MapResult<String> {
        let inner = self.action.render()?;
        if inner.is_empty() {
            return Err(MapError::configuration("MERGE action renders empty"));
        }
        let mut sql = String::from(if self.matched {
            "WHEN MATCHED"
        } else {
            "WHEN NOT MATCHED"
        });
        match self.condition.as_deref() {
            Some(by @ ("BY TARGET" | "BY SOURCE")) => {
                sql.push(' ');
                sql.push_str(by);
            }
            Some(condition) => {
                sql.push_str(" AND (");
                sql.push_str(condition);
                sql.push(')');
            }
            None => {}
        }
        sql.push_str(" THEN ");
        sql.push_str(&inner);
        Ok(sql)
    }
}

/// MERGE builder.
#[derive(Debug, Clone)]
pub struct MergeBuilder {
    config: SqlConfig,
    registry: TableAliasRegistry,
    /// `(qualified name, alias)` of an untyped target.
    named_target: Option<(String, String)>,
    top: Option<Top>,
    hints: TableHints,
    using: Option<String>,
    clauses: Vec<MatchClause>,
    build_error: Option<MapError>,
}

impl MergeBuilder {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            registry: TableAliasRegistry::new(config.default_schema.clone()),
            config,
            named_target: None,
            top: None,
            hints: TableHints::new(),
            using: None,
            clauses: Vec::new(),
            build_error: None,
        }
    }

    /// `MERGE T AS [t0]`
    pub fn table<T: Mapped>() -> Self {
        Self::new(SqlConfig::default()).target::<T>()
    }

    pub fn table_with<T: Mapped>(config: SqlConfig) -> Self {
        Self::new(config).target::<T>()
    }

    /// `MERGE name AS [alias]`
    pub fn table_named(table: impl IntoIdent, alias: &str) -> Self {
        Self::table_named_with(table, alias, SqlConfig::default())
    }

    pub fn table_named_with(table: impl IntoIdent, alias: &str, config: SqlConfig) -> Self {
        let mut this = Self::new(config);
        match table.into_ident() {
            Ok(ident) => this.named_target = Some((ident.to_sql(), alias.to_string())),
            Err(err) => record(&mut this.build_error, StatementKind::Merge, Err(err)),
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

    pub fn with_hints(mut self, hints: impl IntoIterator<Item = TableHint>) -> Self {
        for hint in hints {
            self.hints.insert(hint);
        }
        self
    }

    /// `USING (<query>) AS [alias] ON (<on>)`
    pub fn using_query(mut self, query: &QueryBuilder, alias: &str, on: Option<&str>) -> Self {
        match query.to_subquery() {
            Ok(sql) => self.using = Some(render_using(&sql, alias, on)),
            Err(err) => record(&mut self.build_error, StatementKind::Merge, Err(err)),
        }
        self
    }

    /// `USING (<sql>) AS [alias] ON (<on>)` with caller-written SQL.
    pub fn using(mut self, sql: &str, alias: &str, on: Option<&str>) -> Self {
        self.using = Some(render_using(sql, alias, on));
        self
    }

    /// `WHEN MATCHED [AND (cond)] THEN <action>`
    pub fn when_matched(mut self, condition: Option<&str>, action: MergeAction) -> Self {
        self.clauses.push(MatchClause {
            matched: true,
            condition: condition.map(str::to_string),
            action,
        });
        self
    }

    /// `WHEN NOT MATCHED [BY TARGET | BY SOURCE | AND (cond)] THEN <action>`
    pub fn when_not_matched(mut self, condition: Option<&str>, action: MergeAction) -> Self {
        self.clauses.push(MatchClause {
            matched: false,
            condition: condition.map(str::to_string),
            action,
        });
        self
    }

    fn render_target(&self) -> MapResult<(String, String)> {
        match (self.registry.primary(), &self.named_target) {
            (Some(primary), _) => Ok((
                primary.qualified_name().to_string(),
                primary.alias().to_string(),
            )),
            (None, Some(named)) => Ok(named.clone()),
            (None, None) => Err(MapError::NoPrimaryTable),
        }
    }
}

fn render_using(source: &str, alias: &str, on: Option<&str>) -> String {
    let mut sql = format!("USING ({}) AS {}", source.trim(), quote(alias));
    if let Some(on) = on {
        if on.starts_with('(') {
            sql.push_str(" ON ");
            sql.push_str(on);
        } else {
            sql.push_str(" ON (");
            sql.push_str(on);
            sql.push(')');
        }
    }
    sql
}

impl SqlStatement for MergeBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Merge
    }

    fn config(&self) -> &SqlConfig {
        &self.config
    }

    fn build_error(&self) -> Option<&MapError> {
        self.build_error.as_ref()
    }

    fn render(&self) -> MapResult<String> {
        self.validate()?;
        let (table, alias) = self.render_target()?;
        let using = self
            .using
            .as_deref()
            .ok_or_else(|| MapError::configuration("MERGE has no USING source"))?;
        if self.clauses.is_empty() {
            return Err(MapError::configuration("MERGE has no WHEN clauses"));
        }

        let mut sql = String::from("MERGE ");
        if let Some(top) = &self.top {
            sql.push_str(&top.render(true));
            sql.push(' ');
        }
        sql.push_str(&table);
        if let Some(hints) = self.hints.render() {
            sql.push(' ');
            sql.push_str(&hints);
        }
        sql.push_str(" AS ");
        sql.push_str(&quote(&alias));
        sql.push(' ');
        sql.push_str(using);
        for clause in &self.clauses {
            sql.push(' ');
            sql.push_str(&clause.render()?);
        }
        sql.push(';');
        Ok(sql)
    }
}
