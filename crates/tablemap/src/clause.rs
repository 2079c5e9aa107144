//! JOIN and WHERE clause collections.
//!
//! Both hold already-rendered fragments; literals inside them have gone through
//! [`SqlValue`](crate::SqlValue) rendering. Raw fragments are caller trusted.

use std::fmt;

use crate::alias::TableAliasRegistry;
use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::expr::{Expr, SqlCompiler};
use crate::hint::TableHint;
use crate::ident::IntoIdent;
use crate::metadata::Mapped;

/// JOIN kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// Operator connecting a WHERE fragment to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Ordered JOIN clauses of one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlJoin {
    fragments: Vec<String>,
}

impl SqlJoin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `R` onto the already registered `L`.
    ///
    /// The condition is compiled with lambda parameters `[L, R]`.
    pub fn add<L: Mapped, R: Mapped>(
        &mut self,
        registry: &mut TableAliasRegistry,
        config: &SqlConfig,
        condition: &Expr,
        join_type: JoinType,
    ) -> MapResult<()> {
        if join_type == JoinType::Cross {
            return Err(MapError::configuration(
                "CROSS JOIN takes no condition; use add_cross",
            ));
        }
        let left = L::table_type();
        if registry.get(left.id()).is_none() {
            return Err(MapError::UnregisteredType(left.type_name().to_string()));
        }
        let right = R::table_type();
        let table = registry.add(right, false).table_with_alias();

        let params = [left, right];
        let condition = SqlCompiler::new(registry, &params)
            .enum_mode(config.enum_mode)
            .compile(condition, false)?;
        self.fragments.push(render_join(
            join_type,
            &table,
            config.join_hint,
            Some(&condition),
        ));
        Ok(())
    }

    /// Join a table by name with a caller-written condition, used verbatim.
    pub fn add_raw(
        &mut self,
        table: impl IntoIdent,
        condition: &str,
        join_type: JoinType,
        config: &SqlConfig,
    ) -> MapResult<()> {
        let table = table.into_ident()?.to_sql();
        let condition = (join_type != JoinType::Cross).then_some(condition);
        self.fragments
            .push(render_join(join_type, &table, config.join_hint, condition));
        Ok(())
    }

    /// `CROSS JOIN` of `R`; `L` must already be registered.
    pub fn add_cross<L: Mapped, R: Mapped>(
        &mut self,
        registry: &mut TableAliasRegistry,
        config: &SqlConfig,
    ) -> MapResult<()> {
        let left = L::table_type();
        if registry.get(left.id()).is_none() {
            return Err(MapError::UnregisteredType(left.type_name().to_string()));
        }
        let table = registry.add(R::table_type(), false).table_with_alias();
        self.fragments
            .push(render_join(JoinType::Cross, &table, config.join_hint, None));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

impl fmt::Display for SqlJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragments.join(" "))
    }
}

fn render_join(
    join_type: JoinType,
    table: &str,
    hint: Option<TableHint>,
    condition: Option<&str>,
) -> String {
    let mut sql = format!("{} {}", join_type.as_str(), table);
    if let Some(hint) = hint {
        sql.push_str(" WITH (");
        sql.push_str(hint.as_str());
        sql.push(')');
    }
    if let Some(condition) = condition {
        sql.push_str(" ON ");
        sql.push_str(condition);
    }
    sql
}

/// Ordered WHERE fragments, interleaved with their `AND` / `OR` operators.
///
/// Fragments are emitted in insertion order; grouping is whatever the calls
/// produced, each condition wrapped in its own parentheses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlWhere {
    fragments: Vec<String>,
}

impl SqlWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` and append its compiled condition.
    pub fn add<T: Mapped>(
        &mut self,
        registry: &mut TableAliasRegistry,
        config: &SqlConfig,
        condition: &Expr,
        op: LogicalOp,
    ) -> MapResult<()> {
        let table_type = T::table_type();
        registry.add(table_type, false);
        let params = [table_type];
        let sql = SqlCompiler::new(registry, &params)
            .enum_mode(config.enum_mode)
            .compile(condition, false)?;
        if sql.is_empty() {
            return Err(MapError::configuration("WHERE condition rendered empty"));
        }
        self.add_raw(&sql, op);
        Ok(())
    }

    /// Append a pre-rendered condition.
    pub fn add_raw(&mut self, fragment: &str, op: LogicalOp) {
        if !self.fragments.is_empty() {
            self.fragments.push(op.as_str().to_string());
        }
        if fragment.starts_with('(') {
            self.fragments.push(fragment.to_string());
        } else {
            self.fragments.push(format!("({fragment})"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl fmt::Display for SqlWhere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragments.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use crate::fixtures::{Department, Employee, Staff};

    #[test]
    fn typed_join_renders_alias_hint_and_condition() {
        let config = SqlConfig::default();
        let mut registry = TableAliasRegistry::default();
        registry.add(Staff::table_type(), true);

        let mut joins = SqlJoin::new();
        joins
            .add::<Staff, Department>(
                &mut registry,
                &config,
                &col::<Staff>("DeptId").eq(col::<Department>("Id")),
                JoinType::Inner,
            )
            .unwrap();

        assert_eq!(
            joins.to_string(),
            "INNER JOIN [dbo].[Department] [t1] WITH (NOLOCK) ON (t0.[DeptId] = t1.[Id])"
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn join_requires_registered_left_side() {
        let config = SqlConfig::default();
        let mut registry = TableAliasRegistry::default();
        let mut joins = SqlJoin::new();
        let err = joins
            .add::<Staff, Department>(
                &mut registry,
                &config,
                &col::<Staff>("DeptId").eq(col::<Department>("Id")),
                JoinType::Left,
            )
            .unwrap_err();
        assert!(matches!(err, MapError::UnregisteredType(_)));
        assert!(joins.is_empty());
    }

    #[test]
    fn join_hint_follows_config() {
        let config = SqlConfig::default().join_hint(None);
        let mut registry = TableAliasRegistry::default();
        registry.add(Staff::table_type(), true);
        let mut joins = SqlJoin::new();
        joins
            .add_raw("dbo.Audit", "[Audit].[StaffId] = t0.[Id]", JoinType::Left, &config)
            .unwrap();
        joins.add_cross::<Staff, Department>(&mut registry, &config).unwrap();

        assert_eq!(
            joins.to_string(),
            "LEFT JOIN [dbo].[Audit] ON [Audit].[StaffId] = t0.[Id] CROSS JOIN [dbo].[Department] [t1]"
        );
    }

    #[test]
    fn where_fragments_keep_call_order() {
        let config = SqlConfig::default();
        let mut registry = TableAliasRegistry::default();
        let mut filter = SqlWhere::new();
        filter
            .add::<Employee>(&mut registry, &config, &col::<Employee>("Id").eq(1), LogicalOp::And)
            .unwrap();
        filter
            .add::<Employee>(&mut registry, &config, &col::<Employee>("Id").eq(2), LogicalOp::Or)
            .unwrap();
        filter.add_raw("t0.[Name] LIKE 'A%'", LogicalOp::And);

        assert_eq!(
            filter.to_string(),
            "(t0.[Id] = 1) OR (t0.[Id] = 2) AND (t0.[Name] LIKE 'A%')"
        );
    }
}
