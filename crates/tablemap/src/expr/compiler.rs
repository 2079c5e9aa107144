//! Expression tree to T-SQL compiler.
//!
//! Nodes are visited post-order: each child pushes its rendered text onto the
//! context stack and the parent pops its operands to render itself. A
//! [`CompileContext`] lives for exactly one [`SqlCompiler::compile`] call.

use crate::alias::TableAliasRegistry;
use crate::error::{MapError, MapResult};
use crate::ident::quote;
use crate::metadata::{Field, TableType, ValueKind};
use crate::value::{EnumMeta, EnumMode, SqlValue};

use super::{BinaryOp, Expr, UnaryOp};

/// Compiles expressions against the aliases of one statement.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'a> {
    registry: &'a TableAliasRegistry,
    params: &'a [TableType],
    enum_mode: EnumMode,
}

/// Per-call traversal state.
#[derive(Debug, Default)]
struct CompileContext {
    stack: Vec<String>,
    /// Enum type and mode of the column on the other side of the comparison
    /// being rendered; consumed by the next rendered constant.
    enum_hint: Option<(&'static EnumMeta, EnumMode)>,
    assignments_as_alias: bool,
}

impl CompileContext {
    fn push(&mut self, sql: String) {
        self.stack.push(sql);
    }

    fn pop(&mut self) -> MapResult<String> {
        self.stack
            .pop()
            .ok_or_else(|| MapError::not_supported("Expression produced no SQL operand"))
    }
}

impl<'a> SqlCompiler<'a> {
    /// `params` lists the lambda parameter types, in declaration order.
    pub fn new(registry: &'a TableAliasRegistry, params: &'a [TableType]) -> Self {
        Self {
            registry,
            params,
            enum_mode: EnumMode::AsInt,
        }
    }

    /// Mode for enum constants that are not compared against an enum column.
    pub fn enum_mode(mut self, mode: EnumMode) -> Self {
        self.enum_mode = mode;
        self
    }

    /// Compile `expr` into one SQL fragment.
    ///
    /// With `treat_assignments_as_alias`, projection members render as
    /// `expr AS [name]`.
    pub fn compile(&self, expr: &Expr, treat_assignments_as_alias: bool) -> MapResult<String> {
        let mut ctx = CompileContext {
            assignments_as_alias: treat_assignments_as_alias,
            ..CompileContext::default()
        };
        self.visit(expr, &mut ctx)?;

        let sql = ctx.pop()?;
        if !ctx.stack.is_empty() {
            return Err(MapError::not_supported(format!(
                "Expression left {} unconsumed operands",
                ctx.stack.len()
            )));
        }
        Ok(sql.trim().to_string())
    }

    fn visit(&self, expr: &Expr, ctx: &mut CompileContext) -> MapResult<()> {
        match expr {
            Expr::Binary { op, left, right } => self.visit_binary(*op, left, right, ctx),
            Expr::Unary { op, operand } => {
                self.visit(operand, ctx)?;
                let inner = ctx.pop()?;
                ctx.push(match op {
                    UnaryOp::Negate => format!("(-{inner})"),
                    UnaryOp::Not => format!("NOT {inner}"),
                    UnaryOp::Convert => inner,
                });
                Ok(())
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                self.visit(test, ctx)?;
                self.visit(if_true, ctx)?;
                self.visit(if_false, ctx)?;
                let otherwise = ctx.pop()?;
                let then = ctx.pop()?;
                let test = ctx.pop()?;
                let test = if test.starts_with('(') {
                    test
                } else {
                    format!("({test})")
                };
                ctx.push(format!("CASE WHEN {test} THEN {then} ELSE {otherwise} END"));
                Ok(())
            }
            Expr::Member { owner, member } => self.visit_member(owner, member, ctx),
            Expr::Static { value, .. } | Expr::Constant(value) => {
                let literal = self.render_constant(value, ctx);
                ctx.push(literal);
                Ok(())
            }
            Expr::Captured(record) => Err(MapError::not_supported(format!(
                "Captured object {record:?} used without a member"
            ))),
            Expr::Parameter(_) => {
                ctx.push(String::new());
                Ok(())
            }
            Expr::New(members) => {
                let mut parts = Vec::with_capacity(members.len());
                for (name, member) in members {
                    self.visit(member, ctx)?;
                    let sql = ctx.pop()?;
                    if sql.is_empty() {
                        continue;
                    }
                    if ctx.assignments_as_alias {
                        parts.push(format!("{sql} AS {}", quote(name)));
                    } else {
                        parts.push(sql);
                    }
                }
                ctx.push(parts.join(","));
                Ok(())
            }
            Expr::Call {
                method,
                target,
                args,
            } => self.visit_call(method, target.as_deref(), args, ctx),
        }
    }

    fn visit_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &mut CompileContext,
    ) -> MapResult<()> {
        let keyword = binary_keyword(op)?;

        let hint = if op.is_comparison() {
            column_enum(left).or_else(|| column_enum(right))
        } else {
            None
        };
        self.visit_operand(left, hint, ctx)?;
        self.visit_operand(right, hint, ctx)?;
        let right = ctx.pop()?;
        let left = ctx.pop()?;

        let keyword = if right == "NULL" {
            if op == BinaryOp::Equal { "IS" } else { "IS NOT" }
        } else {
            keyword
        };
        ctx.push(format!("({left} {keyword} {right})"));
        Ok(())
    }

    fn visit_member(&self, owner: &Expr, member: &str, ctx: &mut CompileContext) -> MapResult<()> {
        match owner {
            Expr::Parameter(table_type) => {
                let alias = self.resolve_alias(table_type)?;
                let column = table_type.column(member)?;
                ctx.push(format!("{alias}.{}", column.quoted()));
                Ok(())
            }
            _ if is_captured_chain(owner) => {
                let value = match evaluate(owner)? {
                    Field::Record(record) => match record.field(member) {
                        Some(Field::Value(v)) => v,
                        Some(Field::Record(_)) => {
                            return Err(MapError::not_supported(format!(
                                "Captured member '{member}' is an object, not a value"
                            )));
                        }
                        None => {
                            return Err(MapError::unknown_member(format!("{record:?}"), member));
                        }
                    },
                    Field::Value(_) => {
                        return Err(MapError::not_supported(format!(
                            "Member '{member}' read from a scalar value"
                        )));
                    }
                };
                let literal = self.render_constant(&value, ctx);
                ctx.push(literal);
                Ok(())
            }
            Expr::Member { .. } => Err(MapError::not_supported(format!(
                "Nested member access '{member}' on a table column"
            ))),
            other => Err(MapError::UnregisteredType(format!(
                "cannot resolve owner of member '{member}': {other:?}"
            ))),
        }
    }

    fn visit_call(
        &self,
        method: &str,
        target: Option<&Expr>,
        args: &[Expr],
        ctx: &mut CompileContext,
    ) -> MapResult<()> {
        match method {
            "Contains" => {
                let (collection, value) = match (target, args) {
                    (Some(collection), [value]) => (collection, value),
                    (None, [collection, value]) => (collection, value),
                    _ => {
                        return Err(MapError::not_supported(
                            "Contains expects a collection and one value",
                        ));
                    }
                };
                let hint = column_enum(value);
                self.visit_operand(value, None, ctx)?;
                self.visit_operand(collection, hint, ctx)?;
                let list = ctx.pop()?;
                let value = ctx.pop()?;
                if list.is_empty() {
                    ctx.push("(1=0)".to_string());
                } else {
                    ctx.push(format!("{value} IN ({list})"));
                }
                Ok(())
            }
            "Count" | "Sum" | "Min" | "Max" | "Avg" => {
                let func = method.to_ascii_uppercase();
                let arg = target.or(args.first());
                match arg {
                    Some(arg) => {
                        self.visit(arg, ctx)?;
                        let inner = ctx.pop()?;
                        ctx.push(format!("{func}({inner})"));
                    }
                    None if method == "Count" => ctx.push("COUNT(*)".to_string()),
                    None => {
                        return Err(MapError::not_supported(format!(
                            "{method} requires an argument"
                        )));
                    }
                }
                Ok(())
            }
            _ => {
                let depth = ctx.stack.len();
                if let Some(target) = target {
                    self.visit(target, ctx)?;
                }
                for arg in args {
                    self.visit(arg, ctx)?;
                }
                if ctx.stack.len() != depth + 1 {
                    return Err(MapError::not_supported(format!("Method call '{method}'")));
                }
                Ok(())
            }
        }
    }

    /// Alias of a lambda parameter type. An unregistered type falls back to a
    /// registered parameter type mapped onto the same table.
    fn resolve_alias(&self, table_type: &TableType) -> MapResult<String> {
        if let Some(alias) = self.registry.alias_or_qualified_name(table_type.id()) {
            return Ok(alias);
        }
        let metadata = table_type.metadata();
        self.params
            .iter()
            .filter(|p| p.metadata().same_table(metadata))
            .find_map(|p| self.registry.alias_or_qualified_name(p.id()))
            .ok_or_else(|| MapError::UnregisteredType(table_type.type_name().to_string()))
    }

    /// Visit one operand of a comparison. `hint` reaches the operand only
    /// when it is a value, never a column or a nested expression.
    fn visit_operand(
        &self,
        operand: &Expr,
        hint: Option<(&'static EnumMeta, EnumMode)>,
        ctx: &mut CompileContext,
    ) -> MapResult<()> {
        ctx.enum_hint = if is_value(operand) { hint } else { None };
        let result = self.visit(operand, ctx);
        ctx.enum_hint = None;
        result
    }

    fn render_constant(&self, value: &SqlValue, ctx: &mut CompileContext) -> String {
        match ctx.enum_hint.take() {
            Some((meta, mode)) => value.to_sql_literal_as_enum(meta, mode),
            None => value.to_sql_literal_with(self.enum_mode),
        }
    }
}

fn binary_keyword(op: BinaryOp) -> MapResult<&'static str> {
    Ok(match op {
        BinaryOp::And => "AND",
        BinaryOp::Or => "OR",
        BinaryOp::Equal => "=",
        BinaryOp::NotEqual => "<>",
        BinaryOp::GreaterThan => ">",
        BinaryOp::GreaterThanOrEqual => ">=",
        BinaryOp::LessThan => "<",
        BinaryOp::LessThanOrEqual => "<=",
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Modulo => "%",
        BinaryOp::Coalesce
        | BinaryOp::Power
        | BinaryOp::ExclusiveOr
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => {
            return Err(MapError::not_supported(format!("Binary operator {op:?}")));
        }
    })
}

/// Enum type of a direct enum column reference such as `x.Status`.
fn column_enum(expr: &Expr) -> Option<(&'static EnumMeta, EnumMode)> {
    match expr {
        Expr::Member { owner, member } => match owner.as_ref() {
            Expr::Parameter(table_type) => match table_type.column(member).ok()?.kind {
                ValueKind::Enum { meta, mode } => Some((meta, mode)),
                _ => None,
            },
            _ => None,
        },
        Expr::Unary {
            op: UnaryOp::Convert,
            operand,
        } => column_enum(operand),
        _ => None,
    }
}

/// Constants, static fields and captured values, possibly converted.
fn is_value(expr: &Expr) -> bool {
    match expr {
        Expr::Constant(_) | Expr::Static { .. } => true,
        Expr::Member { .. } => is_captured_chain(expr),
        Expr::Unary {
            op: UnaryOp::Convert,
            operand,
        } => is_value(operand),
        _ => false,
    }
}

fn is_captured_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Captured(_) => true,
        Expr::Member { owner, .. } => is_captured_chain(owner),
        _ => false,
    }
}

/// Walk a captured member chain down to a field.
fn evaluate(expr: &Expr) -> MapResult<Field> {
    match expr {
        Expr::Captured(record) => Ok(Field::Record(record.clone())),
        Expr::Member { owner, member } => match evaluate(owner)? {
            Field::Record(record) => record
                .field(member)
                .ok_or_else(|| MapError::unknown_member(format!("{record:?}"), member.as_str())),
            Field::Value(_) => Err(MapError::not_supported(format!(
                "Member '{member}' read from a scalar value"
            ))),
        },
        other => Err(MapError::not_supported(format!(
            "Cannot evaluate {other:?} at build time"
        ))),
    }
}
