//! Expression trees compiled to T-SQL.
//!
//! An [`Expr`] is the typed stand-in for a lambda body: column references are
//! member accesses on a lambda parameter (a mapped type), values are
//! constants or members of captured records, and operators build the tree.
//!
//! ```
//! # use tablemap::{ColumnMetadata, Field, Mapped, Record, TableMetadata};
//! # #[derive(Debug)] struct Employee;
//! # static COLUMNS: [ColumnMetadata; 2] = [ColumnMetadata::new("Id", "Id"), ColumnMetadata::new("Name", "Name")];
//! # static EMPLOYEE: TableMetadata = TableMetadata::new("Employee").members(&COLUMNS);
//! # impl Record for Employee { fn field(&self, _: &str) -> Option<Field> { None } }
//! # impl Mapped for Employee { fn metadata() -> &'static TableMetadata { &EMPLOYEE } }
//! use tablemap::expr::{col, lit};
//!
//! // x => x.Id >= 10 && x.Name != null
//! let filter = col::<Employee>("Id").ge(10) & col::<Employee>("Name").is_not_null();
//! # let _ = filter;
//! ```

pub mod compiler;


use std::ops;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::metadata::{Mapped, Record, TableType};
use crate::value::{EnumValue, SqlEnum, SqlValue};

pub use compiler::SqlCompiler;

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Coalesce,
    Power,
    ExclusiveOr,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
        )
    }
}

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    /// Type conversion; renders its operand unchanged.
    Convert,
}

/// Expression tree node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A lambda parameter (`x` in `x => ...`).
    Parameter(TableType),
    /// `owner.member`
    Member { owner: Box<Expr>, member: String },
    /// A captured runtime object, root of a constant member chain.
    Captured(Arc<dyn Record>),
    /// A static field read at build time.
    Static {
        owner: &'static str,
        member: &'static str,
        value: SqlValue,
    },
    Constant(SqlValue),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `test ? if_true : if_false`
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// Object initializer used for projections: `new { a = x.A, x.B }`.
    New(Vec<(String, Expr)>),
    /// Method call: `target.method(args)` or static `method(args)`.
    Call {
        method: String,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
}

/// Column reference: `x.member` where `x: T`.
pub fn col<T: Mapped>(member: &str) -> Expr {
    Expr::param::<T>().member(member)
}

/// Constant value.
pub fn lit(value: impl Into<SqlValue>) -> Expr {
    Expr::Constant(value.into())
}

impl Expr {
    /// The lambda parameter of type `T`; as a selector this is the identity.
    pub fn param<T: Mapped>() -> Self {
        Expr::Parameter(TableType::of::<T>())
    }

    /// Member access on this expression.
    pub fn member(self, member: impl Into<String>) -> Self {
        Expr::Member {
            owner: Box::new(self),
            member: member.into(),
        }
    }

    /// A captured local; chain `.member(..)` to read its fields.
    pub fn captured(record: impl Record + 'static) -> Self {
        Expr::Captured(Arc::new(record))
    }

    pub fn captured_arc(record: Arc<dyn Record>) -> Self {
        Expr::Captured(record)
    }

    pub fn static_field(owner: &'static str, member: &'static str, value: impl Into<SqlValue>) -> Self {
        Expr::Static {
            owner,
            member,
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Expr::Constant(SqlValue::Null)
    }

    pub fn enum_const<E: SqlEnum>(value: E) -> Self {
        Expr::Constant(value.to_sql_value())
    }

    fn binary(self, op: BinaryOp, right: impl IntoExpr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into_expr()),
        }
    }

    pub fn eq(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Equal, right)
    }

    pub fn ne(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::NotEqual, right)
    }

    pub fn gt(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::GreaterThan, right)
    }

    pub fn ge(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::GreaterThanOrEqual, right)
    }

    pub fn lt(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::LessThan, right)
    }

    pub fn le(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::LessThanOrEqual, right)
    }

    pub fn and(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    pub fn coalesce(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Coalesce, right)
    }

    pub fn is_null(self) -> Self {
        self.eq(Expr::null())
    }

    pub fn is_not_null(self) -> Self {
        self.ne(Expr::null())
    }

    pub fn convert(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Convert,
            operand: Box::new(self),
        }
    }

    /// `collection.Contains(self)`, i.e. `self IN (...)`.
    pub fn is_in(self, collection: impl IntoExpr) -> Self {
        Expr::Call {
            method: "Contains".to_string(),
            target: Some(Box::new(collection.into_expr())),
            args: vec![self],
        }
    }

    /// Static form: `Contains(collection, value)`.
    pub fn contains(collection: impl IntoExpr, value: impl IntoExpr) -> Self {
        Expr::Call {
            method: "Contains".to_string(),
            target: None,
            args: vec![collection.into_expr(), value.into_expr()],
        }
    }

    pub fn call(method: impl Into<String>, target: Option<Expr>, args: Vec<Expr>) -> Self {
        Expr::Call {
            method: method.into(),
            target: target.map(Box::new),
            args,
        }
    }

    /// `CASE WHEN test THEN if_true ELSE if_false END`
    pub fn case(test: Expr, if_true: impl IntoExpr, if_false: impl IntoExpr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true.into_expr()),
            if_false: Box::new(if_false.into_expr()),
        }
    }

    /// Projection with explicit member names.
    pub fn project<S: Into<String>>(members: impl IntoIterator<Item = (S, Expr)>) -> Self {
        Expr::New(
            members
                .into_iter()
                .map(|(name, e)| (name.into(), e))
                .collect(),
        )
    }

    /// Projection of members of `T`, each named after its member
    /// (`x => new { x.Id, x.Name }`).
    pub fn project_members<T: Mapped>(members: &[&str]) -> Self {
        Expr::New(
            members
                .iter()
                .map(|m| (m.to_string(), col::<T>(m)))
                .collect(),
        )
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Expr::call("Count", None, Vec::new())
    }

    pub fn count(self) -> Self {
        Expr::call("Count", Some(self), Vec::new())
    }

    pub fn sum(self) -> Self {
        Expr::call("Sum", Some(self), Vec::new())
    }

    pub fn min(self) -> Self {
        Expr::call("Min", Some(self), Vec::new())
    }

    pub fn max(self) -> Self {
        Expr::call("Max", Some(self), Vec::new())
    }

    pub fn avg(self) -> Self {
        Expr::call("Avg", Some(self), Vec::new())
    }
}

/// Conversion into an expression operand.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for SqlValue {
    fn into_expr(self) -> Expr {
        Expr::Constant(self)
    }
}

macro_rules! impl_into_expr {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoExpr for $t {
                fn into_expr(self) -> Expr {
                    Expr::Constant(SqlValue::from(self))
                }
            }
        )*
    };
}

impl_into_expr!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    Uuid,
    NaiveDateTime,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    NaiveDate,
    NaiveTime,
    serde_json::Value,
    EnumValue,
);

#[cfg(feature = "rust_decimal")]
impl_into_expr!(rust_decimal::Decimal);

impl<T: Into<SqlValue>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Constant(SqlValue::from(self))
    }
}

impl<T: Into<SqlValue>> IntoExpr for Vec<T> {
    fn into_expr(self) -> Expr {
        Expr::Constant(SqlValue::list(self))
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

macro_rules! impl_binary_op {
    ($($trait:ident :: $method:ident => $op:expr),* $(,)?) => {
        $(
            impl<R: IntoExpr> ops::$trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    self.binary($op, rhs)
                }
            }
        )*
    };
}

impl_binary_op!(
    BitAnd::bitand => BinaryOp::And,
    BitOr::bitor => BinaryOp::Or,
    BitXor::bitxor => BinaryOp::ExclusiveOr,
    Add::add => BinaryOp::Add,
    Sub::sub => BinaryOp::Subtract,
    Mul::mul => BinaryOp::Multiply,
    Div::div => BinaryOp::Divide,
    Rem::rem => BinaryOp::Modulo,
    Shl::shl => BinaryOp::LeftShift,
    Shr::shr => BinaryOp::RightShift,
);
