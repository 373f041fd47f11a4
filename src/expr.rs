//! Target expression algebra handed to the downstream query compiler.
//!
//! Nodes are immutable and shared through [`DbExpr`]; a property or parameter
//! used in several places is the same allocation everywhere it appears.

use crate::type_mapping::TypeUsage;
use crate::types::{Scalar, ScalarKind};
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type DbExpr = Arc<DbExpression>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonKind {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
}

impl ComparisonKind {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonKind::Equals => "=",
            ComparisonKind::NotEquals => "<>",
            ComparisonKind::GreaterThan => ">",
            ComparisonKind::GreaterThanOrEquals => ">=",
            ComparisonKind::LessThan => "<",
            ComparisonKind::LessThanOrEquals => "<=",
        }
    }
}

/// Typed literal. Every constructor accepts an absent value, which is the
/// null of that type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Boolean(Option<bool>),
    Byte(Option<u8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Single(Option<f32>),
    Double(Option<f64>),
    Decimal(Option<BigDecimal>),
    DateTime(Option<NaiveDateTime>),
    DateTimeOffset(Option<DateTime<FixedOffset>>),
    Guid(Option<Uuid>),
    Binary(Option<Vec<u8>>),
    String(Option<String>),
}

impl Literal {
    /// The literal constructor for `kind`, fed with `value`. Returns `None`
    /// when `kind` has no literal constructor or `value` is of another kind.
    pub fn from_scalar(kind: ScalarKind, value: Option<&Scalar>) -> Option<Literal> {
        macro_rules! typed {
            ($variant:ident) => {
                match value {
                    None => Some(Literal::$variant(None)),
                    Some(Scalar::$variant(v)) => Some(Literal::$variant(Some(v.clone()))),
                    Some(_) => None,
                }
            };
        }

        match kind {
            ScalarKind::Boolean => typed!(Boolean),
            ScalarKind::Byte => typed!(Byte),
            ScalarKind::Int16 => typed!(Int16),
            ScalarKind::Int32 => typed!(Int32),
            ScalarKind::Int64 => typed!(Int64),
            ScalarKind::Single => typed!(Single),
            ScalarKind::Double => typed!(Double),
            ScalarKind::Decimal => typed!(Decimal),
            ScalarKind::DateTime => typed!(DateTime),
            ScalarKind::DateTimeOffset => typed!(DateTimeOffset),
            ScalarKind::Guid => typed!(Guid),
            ScalarKind::Binary => typed!(Binary),
            ScalarKind::String => typed!(String),
            ScalarKind::SByte
            | ScalarKind::UInt16
            | ScalarKind::UInt32
            | ScalarKind::UInt64
            | ScalarKind::Char => None,
        }
    }

    /// Reads the value back as a source scalar; `None` for a null literal.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Literal::Boolean(v) => v.map(Scalar::Boolean),
            Literal::Byte(v) => v.map(Scalar::Byte),
            Literal::Int16(v) => v.map(Scalar::Int16),
            Literal::Int32(v) => v.map(Scalar::Int32),
            Literal::Int64(v) => v.map(Scalar::Int64),
            Literal::Single(v) => v.map(Scalar::Single),
            Literal::Double(v) => v.map(Scalar::Double),
            Literal::Decimal(v) => v.clone().map(Scalar::Decimal),
            Literal::DateTime(v) => v.map(Scalar::DateTime),
            Literal::DateTimeOffset(v) => v.map(Scalar::DateTimeOffset),
            Literal::Guid(v) => v.map(Scalar::Guid),
            Literal::Binary(v) => v.clone().map(Scalar::Binary),
            Literal::String(v) => v.clone().map(Scalar::String),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Literal::Boolean(_) => ScalarKind::Boolean,
            Literal::Byte(_) => ScalarKind::Byte,
            Literal::Int16(_) => ScalarKind::Int16,
            Literal::Int32(_) => ScalarKind::Int32,
            Literal::Int64(_) => ScalarKind::Int64,
            Literal::Single(_) => ScalarKind::Single,
            Literal::Double(_) => ScalarKind::Double,
            Literal::Decimal(_) => ScalarKind::Decimal,
            Literal::DateTime(_) => ScalarKind::DateTime,
            Literal::DateTimeOffset(_) => ScalarKind::DateTimeOffset,
            Literal::Guid(_) => ScalarKind::Guid,
            Literal::Binary(_) => ScalarKind::Binary,
            Literal::String(_) => ScalarKind::String,
        }
    }

    pub fn is_null(&self) -> bool {
        self.to_scalar().is_none()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_scalar() {
            None => write!(f, "null"),
            Some(Scalar::String(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Some(Scalar::Guid(g)) => write!(f, "'{}'", g),
            Some(Scalar::DateTime(d)) => write!(f, "'{}'", d),
            Some(Scalar::DateTimeOffset(d)) => write!(f, "'{}'", d.to_rfc3339()),
            Some(other) => write!(f, "{}", other),
        }
    }
}

/// The row variable a property reference is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DbExpression {
    Comparison {
        kind: ComparisonKind,
        left: DbExpr,
        right: DbExpr,
    },
    And(DbExpr, DbExpr),
    Or(DbExpr, DbExpr),
    Not(DbExpr),
    Cast {
        operand: DbExpr,
        ty: TypeUsage,
    },
    Constant(Literal),
    Property {
        variable: Arc<Variable>,
        column: String,
    },
    Parameter {
        name: String,
        ty: TypeUsage,
    },
    In {
        item: DbExpr,
        list: Vec<DbExpr>,
    },
}

impl DbExpression {
    pub fn comparison(kind: ComparisonKind, left: DbExpr, right: DbExpr) -> DbExpr {
        Arc::new(DbExpression::Comparison { kind, left, right })
    }

    pub fn equal(left: DbExpr, right: DbExpr) -> DbExpr {
        Self::comparison(ComparisonKind::Equals, left, right)
    }

    pub fn and(left: DbExpr, right: DbExpr) -> DbExpr {
        Arc::new(DbExpression::And(left, right))
    }

    pub fn or(left: DbExpr, right: DbExpr) -> DbExpr {
        Arc::new(DbExpression::Or(left, right))
    }

    pub fn not(operand: DbExpr) -> DbExpr {
        Arc::new(DbExpression::Not(operand))
    }

    pub fn cast(operand: DbExpr, ty: TypeUsage) -> DbExpr {
        Arc::new(DbExpression::Cast { operand, ty })
    }

    pub fn constant(literal: Literal) -> DbExpr {
        Arc::new(DbExpression::Constant(literal))
    }

    pub fn property(variable: Arc<Variable>, column: impl Into<String>) -> DbExpr {
        Arc::new(DbExpression::Property {
            variable,
            column: column.into(),
        })
    }

    pub fn parameter(name: impl Into<String>, ty: TypeUsage) -> DbExpr {
        Arc::new(DbExpression::Parameter {
            name: name.into(),
            ty,
        })
    }

    /// `item IN (list)`. An empty list can never match and becomes `false`.
    pub fn in_list(item: DbExpr, list: Vec<DbExpr>) -> DbExpr {
        if list.is_empty() {
            return Self::constant(Literal::Boolean(Some(false)));
        }
        Arc::new(DbExpression::In { item, list })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DbExpression::Comparison { .. } => "comparison",
            DbExpression::And(..) => "and",
            DbExpression::Or(..) => "or",
            DbExpression::Not(_) => "not",
            DbExpression::Cast { .. } => "cast",
            DbExpression::Constant(_) => "constant",
            DbExpression::Property { .. } => "property",
            DbExpression::Parameter { .. } => "parameter",
            DbExpression::In { .. } => "in",
        }
    }
}

impl fmt::Display for DbExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbExpression::Comparison { kind, left, right } => {
                write!(f, "({} {} {})", left, kind.symbol(), right)
            }
            DbExpression::And(left, right) => write!(f, "({} AND {})", left, right),
            DbExpression::Or(left, right) => write!(f, "({} OR {})", left, right),
            DbExpression::Not(operand) => write!(f, "NOT {}", operand),
            DbExpression::Cast { operand, ty } => write!(f, "CAST({} AS {})", operand, ty),
            DbExpression::Constant(literal) => write!(f, "{}", literal),
            DbExpression::Property { variable, column } => {
                write!(f, "{}.{}", variable.name, column)
            }
            DbExpression::Parameter { name, .. } => write!(f, "@{}", name),
            DbExpression::In { item, list } => {
                write!(f, "({} IN (", item)?;
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "))")
            }
        }
    }
}
