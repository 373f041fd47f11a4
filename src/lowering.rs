//! Lowers the target expression tree onto sea-query so a downstream query
//! builder can render it for a concrete backend.

use crate::expr::{ComparisonKind, DbExpression, Literal};
use crate::types::ScalarKind;
use sea_query::{Alias, Asterisk, Expr, Iden, PostgresQueryBuilder, Query, SimpleExpr, Value};

/// Row variable identifier for sea-query
#[derive(Debug, Clone)]
pub struct RowVariable(pub String);

impl Iden for RowVariable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

/// Converts a translated predicate into a sea-query expression. Parameters
/// become `@name` placeholders; literals become bound values.
pub fn to_simple_expr(expr: &DbExpression) -> SimpleExpr {
    match expr {
        DbExpression::Comparison { kind, left, right } => {
            let left = Expr::expr(to_simple_expr(left));
            let right = to_simple_expr(right);
            match kind {
                ComparisonKind::Equals => left.eq(right),
                ComparisonKind::NotEquals => left.ne(right),
                ComparisonKind::GreaterThan => left.gt(right),
                ComparisonKind::GreaterThanOrEquals => left.gte(right),
                ComparisonKind::LessThan => left.lt(right),
                ComparisonKind::LessThanOrEquals => left.lte(right),
            }
        }
        DbExpression::And(left, right) => to_simple_expr(left).and(to_simple_expr(right)),
        DbExpression::Or(left, right) => to_simple_expr(left).or(to_simple_expr(right)),
        DbExpression::Not(operand) => to_simple_expr(operand).not(),
        DbExpression::Cast { operand, ty } => Expr::expr(to_simple_expr(operand))
            .cast_as(Alias::new(store_type_name(ty.primitive.equivalent))),
        DbExpression::Constant(literal) => SimpleExpr::Value(literal_to_value(literal)),
        DbExpression::Property { variable, column } => Expr::col((
            RowVariable(variable.name.clone()),
            ColumnName(column.clone()),
        ))
        .into(),
        DbExpression::Parameter { name, .. } => Expr::cust(format!("@{}", name)),
        DbExpression::In { item, list } => {
            Expr::expr(to_simple_expr(item)).is_in(list.iter().map(|value| to_simple_expr(value)))
        }
    }
}

/// `SELECT * FROM <table> AS <row_variable> WHERE <expr>` rendered with the
/// PostgreSQL builder. `row_variable` must be the binding the expression was
/// translated against.
pub fn preview_select(expr: &DbExpression, table: &str, row_variable: &str) -> String {
    Query::select()
        .column(Asterisk)
        .from_as(Alias::new(table), Alias::new(row_variable))
        .and_where(to_simple_expr(expr))
        .to_string(PostgresQueryBuilder)
}

fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Boolean(v) => Value::Bool(*v),
        Literal::Byte(v) => Value::TinyUnsigned(*v),
        Literal::Int16(v) => Value::SmallInt(*v),
        Literal::Int32(v) => Value::Int(*v),
        Literal::Int64(v) => Value::BigInt(*v),
        Literal::Single(v) => Value::Float(*v),
        Literal::Double(v) => Value::Double(*v),
        Literal::Decimal(v) => Value::BigDecimal(v.clone().map(Box::new)),
        Literal::DateTime(v) => Value::ChronoDateTime(v.map(Box::new)),
        Literal::DateTimeOffset(v) => Value::ChronoDateTimeWithTimeZone(v.map(Box::new)),
        Literal::Guid(v) => Value::Uuid(v.map(Box::new)),
        Literal::Binary(v) => Value::Bytes(v.clone().map(Box::new)),
        Literal::String(v) => Value::String(v.clone().map(Box::new)),
    }
}

/// PostgreSQL column type used when casting to a primitive of `kind`.
fn store_type_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "boolean",
        ScalarKind::Byte | ScalarKind::SByte | ScalarKind::Int16 => "smallint",
        ScalarKind::UInt16 | ScalarKind::Int32 => "integer",
        ScalarKind::UInt32 | ScalarKind::Int64 => "bigint",
        ScalarKind::UInt64 | ScalarKind::Decimal => "numeric",
        ScalarKind::Single => "real",
        ScalarKind::Double => "double precision",
        ScalarKind::Char => "char",
        ScalarKind::DateTime => "timestamp",
        ScalarKind::DateTimeOffset => "timestamptz",
        ScalarKind::Guid => "uuid",
        ScalarKind::Binary => "bytea",
        ScalarKind::String => "text",
    }
}
