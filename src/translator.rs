//! Predicate to target expression translation.
//!
//! The walk is post-order: a node's children are translated and recorded in
//! the translation map before the node itself is built from them. Every node
//! is translated at most once, so a node referenced from several parents
//! yields one shared target node.

mod membership;

use crate::ast::{BinaryOp, Constant, Node, NodeId, Predicate, UnaryOp};
use crate::binder::{ParameterBinder, ParameterNaming, ParameterTable};
use crate::catalog::SchemaCatalog;
use crate::error::{Result, TranslateError};
use crate::expr::{ComparisonKind, DbExpr, DbExpression, Literal};
use crate::fields::{BindingContext, FieldResolver, ResolvedField};
use crate::type_mapping::type_usage_for;
use crate::types::{ScalarKind, SourceType};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Result of a translation run.
#[derive(Debug, Clone)]
pub struct Translation {
    pub expression: DbExpr,
    pub parameters: ParameterTable,
    /// Declared field name to the property reference minted for it.
    pub fields: HashMap<String, ResolvedField>,
}

/// Translates `predicate` against the row variable of `binding`.
pub fn translate(
    predicate: &Predicate,
    binding: &BindingContext,
    catalog: &dyn SchemaCatalog,
    naming: &dyn ParameterNaming,
) -> Result<Translation> {
    Translator::new(binding, catalog, naming).run(predicate)
}

/// State of one translation run. Consumed by [`Translator::run`].
pub struct Translator<'a> {
    catalog: &'a dyn SchemaCatalog,
    fields: FieldResolver<'a>,
    parameters: ParameterBinder<'a>,
    translated: Vec<Option<DbExpr>>,
}

impl<'a> Translator<'a> {
    pub fn new(
        binding: &'a BindingContext,
        catalog: &'a dyn SchemaCatalog,
        naming: &'a dyn ParameterNaming,
    ) -> Self {
        Self {
            catalog,
            fields: FieldResolver::new(binding),
            parameters: ParameterBinder::new(naming),
            translated: Vec::new(),
        }
    }

    pub fn run(mut self, predicate: &Predicate) -> Result<Translation> {
        if let Some(id) = predicate.first_dangling_reference() {
            return Err(TranslateError::MissingTranslation(id));
        }
        self.translated = vec![None; predicate.len()];

        let body = predicate.body();
        self.visit(predicate, body)?;
        let expression = self.translation_of(predicate, body)?;
        debug!("Translated predicate: {}", expression);

        Ok(Translation {
            expression,
            parameters: self.parameters.into_table(),
            fields: self.fields.into_fields(),
        })
    }

    /// Translates `id` and its subtree, recording the result in the map.
    /// Inert nodes (the row parameter) record nothing.
    fn visit(&mut self, predicate: &Predicate, id: NodeId) -> Result<()> {
        if self.translated[id.0].is_some() {
            return Ok(());
        }

        let node = predicate.node(id);
        trace!("Visit {}: {}", node.kind_name(), id);

        let expression = match node {
            Node::Binary { op, left, right } => {
                let (left, right) = if op.is_comparison() {
                    (
                        self.comparison_operand(predicate, *left, *right)?,
                        self.comparison_operand(predicate, *right, *left)?,
                    )
                } else {
                    self.visit(predicate, *left)?;
                    self.visit(predicate, *right)?;
                    (
                        self.translation_of(predicate, *left)?,
                        self.translation_of(predicate, *right)?,
                    )
                };
                Self::translate_binary(*op, left, right)?
            }
            Node::Unary { op, operand, ty } => {
                self.visit(predicate, *operand)?;
                let operand = self.translation_of(predicate, *operand)?;
                match op {
                    UnaryOp::Not => DbExpression::not(operand),
                    UnaryOp::Convert => {
                        DbExpression::cast(operand, type_usage_for(self.catalog, ty)?)
                    }
                    UnaryOp::Negate => {
                        return Err(TranslateError::unsupported(
                            "Unhandled unary operator Negate",
                        ))
                    }
                }
            }
            Node::Conditional { .. } => {
                return Err(TranslateError::unsupported(
                    "Conditionals in predicates are not supported",
                ))
            }
            Node::Constant(constant) => Self::translate_constant(constant)?,
            Node::Member {
                target,
                member,
                via_nullable,
            } => self.translate_member(predicate, *target, member, *via_nullable)?,
            Node::Parameter { name, ty } => {
                if ty.is_row_type() {
                    // the row itself, not a scalar
                    return Ok(());
                }
                if ty.is_collection() {
                    return Err(TranslateError::unsupported(format!(
                        "Collection parameter {} can only be used as the receiver of Contains",
                        name
                    )));
                }
                self.parameters.bind(self.catalog, name, ty)?
            }
            Node::MethodCall {
                method,
                receiver,
                arguments,
            } => {
                if method != "Contains" {
                    return Err(TranslateError::unsupported(format!(
                        "Unhandled method {}",
                        method
                    )));
                }
                self.translate_contains(predicate, *receiver, arguments)?
            }
            Node::ListInit { .. } => {
                return Err(TranslateError::unsupported(
                    "List initializers are only supported as the receiver of Contains",
                ))
            }
        };

        self.translated[id.0] = Some(expression);
        Ok(())
    }

    /// One side of a comparison. A bare `null` takes the type of the other side.
    fn comparison_operand(
        &mut self,
        predicate: &Predicate,
        id: NodeId,
        other: NodeId,
    ) -> Result<DbExpr> {
        let untyped_null = matches!(predicate.node(id), Node::Constant(c) if c.is_untyped_null());
        if !untyped_null {
            self.visit(predicate, id)?;
            return self.translation_of(predicate, id);
        }

        self.visit(predicate, other)?;
        let other = self.translation_of(predicate, other)?;
        self.kind_of(&other)
            .and_then(|kind| Literal::from_scalar(kind, None))
            .map(DbExpression::constant)
            .ok_or_else(|| {
                TranslateError::unsupported(format!(
                    "Cannot infer the type of null compared with {}",
                    other
                ))
            })
    }

    /// Primitive family of a translated expression, where it has one.
    fn kind_of(&self, expression: &DbExpr) -> Option<ScalarKind> {
        match expression.as_ref() {
            DbExpression::Property { .. } => self.fields.storage_of(expression).map(|s| s.family),
            DbExpression::Parameter { ty, .. } | DbExpression::Cast { ty, .. } => {
                Some(ty.primitive.equivalent)
            }
            DbExpression::Constant(literal) if !literal.is_null() => Some(literal.kind()),
            DbExpression::Constant(_) => None,
            DbExpression::Comparison { .. }
            | DbExpression::And(..)
            | DbExpression::Or(..)
            | DbExpression::Not(_)
            | DbExpression::In { .. } => Some(ScalarKind::Boolean),
        }
    }

    /// The recorded translation of an already visited node.
    fn translation_of(&self, predicate: &Predicate, id: NodeId) -> Result<DbExpr> {
        if let Some(expression) = &self.translated[id.0] {
            return Ok(expression.clone());
        }
        match predicate.node(id) {
            Node::Parameter { name, ty } if ty.is_row_type() => Err(TranslateError::unsupported(
                format!("Row parameter {} cannot be used as a value", name),
            )),
            _ => Err(TranslateError::MissingTranslation(id)),
        }
    }

    fn translate_binary(op: BinaryOp, left: DbExpr, right: DbExpr) -> Result<DbExpr> {
        let kind = match op {
            BinaryOp::Equal => ComparisonKind::Equals,
            BinaryOp::NotEqual => ComparisonKind::NotEquals,
            BinaryOp::GreaterThan => ComparisonKind::GreaterThan,
            BinaryOp::GreaterThanOrEqual => ComparisonKind::GreaterThanOrEquals,
            BinaryOp::LessThan => ComparisonKind::LessThan,
            BinaryOp::LessThanOrEqual => ComparisonKind::LessThanOrEquals,
            BinaryOp::AndAlso => return Ok(DbExpression::and(left, right)),
            BinaryOp::OrElse => return Ok(DbExpression::or(left, right)),
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo => {
                return Err(TranslateError::unsupported(format!(
                    "Unhandled binary operator {:?}",
                    op
                )))
            }
        };
        Ok(DbExpression::comparison(kind, left, right))
    }

    fn translate_constant(constant: &Constant) -> Result<DbExpr> {
        let (kind, accepts_null) = match &constant.ty {
            SourceType::Scalar(kind) => (*kind, kind.is_reference_like()),
            SourceType::Nullable(inner) => match inner.as_ref() {
                SourceType::Scalar(kind) => (*kind, true),
                other => {
                    return Err(TranslateError::unsupported(format!(
                        "Unhandled type {}? for constant",
                        other
                    )))
                }
            },
            other => {
                return Err(TranslateError::unsupported(format!(
                    "Unhandled type {} for constant",
                    other
                )))
            }
        };

        let Some(value) = &constant.value else {
            if !accepts_null {
                return Err(TranslateError::unsupported(format!(
                    "Null constant of non-nullable type {}",
                    constant.ty
                )));
            }
            return Literal::from_scalar(kind, None)
                .map(DbExpression::constant)
                .ok_or_else(|| {
                    TranslateError::unsupported(format!(
                        "Unhandled type {} for constant value null",
                        constant.ty
                    ))
                });
        };

        Literal::from_scalar(kind, Some(value))
            .map(DbExpression::constant)
            .ok_or_else(|| {
                TranslateError::unsupported(format!(
                    "Unhandled type {} for constant value {}",
                    constant.ty, value
                ))
            })
    }

    fn translate_member(
        &mut self,
        predicate: &Predicate,
        target: NodeId,
        member: &str,
        via_nullable: bool,
    ) -> Result<DbExpr> {
        let field = match predicate.node(target) {
            // `e.Total.Value` reads the field named by `e.Total`
            Node::Member { member: inner, .. } if via_nullable => {
                self.visit(predicate, target)?;
                inner.as_str()
            }
            _ if via_nullable => {
                return Err(TranslateError::unsupported(format!(
                    "Nullable accessor {} must be applied to a field",
                    member
                )))
            }
            Node::Parameter { ty, .. } if ty.is_row_type() => member,
            Node::Member { .. } => {
                // navigation through another field; resolving it reports the
                // missing mapping
                self.visit(predicate, target)?;
                member
            }
            other => {
                return Err(TranslateError::unsupported(format!(
                    "Member {} accessed on a {}",
                    member,
                    other.kind_name()
                )))
            }
        };

        self.fields.resolve(self.catalog, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PredicateBuilder;
    use crate::binder::FilterScopedNaming;
    use crate::catalog::{EntityType, InMemoryCatalog};
    use crate::types::{Scalar, ScalarKind};
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, NaiveDate};
    use std::str::FromStr;
    use std::sync::Arc;
    use uuid::Uuid;

    fn create_test_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .field("Order", "Id", "order_id", ScalarKind::Int32)
            .field("Order", "Status", "status", ScalarKind::String)
            .field("Order", "TenantId", "tenant_id", ScalarKind::Int32)
            .nullable_field("Order", "Total", "total_amount", ScalarKind::Decimal)
            .field("Order", "IsDeleted", "is_deleted", ScalarKind::Boolean)
    }

    fn run(predicate: &Predicate) -> Result<Translation> {
        let catalog = create_test_catalog();
        let binding = BindingContext::new("Extent1", EntityType::new("Order"));
        let naming = FilterScopedNaming::new("Test");
        translate(predicate, &binding, &catalog, &naming)
    }

    fn order(b: &mut PredicateBuilder) -> NodeId {
        b.parameter("e", SourceType::entity("Order"))
    }

    #[test]
    fn test_constant_round_trip() {
        let values = vec![
            Scalar::Boolean(true),
            Scalar::Byte(200),
            Scalar::Int16(-3),
            Scalar::Int32(42),
            Scalar::Int64(1 << 40),
            Scalar::Single(1.5),
            Scalar::Double(-2.25),
            Scalar::Decimal(BigDecimal::from_str("19.99").unwrap()),
            Scalar::DateTime(
                NaiveDate::from_ymd_opt(2024, 2, 29)
                    .unwrap()
                    .and_hms_opt(13, 30, 0)
                    .unwrap(),
            ),
            Scalar::DateTimeOffset(DateTime::parse_from_rfc3339("2024-02-29T13:30:00+02:00").unwrap()),
            Scalar::Guid(Uuid::parse_str("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap()),
            Scalar::Binary(vec![1, 2, 3]),
            Scalar::String("Open".to_string()),
        ];

        for value in values {
            let mut b = PredicateBuilder::new();
            let c = b.constant(value.clone());
            let result = run(&b.finish(c)).unwrap();

            match result.expression.as_ref() {
                DbExpression::Constant(literal) => {
                    assert_eq!(literal.kind(), value.kind());
                    assert_eq!(literal.to_scalar(), Some(value));
                }
                other => panic!("Expected constant, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_null_constants() {
        for kind in [ScalarKind::Int32, ScalarKind::Guid, ScalarKind::DateTime] {
            let mut b = PredicateBuilder::new();
            let c = b.typed_constant(SourceType::nullable(kind), None);
            let result = run(&b.finish(c)).unwrap();

            match result.expression.as_ref() {
                DbExpression::Constant(literal) => {
                    assert_eq!(literal.kind(), kind);
                    assert!(literal.is_null());
                }
                other => panic!("Expected constant, got {:?}", other),
            }
        }

        let mut b = PredicateBuilder::new();
        let c = b.typed_constant(SourceType::scalar(ScalarKind::String), None);
        assert_eq!(
            *run(&b.finish(c)).unwrap().expression,
            DbExpression::Constant(Literal::String(None))
        );
    }

    #[test]
    fn test_unsupported_constants() {
        let cases = vec![
            (SourceType::scalar(ScalarKind::Char), Some(Scalar::Char('x'))),
            (SourceType::scalar(ScalarKind::UInt32), Some(Scalar::UInt32(1))),
            (SourceType::Object, None),
            // null without a nullable wrapper
            (SourceType::scalar(ScalarKind::Int32), None),
            // declared and runtime kinds disagree
            (SourceType::scalar(ScalarKind::Int64), Some(Scalar::Int32(1))),
        ];

        for (ty, value) in cases {
            let mut b = PredicateBuilder::new();
            let c = b.typed_constant(ty.clone(), value);
            let err = run(&b.finish(c)).unwrap_err();
            assert!(
                matches!(err, TranslateError::UnsupportedConstruct(_)),
                "{} -> {:?}",
                ty,
                err
            );
        }
    }

    #[test]
    fn test_comparison_and_logic_mirror_source_shape() {
        // !(e.Id > 1 && e.Status != "Closed") || e.IsDeleted == false
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let one = b.constant(Scalar::Int32(1));
        let gt = b.binary(BinaryOp::GreaterThan, id, one);
        let status = b.member(e, "Status");
        let closed = b.constant(Scalar::String("Closed".to_string()));
        let ne = b.binary(BinaryOp::NotEqual, status, closed);
        let and = b.and(gt, ne);
        let not = b.not(and);
        let deleted = b.member(e, "IsDeleted");
        let no = b.constant(Scalar::Boolean(false));
        let eq = b.equal(deleted, no);
        let body = b.or(not, eq);

        let result = run(&b.finish(body)).unwrap();
        assert_eq!(
            result.expression.to_string(),
            "(NOT ((Extent1.order_id > 1) AND (Extent1.status <> 'Closed')) OR (Extent1.is_deleted = false))"
        );

        let DbExpression::Or(left, right) = result.expression.as_ref() else {
            panic!("Expected OR at the root");
        };
        assert!(matches!(left.as_ref(), DbExpression::Not(inner) if matches!(inner.as_ref(), DbExpression::And(..))));
        assert!(matches!(
            right.as_ref(),
            DbExpression::Comparison {
                kind: ComparisonKind::Equals,
                ..
            }
        ));
    }

    #[test]
    fn test_every_comparison_operator() {
        let ops = [
            (BinaryOp::Equal, ComparisonKind::Equals),
            (BinaryOp::NotEqual, ComparisonKind::NotEquals),
            (BinaryOp::GreaterThan, ComparisonKind::GreaterThan),
            (BinaryOp::GreaterThanOrEqual, ComparisonKind::GreaterThanOrEquals),
            (BinaryOp::LessThan, ComparisonKind::LessThan),
            (BinaryOp::LessThanOrEqual, ComparisonKind::LessThanOrEquals),
        ];
        for (op, expected) in ops {
            let mut b = PredicateBuilder::new();
            let e = order(&mut b);
            let id = b.member(e, "Id");
            let five = b.constant(Scalar::Int32(5));
            let body = b.binary(op, id, five);

            let result = run(&b.finish(body)).unwrap();
            match result.expression.as_ref() {
                DbExpression::Comparison { kind, .. } => assert_eq!(*kind, expected),
                other => panic!("Expected comparison, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_same_field_shares_one_reference() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let low_id = b.member(e, "Id");
        let one = b.constant(Scalar::Int32(1));
        let gt = b.binary(BinaryOp::GreaterThan, low_id, one);
        let high_id = b.member(e, "Id");
        let ten = b.constant(Scalar::Int32(10));
        let lt = b.binary(BinaryOp::LessThan, high_id, ten);
        let body = b.and(gt, lt);

        let result = run(&b.finish(body)).unwrap();
        let DbExpression::And(left, right) = result.expression.as_ref() else {
            panic!("Expected AND");
        };
        let (
            DbExpression::Comparison { left: first, .. },
            DbExpression::Comparison { left: second, .. },
        ) = (left.as_ref(), right.as_ref())
        else {
            panic!("Expected comparisons");
        };
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.fields["Id"].storage.column, "order_id");
    }

    #[test]
    fn test_same_parameter_shares_one_handle() {
        // e.TenantId == tenant || e.Id == tenant
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let tenant = b.parameter("tenant", SourceType::scalar(ScalarKind::Int32));
        let tenant_id = b.member(e, "TenantId");
        let first = b.equal(tenant_id, tenant);
        let id = b.member(e, "Id");
        let second = b.equal(id, tenant);
        let body = b.or(first, second);

        let result = run(&b.finish(body)).unwrap();
        assert_eq!(result.parameters.len(), 1);
        let handle = &result.parameters.get("tenant").unwrap().handle;

        let DbExpression::Or(left, right) = result.expression.as_ref() else {
            panic!("Expected OR");
        };
        for side in [left, right] {
            match side.as_ref() {
                DbExpression::Comparison { right, .. } => assert!(Arc::ptr_eq(right, handle)),
                other => panic!("Expected comparison, got {:?}", other),
            }
        }
        // the row parameter produced no binding
        assert!(result.parameters.get("e").is_none());
    }

    #[test]
    fn test_captured_parameters_are_bound_by_name() {
        // two distinct nodes naming the same logical parameter
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let p1 = b.captured("limit", SourceType::scalar(ScalarKind::Int32));
        let gt = b.binary(BinaryOp::GreaterThan, id, p1);
        let tenant = b.member(e, "TenantId");
        let p2 = b.captured("limit", SourceType::scalar(ScalarKind::Int32));
        let lt = b.binary(BinaryOp::LessThan, tenant, p2);
        let body = b.and(gt, lt);

        let result = run(&b.finish(body)).unwrap();
        assert_eq!(result.parameters.len(), 1);
        assert_eq!(
            result.expression.to_string(),
            "((Extent1.order_id > @DynamicFilterParam_Test_limit) AND (Extent1.tenant_id < @DynamicFilterParam_Test_limit))"
        );
    }

    #[test]
    fn test_nullable_value_reads_inner_field() {
        // e.Total.Value >= minTotal && e.Total != null
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let min_total = b.parameter("minTotal", SourceType::nullable(ScalarKind::Decimal));
        let total = b.member(e, "Total");
        let value = b.nullable_value(total);
        let gte = b.binary(BinaryOp::GreaterThanOrEqual, value, min_total);
        let other_total = b.member(e, "Total");
        let null = b.typed_constant(SourceType::nullable(ScalarKind::Decimal), None);
        let ne = b.binary(BinaryOp::NotEqual, other_total, null);
        let body = b.and(gte, ne);

        let result = run(&b.finish(body)).unwrap();
        assert_eq!(
            result.expression.to_string(),
            "((Extent1.total_amount >= @DynamicFilterParam_Test_minTotal) AND (Extent1.total_amount <> null))"
        );
        assert_eq!(result.fields.len(), 1);

        let parameter = result.parameters.get("minTotal").unwrap();
        assert_eq!(parameter.ty.primitive.name, "Edm.Decimal");
        assert!(parameter.ty.is_nullable());
    }

    #[test]
    fn test_cast_uses_catalog_type() {
        // (long?)e.Id == 5L
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let cast = b.convert(id, SourceType::nullable(ScalarKind::Int64));
        let five = b.constant(Scalar::Int64(5));
        let body = b.equal(cast, five);

        let result = run(&b.finish(body)).unwrap();
        assert_eq!(
            result.expression.to_string(),
            "(CAST(Extent1.order_id AS Edm.Int64?) = 5)"
        );
    }

    #[test]
    fn test_conditional_is_rejected_anywhere() {
        // e.IsDeleted == false && (e.Id > 1 ? true : false)
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let deleted = b.member(e, "IsDeleted");
        let no = b.constant(Scalar::Boolean(false));
        let eq = b.equal(deleted, no);
        let id = b.member(e, "Id");
        let one = b.constant(Scalar::Int32(1));
        let test = b.binary(BinaryOp::GreaterThan, id, one);
        let yes = b.constant(Scalar::Boolean(true));
        let no_again = b.constant(Scalar::Boolean(false));
        let conditional = b.conditional(test, yes, no_again);
        let not = b.not(conditional);
        let body = b.and(eq, not);

        let err = run(&b.finish(body)).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_unknown_field_is_not_found() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let name = b.member(e, "CustomerName");
        let value = b.constant(Scalar::String("Ann".to_string()));
        let body = b.equal(name, value);

        let err = run(&b.finish(body)).unwrap_err();
        assert_eq!(
            err,
            TranslateError::FieldNotFound {
                field: "CustomerName".to_string(),
                entity: "Order".to_string(),
            }
        );
    }

    #[test]
    fn test_navigation_is_not_found() {
        // e.Customer.Name == "Ann"
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let customer = b.member(e, "Customer");
        let name = b.member(customer, "Name");
        let value = b.constant(Scalar::String("Ann".to_string()));
        let body = b.equal(name, value);

        let err = run(&b.finish(body)).unwrap_err();
        assert!(matches!(err, TranslateError::FieldNotFound { ref field, .. } if field == "Customer"));
    }

    #[test]
    fn test_unsupported_operators_and_methods() {
        // e.Id + 1 == 2
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let one = b.constant(Scalar::Int32(1));
        let add = b.binary(BinaryOp::Add, id, one);
        let two = b.constant(Scalar::Int32(2));
        let body = b.equal(add, two);
        assert!(matches!(
            run(&b.finish(body)).unwrap_err(),
            TranslateError::UnsupportedConstruct(_)
        ));

        // -e.Id == 2
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let neg = b.unary(UnaryOp::Negate, id, SourceType::scalar(ScalarKind::Int32));
        let two = b.constant(Scalar::Int32(2));
        let body = b.equal(neg, two);
        assert!(matches!(
            run(&b.finish(body)).unwrap_err(),
            TranslateError::UnsupportedConstruct(_)
        ));

        // e.Status.StartsWith("O")
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let status = b.member(e, "Status");
        let prefix = b.constant(Scalar::String("O".to_string()));
        let body = b.call("StartsWith", Some(status), vec![prefix]);
        assert!(matches!(
            run(&b.finish(body)).unwrap_err(),
            TranslateError::UnsupportedConstruct(_)
        ));
    }

    #[test]
    fn test_row_parameter_as_value_is_rejected() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let null = b.typed_constant(SourceType::scalar(ScalarKind::String), None);
        let body = b.equal(e, null);

        let err = run(&b.finish(body)).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_object_parameter_is_rejected() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let p = b.parameter("anything", SourceType::Object);
        let body = b.equal(id, p);

        let err = run(&b.finish(body)).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_parameter_without_catalog_type() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let status = b.member(e, "Status");
        let p = b.parameter("initial", SourceType::scalar(ScalarKind::Char));
        let body = b.equal(status, p);

        let err = run(&b.finish(body)).unwrap_err();
        assert!(matches!(err, TranslateError::AmbiguousTypeMapping { matches: 0, .. }));
    }

    #[test]
    fn test_independent_runs_in_parallel() {
        let catalog = create_test_catalog();
        let binding = BindingContext::new("Extent1", EntityType::new("Order"));

        let results: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let catalog = &catalog;
                    let binding = &binding;
                    scope.spawn(move || {
                        let mut b = PredicateBuilder::new();
                        let e = b.parameter("e", SourceType::entity("Order"));
                        let id = b.member(e, "Id");
                        let p = b.parameter("id", SourceType::scalar(ScalarKind::Int32));
                        let body = b.equal(id, p);
                        let naming = FilterScopedNaming::new(format!("F{}", i));
                        translate(&b.finish(body), binding, catalog, &naming)
                            .unwrap()
                            .expression
                            .to_string()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (i, text) in results.iter().enumerate() {
            assert_eq!(
                *text,
                format!("(Extent1.order_id = @DynamicFilterParam_F{}_id)", i)
            );
        }
    }

    #[test]
    fn test_unvisited_child_is_missing_translation() {
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let predicate = b.finish(id);

        let catalog = create_test_catalog();
        let binding = BindingContext::new("Extent1", EntityType::new("Order"));
        let naming = FilterScopedNaming::new("Test");
        let mut translator = Translator::new(&binding, &catalog, &naming);
        translator.translated = vec![None; predicate.len()];

        assert_eq!(
            translator.translation_of(&predicate, id).unwrap_err(),
            TranslateError::MissingTranslation(id)
        );
    }

    #[test]
    fn test_null_takes_type_of_compared_field() {
        let cases = [
            (
                "(e: Order) => e.Total != null",
                "(Extent1.total_amount <> null)",
                Literal::Decimal(None),
            ),
            (
                "(e: Order) => e.Status == null",
                "(Extent1.status = null)",
                Literal::String(None),
            ),
            (
                "(e: Order, p: long?) => null == p",
                "(null = @DynamicFilterParam_Test_p)",
                Literal::Int64(None),
            ),
        ];

        for (source, expected, literal) in cases {
            let predicate = crate::parser::parse_predicate(source).unwrap();
            let result = run(&predicate).unwrap();
            assert_eq!(result.expression.to_string(), expected, "{}", source);

            let DbExpression::Comparison { left, right, .. } = result.expression.as_ref() else {
                panic!("Expected comparison for {}", source);
            };
            let null = if matches!(left.as_ref(), DbExpression::Constant(_)) {
                left
            } else {
                right
            };
            assert_eq!(**null, DbExpression::Constant(literal));
        }
    }

    #[test]
    fn test_null_compared_with_null_is_rejected() {
        let predicate = crate::parser::parse_predicate("(e: Order) => null == null").unwrap();
        assert!(matches!(
            run(&predicate).unwrap_err(),
            TranslateError::UnsupportedConstruct(_)
        ));
    }

    #[test]
    fn test_dangling_node_ids_are_rejected() {
        // reference past the end of the arena
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let body = b.equal(id, NodeId(50));
        assert_eq!(
            run(&b.finish(body)).unwrap_err(),
            TranslateError::MissingTranslation(NodeId(50))
        );

        // a node that refers to itself would otherwise recurse forever
        let mut b = PredicateBuilder::new();
        let e = order(&mut b);
        let id = b.member(e, "Id");
        let body = b.equal(id, NodeId(2));
        assert_eq!(
            run(&b.finish(body)).unwrap_err(),
            TranslateError::MissingTranslation(NodeId(2))
        );
    }

    #[test]
    fn test_has_value_is_an_ordinary_member() {
        let predicate = crate::parser::parse_predicate("(e: Order) => e.Total.HasValue").unwrap();
        assert_eq!(
            run(&predicate).unwrap_err(),
            TranslateError::FieldNotFound {
                field: "HasValue".to_string(),
                entity: "Order".to_string(),
            }
        );
    }

    #[test]
    fn test_interface_row_parameter_is_inert() {
        let catalog = InMemoryCatalog::new().field("ITenant", "TenantId", "tenant_id", ScalarKind::Int32);
        let binding = BindingContext::new("Extent1", EntityType::new("ITenant"));
        let naming = FilterScopedNaming::new("Test");

        let mut b = PredicateBuilder::new();
        let t = b.parameter("t", SourceType::Interface("ITenant".to_string()));
        let tenant = b.member(t, "TenantId");
        let five = b.constant(Scalar::Int32(5));
        let body = b.equal(tenant, five);

        let result = translate(&b.finish(body), &binding, &catalog, &naming).unwrap();
        assert_eq!(result.expression.to_string(), "(Extent1.tenant_id = 5)");
        assert!(result.parameters.is_empty());
        assert_eq!(result.fields.len(), 1);
    }

    #[test]
    fn test_list_constants_use_element_type() {
        let predicate =
            crate::parser::parse_predicate("(e: Order) => new List<long> { 1, 2 }.Contains(e.TenantId)").unwrap();
        let result = run(&predicate).unwrap();
        let DbExpression::In { list, .. } = result.expression.as_ref() else {
            panic!("Expected IN, got {}", result.expression);
        };
        let literals: Vec<_> = list.iter().map(|value| (**value).clone()).collect();
        assert_eq!(
            literals,
            vec![
                DbExpression::Constant(Literal::Int64(Some(1))),
                DbExpression::Constant(Literal::Int64(Some(2))),
            ]
        );
    }
}
