//! `Contains` rewriting.
//!
//! The target `IN` node only holds constants, so the receiver decides the shape:
//!
//! ```text
//! ids.Contains(x)                      -> x = @ids
//! new List<int> { 1, 2, 3 }.Contains(x) -> x IN (1, 2, 3)
//! new List<int> { 1, p }.Contains(x)    -> (x = 1) OR (x = @p)
//! ```
//!
//! The single equality emitted for a bound collection is a marker: the command
//! interception layer replaces it with a real `IN` list once the collection's
//! contents are known at execution time.

use super::Translator;
use crate::ast::{Node, NodeId, Predicate};
use crate::error::{Result, TranslateError};
use crate::expr::{DbExpr, DbExpression};
use tracing::trace;

impl<'a> Translator<'a> {
    pub(super) fn translate_contains(
        &mut self,
        predicate: &Predicate,
        receiver: Option<NodeId>,
        arguments: &[NodeId],
    ) -> Result<DbExpr> {
        let (collection, item) = match (receiver, arguments) {
            (Some(collection), [item]) => (collection, *item),
            (None, [collection, item]) => (*collection, *item),
            _ => {
                return Err(TranslateError::unsupported(format!(
                    "Contains called with {} arguments",
                    arguments.len()
                )))
            }
        };

        self.visit(predicate, item)?;
        let argument = self.translation_of(predicate, item)?;

        match predicate.node(collection) {
            Node::Parameter { name, ty } if ty.is_collection() => {
                trace!("Contains over bound collection {}", name);
                let parameter = self.parameters.bind(self.catalog, name, ty)?;
                Ok(DbExpression::equal(argument, parameter))
            }
            Node::ListInit { elements, .. } => self.rewrite_list(predicate, argument, elements),
            other => Err(TranslateError::unsupported(format!(
                "Unsupported receiver used in Contains(): {}",
                other.kind_name()
            ))),
        }
    }

    fn rewrite_list(
        &mut self,
        predicate: &Predicate,
        argument: DbExpr,
        elements: &[NodeId],
    ) -> Result<DbExpr> {
        let mut has_parameter = false;
        for &element in elements {
            match predicate.node(element) {
                Node::Constant(_) => {}
                Node::Parameter { ty, .. } if !ty.is_row_type() && !ty.is_collection() => {
                    has_parameter = true
                }
                other => {
                    return Err(TranslateError::unsupported(format!(
                        "Unrecognized {} in Contains list",
                        other.kind_name()
                    )))
                }
            }
        }

        let mut values = Vec::with_capacity(elements.len());
        for &element in elements {
            self.visit(predicate, element)?;
            values.push(self.translation_of(predicate, element)?);
        }

        if !has_parameter {
            trace!("Contains over {} constants", values.len());
            return Ok(DbExpression::in_list(argument, values));
        }

        // Parameter handles cannot live inside IN, so spell the list out as
        // equalities; the downstream compiler folds them back into an IN.
        trace!("Contains over {} values with parameters", values.len());
        values
            .into_iter()
            .map(|value| DbExpression::equal(argument.clone(), value))
            .reduce(DbExpression::or)
            .ok_or_else(|| TranslateError::unsupported("Empty Contains list"))
    }
}
