//! Field resolution against the bound row variable.

use crate::catalog::{EntityType, SchemaCatalog, StorageField};
use crate::error::{Result, TranslateError};
use crate::expr::{DbExpr, DbExpression, Variable};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The row variable of the query the predicate is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingContext {
    variable: Arc<Variable>,
    entity: EntityType,
}

impl BindingContext {
    pub fn new(variable_name: impl Into<String>, entity: EntityType) -> Self {
        let variable = Arc::new(Variable {
            name: variable_name.into(),
            entity: entity.name().to_string(),
        });
        Self { variable, entity }
    }

    pub fn variable(&self) -> &Arc<Variable> {
        &self.variable
    }

    pub fn variable_name(&self) -> &str {
        &self.variable.name
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }
}

/// A property reference minted for a declared field.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub field: String,
    pub storage: StorageField,
    pub expression: DbExpr,
}

pub struct FieldResolver<'a> {
    binding: &'a BindingContext,
    fields: HashMap<String, ResolvedField>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(binding: &'a BindingContext) -> Self {
        Self {
            binding,
            fields: HashMap::new(),
        }
    }

    /// The property reference for `field`, shared by every access to it.
    pub fn resolve(&mut self, catalog: &dyn SchemaCatalog, field: &str) -> Result<DbExpr> {
        if let Some(resolved) = self.fields.get(field) {
            return Ok(resolved.expression.clone());
        }

        // Only the bound entity's own fields are reachable; navigation
        // properties have no storage mapping here.
        let storage = catalog
            .resolve_field(self.binding.entity(), field)
            .ok_or_else(|| TranslateError::FieldNotFound {
                field: field.to_string(),
                entity: self.binding.entity().name().to_string(),
            })?;

        let expression = DbExpression::property(self.binding.variable().clone(), &storage.column);
        debug!("Created new property expression for {} -> {}", field, storage.column);

        self.fields.insert(
            field.to_string(),
            ResolvedField {
                field: field.to_string(),
                storage,
                expression: expression.clone(),
            },
        );
        Ok(expression)
    }

    /// Storage mapping behind a property reference minted by this resolver.
    pub fn storage_of(&self, expression: &DbExpr) -> Option<&StorageField> {
        self.fields
            .values()
            .find(|resolved| Arc::ptr_eq(&resolved.expression, expression))
            .map(|resolved| &resolved.storage)
    }

    pub fn into_fields(self) -> HashMap<String, ResolvedField> {
        self.fields
    }
}
