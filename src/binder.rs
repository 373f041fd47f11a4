//! Parameter binding: one parameter handle per logical name.

use crate::catalog::SchemaCatalog;
use crate::error::Result;
use crate::expr::{DbExpr, DbExpression};
use crate::type_mapping::{type_usage_for, TypeUsage};
use crate::types::SourceType;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Produces the globally unique name of the parameter bound to a logical name.
pub trait ParameterNaming: Send + Sync {
    fn parameter_name(&self, logical_name: &str) -> String;
}

impl<F> ParameterNaming for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn parameter_name(&self, logical_name: &str) -> String {
        self(logical_name)
    }
}

/// `DynamicFilterParam_{filter}_{logical}`, the prefix the command
/// interception layer recognizes.
#[derive(Debug, Clone)]
pub struct FilterScopedNaming {
    filter_name: String,
}

impl FilterScopedNaming {
    pub const PREFIX: &'static str = "DynamicFilterParam_";

    pub fn new(filter_name: impl Into<String>) -> Self {
        Self {
            filter_name: filter_name.into(),
        }
    }
}

impl ParameterNaming for FilterScopedNaming {
    fn parameter_name(&self, logical_name: &str) -> String {
        format!("{}{}_{}", Self::PREFIX, self.filter_name, logical_name)
    }
}

/// One entry of the parameter table.
#[derive(Debug, Clone, Serialize)]
pub struct BoundParameter {
    pub logical_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeUsage,
    #[serde(skip)]
    pub handle: DbExpr,
}

/// Parameters minted during a translation, in creation order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    entries: Vec<BoundParameter>,
}

impl ParameterTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, logical_name: &str) -> Option<&BoundParameter> {
        self.entries.iter().find(|p| p.logical_name == logical_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundParameter> {
        self.entries.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct ParameterBinder<'a> {
    naming: &'a dyn ParameterNaming,
    by_name: HashMap<String, usize>,
    table: ParameterTable,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(naming: &'a dyn ParameterNaming) -> Self {
        Self {
            naming,
            by_name: HashMap::new(),
            table: ParameterTable::default(),
        }
    }

    /// Returns the handle bound to `logical_name`, creating it with a type
    /// derived from `ty` on first use. Later calls never change the type.
    pub fn bind(
        &mut self,
        catalog: &dyn SchemaCatalog,
        logical_name: &str,
        ty: &SourceType,
    ) -> Result<DbExpr> {
        if let Some(&index) = self.by_name.get(logical_name) {
            return Ok(self.table.entries[index].handle.clone());
        }

        let usage = type_usage_for(catalog, ty)?;
        let name = self.naming.parameter_name(logical_name);
        let handle = DbExpression::parameter(name.clone(), usage.clone());
        debug!("Created new parameter for {}: {}", logical_name, name);

        self.by_name
            .insert(logical_name.to_string(), self.table.entries.len());
        self.table.entries.push(BoundParameter {
            logical_name: logical_name.to_string(),
            name,
            ty: usage,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    pub fn into_table(self) -> ParameterTable {
        self.table
    }
}
