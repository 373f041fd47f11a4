//! Schema catalog: storage names of entity fields and the primitive type table.

use crate::types::{ScalarKind, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The entity type a predicate is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType(pub String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Where a declared field lives in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageField {
    /// Column name; may differ from the declared field name.
    pub column: String,
    #[serde(rename = "type")]
    pub family: ScalarKind,
    #[serde(default)]
    pub nullable: bool,
}

impl StorageField {
    pub fn new(column: impl Into<String>, family: ScalarKind) -> Self {
        Self {
            column: column.into(),
            family,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A target primitive type and the source family it is equivalent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveTypeDescriptor {
    pub name: String,
    pub equivalent: ScalarKind,
}

impl PrimitiveTypeDescriptor {
    pub fn new(name: impl Into<String>, equivalent: ScalarKind) -> Self {
        Self {
            name: name.into(),
            equivalent,
        }
    }
}

/// General facets a type usage may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetKind {
    Nullable,
    DefaultValue,
    MaxLength,
    Unicode,
    FixedLength,
    Precision,
    Scale,
}

/// Metadata lookups the translator needs. Implementations are shared
/// read-only between concurrent translations.
pub trait SchemaCatalog: Send + Sync {
    /// Storage mapping of `field` on `entity`, or `None` when the entity has
    /// no such field.
    fn resolve_field(&self, entity: &EntityType, field: &str) -> Option<StorageField>;

    /// Primitive types equivalent to `ty`. Anything other than a scalar
    /// type matches nothing.
    fn primitive_types_matching(&self, ty: &SourceType) -> Vec<PrimitiveTypeDescriptor>;

    fn general_facet_descriptions(&self) -> &[FacetKind];
}

/// The conceptual primitive types, one per supported family.
pub fn standard_primitive_types() -> Vec<PrimitiveTypeDescriptor> {
    [
        ("Edm.Binary", ScalarKind::Binary),
        ("Edm.Boolean", ScalarKind::Boolean),
        ("Edm.Byte", ScalarKind::Byte),
        ("Edm.DateTime", ScalarKind::DateTime),
        ("Edm.DateTimeOffset", ScalarKind::DateTimeOffset),
        ("Edm.Decimal", ScalarKind::Decimal),
        ("Edm.Double", ScalarKind::Double),
        ("Edm.Guid", ScalarKind::Guid),
        ("Edm.Single", ScalarKind::Single),
        ("Edm.SByte", ScalarKind::SByte),
        ("Edm.Int16", ScalarKind::Int16),
        ("Edm.Int32", ScalarKind::Int32),
        ("Edm.Int64", ScalarKind::Int64),
        ("Edm.String", ScalarKind::String),
    ]
    .into_iter()
    .map(|(name, kind)| PrimitiveTypeDescriptor::new(name, kind))
    .collect()
}

pub fn standard_facets() -> Vec<FacetKind> {
    vec![FacetKind::Nullable, FacetKind::DefaultValue]
}

/// Catalog held in memory, built in code or loaded from a config file.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    entities: HashMap<EntityType, HashMap<String, StorageField>>,
    primitive_types: Vec<PrimitiveTypeDescriptor>,
    facets: Vec<FacetKind>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            primitive_types: standard_primitive_types(),
            facets: standard_facets(),
        }
    }

    pub fn with_primitive_types(mut self, primitive_types: Vec<PrimitiveTypeDescriptor>) -> Self {
        self.primitive_types = primitive_types;
        self
    }

    pub fn with_facets(mut self, facets: Vec<FacetKind>) -> Self {
        self.facets = facets;
        self
    }

    /// Maps the declared `field` of `entity` to its storage field.
    pub fn add_field(&mut self, entity: &str, field: impl Into<String>, storage: StorageField) {
        self.entities
            .entry(EntityType::new(entity))
            .or_default()
            .insert(field.into(), storage);
    }

    pub fn field(mut self, entity: &str, field: &str, column: &str, family: ScalarKind) -> Self {
        self.add_field(entity, field, StorageField::new(column, family));
        self
    }

    pub fn nullable_field(
        mut self,
        entity: &str,
        field: &str,
        column: &str,
        family: ScalarKind,
    ) -> Self {
        self.add_field(entity, field, StorageField::new(column, family).nullable());
        self
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn fields_of(&self, entity: &EntityType) -> Option<&HashMap<String, StorageField>> {
        self.entities.get(entity)
    }
}

impl SchemaCatalog for InMemoryCatalog {
    fn resolve_field(&self, entity: &EntityType, field: &str) -> Option<StorageField> {
        self.entities.get(entity)?.get(field).cloned()
    }

    fn primitive_types_matching(&self, ty: &SourceType) -> Vec<PrimitiveTypeDescriptor> {
        match ty {
            SourceType::Scalar(kind) => self
                .primitive_types
                .iter()
                .filter(|p| p.equivalent == *kind)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn general_facet_descriptions(&self) -> &[FacetKind] {
        &self.facets
    }
}
