//! Maps source types onto catalog primitive types.

use crate::catalog::{FacetKind, PrimitiveTypeDescriptor, SchemaCatalog};
use crate::error::{Result, TranslateError};
use crate::expr::Literal;
use serde::Serialize;
use std::fmt;

use crate::types::SourceType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Facet {
    Nullable(bool),
    /// Default value of the type; `None` is a null default.
    DefaultValue(Option<Literal>),
}

impl Facet {
    pub fn kind(&self) -> FacetKind {
        match self {
            Facet::Nullable(_) => FacetKind::Nullable,
            Facet::DefaultValue(_) => FacetKind::DefaultValue,
        }
    }
}

/// A primitive type plus the facets attached to this use of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeUsage {
    pub primitive: PrimitiveTypeDescriptor,
    pub facets: Vec<Facet>,
}

impl TypeUsage {
    pub fn new(primitive: PrimitiveTypeDescriptor) -> Self {
        Self {
            primitive,
            facets: Vec::new(),
        }
    }

    /// Usage of a nullable type. Only facets listed in `available` are attached.
    pub fn nullable(
        primitive: PrimitiveTypeDescriptor,
        default_value: Option<Literal>,
        available: &[FacetKind],
    ) -> Self {
        let mut usage = Self::new(primitive);
        if available.contains(&FacetKind::Nullable) {
            usage.facets.push(Facet::Nullable(true));
        }
        if available.contains(&FacetKind::DefaultValue) {
            usage.facets.push(Facet::DefaultValue(default_value));
        }
        usage
    }

    pub fn is_nullable(&self) -> bool {
        self.facets.contains(&Facet::Nullable(true))
    }

    pub fn facet(&self, kind: FacetKind) -> Option<&Facet> {
        self.facets.iter().find(|f| f.kind() == kind)
    }
}

impl fmt::Display for TypeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primitive.name)?;
        if self.is_nullable() {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Strips one nullable wrapper and one sequence wrapper from `ty`, returning
/// the remaining family and whether a nullable wrapper was seen.
pub fn resolve_target_type(ty: &SourceType) -> Result<(SourceType, bool)> {
    let (mut family, mut nullable) = match ty {
        SourceType::Nullable(inner) => (inner.as_ref().clone(), true),
        other => (other.clone(), false),
    };

    if let SourceType::Sequence(element) = family {
        family = match *element {
            SourceType::Nullable(inner) => {
                nullable = true;
                *inner
            }
            element => element,
        };
    }

    match family {
        SourceType::UntypedCollection | SourceType::Object => Err(TranslateError::unsupported(
            format!("non-generic collections and object types are not supported (type {})", ty),
        )),
        family => Ok((family, nullable)),
    }
}

/// Builds the type usage declared for a parameter or cast of type `ty`.
pub fn type_usage_for(catalog: &dyn SchemaCatalog, ty: &SourceType) -> Result<TypeUsage> {
    let (family, nullable) = resolve_target_type(ty)?;

    let mut matches = catalog.primitive_types_matching(&family);
    if matches.len() != 1 {
        return Err(TranslateError::AmbiguousTypeMapping {
            source_type: family.to_string(),
            matches: matches.len(),
        });
    }
    let primitive = matches.remove(0);

    if nullable {
        Ok(TypeUsage::nullable(
            primitive,
            None,
            catalog.general_facet_descriptions(),
        ))
    } else {
        Ok(TypeUsage::new(primitive))
    }
}
