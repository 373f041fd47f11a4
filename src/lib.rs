//! Translates typed predicate lambdas into a backend-neutral query
//! expression tree, resolving fields and binding parameters against a
//! schema catalog.

pub mod ast;
pub mod binder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expr;
pub mod fields;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod token;
pub mod translator;
pub mod type_mapping;
pub mod types;

pub use ast::{NodeId, Predicate, PredicateBuilder};
pub use binder::{FilterScopedNaming, ParameterNaming, ParameterTable};
pub use catalog::{EntityType, InMemoryCatalog, SchemaCatalog, StorageField};
pub use error::{Result, TranslateError};
pub use expr::{DbExpr, DbExpression};
pub use fields::BindingContext;
pub use parser::{parse_predicate, ParseError};
pub use translator::{translate, Translation};
