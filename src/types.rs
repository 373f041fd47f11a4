//! Source-side types and runtime values of predicate literals.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primitive family of a source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    Char,
    DateTime,
    DateTimeOffset,
    Guid,
    Binary,
    String,
}

impl ScalarKind {
    /// Kinds whose values may be absent without a nullable wrapper.
    pub fn is_reference_like(self) -> bool {
        matches!(self, ScalarKind::String | ScalarKind::Binary)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "bool",
            ScalarKind::Byte => "byte",
            ScalarKind::SByte => "sbyte",
            ScalarKind::Int16 => "short",
            ScalarKind::UInt16 => "ushort",
            ScalarKind::Int32 => "int",
            ScalarKind::UInt32 => "uint",
            ScalarKind::Int64 => "long",
            ScalarKind::UInt64 => "ulong",
            ScalarKind::Single => "float",
            ScalarKind::Double => "double",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Char => "char",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::DateTimeOffset => "DateTimeOffset",
            ScalarKind::Guid => "Guid",
            ScalarKind::Binary => "byte[]",
            ScalarKind::String => "string",
        }
    }

    /// Looks up a keyword type name as written in predicate text.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "bool" => ScalarKind::Boolean,
            "byte" => ScalarKind::Byte,
            "sbyte" => ScalarKind::SByte,
            "short" => ScalarKind::Int16,
            "ushort" => ScalarKind::UInt16,
            "int" => ScalarKind::Int32,
            "uint" => ScalarKind::UInt32,
            "long" => ScalarKind::Int64,
            "ulong" => ScalarKind::UInt64,
            "float" => ScalarKind::Single,
            "double" => ScalarKind::Double,
            "decimal" => ScalarKind::Decimal,
            "char" => ScalarKind::Char,
            "DateTime" => ScalarKind::DateTime,
            "DateTimeOffset" => ScalarKind::DateTimeOffset,
            "Guid" => ScalarKind::Guid,
            "string" => ScalarKind::String,
            _ => return None,
        };
        Some(kind)
    }
}

/// Declared type of a predicate node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceType {
    Scalar(ScalarKind),
    /// Nullable value wrapper, `int?`.
    Nullable(Box<SourceType>),
    /// Generic sequence, `List<int>`.
    Sequence(Box<SourceType>),
    /// Non-generic collection with no element type.
    UntypedCollection,
    Object,
    Entity(String),
    Interface(String),
}

impl SourceType {
    pub fn scalar(kind: ScalarKind) -> Self {
        SourceType::Scalar(kind)
    }

    pub fn nullable(kind: ScalarKind) -> Self {
        SourceType::Nullable(Box::new(SourceType::Scalar(kind)))
    }

    pub fn sequence_of(element: SourceType) -> Self {
        SourceType::Sequence(Box::new(element))
    }

    pub fn entity(name: impl Into<String>) -> Self {
        SourceType::Entity(name.into())
    }

    /// Entity and interface types denote a whole row rather than a scalar.
    pub fn is_row_type(&self) -> bool {
        matches!(self, SourceType::Entity(_) | SourceType::Interface(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, SourceType::Sequence(_) | SourceType::UntypedCollection)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Scalar(kind) => write!(f, "{}", kind.name()),
            SourceType::Nullable(inner) => write!(f, "{}?", inner),
            SourceType::Sequence(inner) => write!(f, "List<{}>", inner),
            SourceType::UntypedCollection => write!(f, "ArrayList"),
            SourceType::Object => write!(f, "object"),
            SourceType::Entity(name) | SourceType::Interface(name) => write!(f, "{}", name),
        }
    }
}

/// Runtime value carried by a constant node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(BigDecimal),
    Char(char),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Guid(Uuid),
    Binary(Vec<u8>),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Boolean(_) => ScalarKind::Boolean,
            Scalar::Byte(_) => ScalarKind::Byte,
            Scalar::SByte(_) => ScalarKind::SByte,
            Scalar::Int16(_) => ScalarKind::Int16,
            Scalar::UInt16(_) => ScalarKind::UInt16,
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::UInt32(_) => ScalarKind::UInt32,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::UInt64(_) => ScalarKind::UInt64,
            Scalar::Single(_) => ScalarKind::Single,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Decimal(_) => ScalarKind::Decimal,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::DateTime(_) => ScalarKind::DateTime,
            Scalar::DateTimeOffset(_) => ScalarKind::DateTimeOffset,
            Scalar::Guid(_) => ScalarKind::Guid,
            Scalar::Binary(_) => ScalarKind::Binary,
            Scalar::String(_) => ScalarKind::String,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(v) => write!(f, "{}", v),
            Scalar::Byte(v) => write!(f, "{}", v),
            Scalar::SByte(v) => write!(f, "{}", v),
            Scalar::Int16(v) => write!(f, "{}", v),
            Scalar::UInt16(v) => write!(f, "{}", v),
            Scalar::Int32(v) => write!(f, "{}", v),
            Scalar::UInt32(v) => write!(f, "{}", v),
            Scalar::Int64(v) => write!(f, "{}", v),
            Scalar::UInt64(v) => write!(f, "{}", v),
            Scalar::Single(v) => write!(f, "{}", v),
            Scalar::Double(v) => write!(f, "{}", v),
            Scalar::Decimal(v) => write!(f, "{}", v),
            Scalar::Char(v) => write!(f, "'{}'", v),
            Scalar::DateTime(v) => write!(f, "{}", v),
            Scalar::DateTimeOffset(v) => write!(f, "{}", v.to_rfc3339()),
            Scalar::Guid(v) => write!(f, "{}", v),
            Scalar::Binary(v) => write!(f, "0x{}", hex::encode(v)),
            Scalar::String(v) => write!(f, "\"{}\"", v),
        }
    }
}
