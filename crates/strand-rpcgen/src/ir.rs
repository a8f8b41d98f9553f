//! Intermediate representation for compiled schemas.
//!
//! The front end normalizes every schema file to these types before any
//! backend runs. All values are immutable once built and fully serializable,
//! so a `Schema` can drive a code generator without consulting the source
//! text again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed catalog of scalar kinds.
///
/// `unit` and `nil` are returnable-only: they are rejected everywhere except
/// method return position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Str,
    Timestamp,
    Blob,
    Dyn,
    Unit,
    Nil,
}

impl Scalar {
    pub const ALL: [Scalar; 17] = [
        Scalar::Bool,
        Scalar::Int8,
        Scalar::Uint8,
        Scalar::Int16,
        Scalar::Uint16,
        Scalar::Int32,
        Scalar::Uint32,
        Scalar::Int64,
        Scalar::Uint64,
        Scalar::Float32,
        Scalar::Float64,
        Scalar::Str,
        Scalar::Timestamp,
        Scalar::Blob,
        Scalar::Dyn,
        Scalar::Unit,
        Scalar::Nil,
    ];

    /// The tag this scalar is declared with in schema files.
    pub fn tag(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Int8 => "int8",
            Scalar::Uint8 => "uint8",
            Scalar::Int16 => "int16",
            Scalar::Uint16 => "uint16",
            Scalar::Int32 => "int32",
            Scalar::Uint32 => "uint32",
            Scalar::Int64 => "int64",
            Scalar::Uint64 => "uint64",
            Scalar::Float32 => "float32",
            Scalar::Float64 => "float64",
            Scalar::Str => "str",
            Scalar::Timestamp => "timestamp",
            Scalar::Blob => "blob",
            Scalar::Dyn => "dyn",
            Scalar::Unit => "unit",
            Scalar::Nil => "nil",
        }
    }

    /// Look up a scalar by its declared tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Scalar> {
        Scalar::ALL
            .into_iter()
            .find(|s| s.tag().eq_ignore_ascii_case(tag))
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Scalar::Int8
                | Scalar::Uint8
                | Scalar::Int16
                | Scalar::Uint16
                | Scalar::Int32
                | Scalar::Uint32
                | Scalar::Int64
                | Scalar::Uint64
        )
    }

    /// Scalars usable as map keys. JSON object keys are strings on the wire,
    /// so keys are limited to kinds with a stable string form.
    pub fn is_map_key(self) -> bool {
        self.is_integer() || matches!(self, Scalar::Str | Scalar::Bool | Scalar::Timestamp)
    }

    /// Scalars that can round-trip through a URL query string.
    pub fn is_query_paramable(self) -> bool {
        !matches!(self, Scalar::Blob | Scalar::Dyn | Scalar::Unit | Scalar::Nil)
    }

    /// `unit` and `nil` are only legal as method return types.
    pub fn is_returnable_only(self) -> bool {
        matches!(self, Scalar::Unit | Scalar::Nil)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A canonical data type.
///
/// The variant set is closed: the resolver either produces exactly one of
/// these or fails with a type error. Consumers match exhaustively; there is
/// no unknown fallthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Scalar(Scalar),
    List(Box<DataType>),
    /// Keys are restricted to [`Scalar::is_map_key`] kinds.
    Map { key: Scalar, value: Box<DataType> },
    /// Arity 2..=5, enforced at resolution. Return-type-only.
    Tuple(Vec<DataType>),
    /// Named reference to a declared message. `use_cbor` is inherited from
    /// the referenced declaration's `@kind cbor` annotation.
    Struct { name: String, use_cbor: bool },
    /// Inline anonymous record.
    StructLiteral(Vec<Property>),
    /// Named reference to a declared union.
    Union { name: String },
    /// Inline union expression.
    UnionLiteral(Vec<DataType>),
}

impl DataType {
    pub fn scalar(s: Scalar) -> Self {
        DataType::Scalar(s)
    }

    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn map(key: Scalar, value: DataType) -> Self {
        DataType::Map {
            key,
            value: Box::new(value),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Scalar(Scalar::Unit))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(s) => f.write_str(s.tag()),
            DataType::List(el) => write!(f, "List<{el}>"),
            DataType::Map { key, value } => write!(f, "Map<{key}, {value}>"),
            DataType::Tuple(items) => {
                write!(f, "Tuple{}<", items.len())?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(">")
            }
            DataType::Struct { name, .. } => f.write_str(name),
            DataType::StructLiteral(props) => {
                f.write_str("{")?;
                for (i, p) in props.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.ty)?;
                }
                f.write_str("}")
            }
            DataType::Union { name } => f.write_str(name),
            DataType::UnionLiteral(types) => {
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}

/// A property of a message or inline struct literal. Declaration order is
/// preserved; it determines generated field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub ty: DataType,
    pub optional: bool,
}

/// A single method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
    pub optional: bool,
}

/// HTTP method a service method is bound to. Query services use GET,
/// mutation services use POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// HTTP response codes a `@returns` annotation may name.
pub const RESPONSE_CODES: [u16; 16] = [
    200, 201, 202, 203, 204, 205, 206, 300, 301, 302, 303, 304, 305, 306, 307, 308,
];

/// HTTP error codes a `@throws` annotation may name.
pub const ERROR_CODES: [u16; 37] = [
    400, 401, 402, 403, 404, 405, 406, 407, 408, 409, 410, 411, 412, 413, 414, 415, 416, 417, 418,
    422, 425, 426, 428, 429, 431, 451, 500, 501, 502, 503, 504, 505, 506, 507, 508, 510, 511,
];

pub const DEFAULT_RESPONSE_CODE: u16 = 200;
pub const DEFAULT_ERROR_CODE: u16 = 500;

pub fn is_response_code(code: u16) -> bool {
    RESPONSE_CODES.contains(&code)
}

pub fn is_error_code(code: u16) -> bool {
    ERROR_CODES.contains(&code)
}

/// A service method.
///
/// `response_code`/`error_code` come from `@returns`/`@throws` doc tags,
/// falling back to 200/500. `use_cbor` is true when the method or its owning
/// service carries a `@kind cbor` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DataType,
    pub http_method: HttpMethod,
    pub response_code: u16,
    pub error_code: u16,
    pub use_cbor: bool,
}

impl Method {
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn is_void_return(&self) -> bool {
        self.return_type.is_void()
    }

    /// True when the return payload should be (de)serialized with cbor:
    /// the method or its service was annotated, or the returned message was.
    pub fn has_cbor_return(&self) -> bool {
        self.use_cbor || matches!(self.return_type, DataType::Struct { use_cbor: true, .. })
    }

    /// True when the request payload should be (de)serialized with cbor.
    /// Only ever true for POST methods; GET parameters travel in the URL.
    pub fn has_cbor_params(&self) -> bool {
        self.http_method == HttpMethod::Post
            && (self.use_cbor
                || self
                    .params
                    .iter()
                    .any(|p| matches!(p.ty, DataType::Struct { use_cbor: true, .. })))
    }
}

/// Discriminates query services (GET) from mutation services (POST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Query,
    Mutation,
}

impl ServiceKind {
    pub fn http_method(self) -> HttpMethod {
        match self {
            ServiceKind::Query => HttpMethod::Get,
            ServiceKind::Mutation => HttpMethod::Post,
        }
    }
}

/// A named, ordered collection of same-kind methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub kind: ServiceKind,
    pub methods: Vec<Method>,
    /// Set from a `@kind cbor` tag on the service declaration; propagates as
    /// a default to every contained method.
    pub use_cbor: bool,
}

/// A named record type declared at file scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub properties: Vec<Property>,
}

/// A named discriminated union declared at file scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub name: String,
    pub types: Vec<DataType>,
}

/// An import declaration found in a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Names of the messages that were imported.
    pub message_names: Vec<String>,
    /// The module specifier they were imported from.
    pub file_name: String,
}

/// The compiled form of one schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Package name to use when generating code, derived from the schema
    /// file's parent directory.
    pub package_name: String,
    /// Schema file name without extension.
    pub file_name: String,
    pub imports: Vec<Import>,
    pub messages: Vec<Message>,
    pub unions: Vec<Union>,
    pub query_services: Vec<Service>,
    pub mutation_services: Vec<Service>,
}

impl Schema {
    /// All services, queries first.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.query_services.iter().chain(&self.mutation_services)
    }

    /// Whether any method in this file needs cbor support, used by backends
    /// to decide whether to pull in a cbor library.
    pub fn has_cbor(&self) -> bool {
        self.services()
            .flat_map(|svc| &svc.methods)
            .any(|m| m.has_cbor_return() || m.has_cbor_params())
    }
}
