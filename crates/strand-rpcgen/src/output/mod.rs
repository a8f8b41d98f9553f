//! Output backends for code generation.
//!
//! Each backend takes a compiled [`Schema`](crate::ir::Schema) and produces
//! source code, either through its `generate_*` function with explicit
//! options or through its [`Generator`](crate::generator::Generator)
//! implementation with the defaults.

// Go
#[cfg(feature = "backend-go")]
pub mod go;

#[cfg(feature = "backend-go")]
pub use go::{generate_go, GoGenerator, GoOptions};

// TypeScript
#[cfg(feature = "backend-typescript")]
pub mod typescript;

#[cfg(feature = "backend-typescript")]
pub use typescript::{generate_typescript, TypeScriptGenerator, TypeScriptOptions};

// JSON Schema (request/response validators)
#[cfg(feature = "backend-jsonschema")]
pub mod jsonschema;

#[cfg(feature = "backend-jsonschema")]
pub use jsonschema::{generate_json_schemas, JsonSchemaGenerator, JsonSchemaOptions};
