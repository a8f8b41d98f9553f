//! RPC schema compilation and polyglot stub generation.
//!
//! `strand-rpcgen` parses statically-typed schema files describing RPC
//! services and message types, builds a normalized schema representation,
//! and drives pluggable backends that render server contracts, client
//! types, and request/response validation schemas.
//!
//! # Architecture
//!
//! ```text
//! Schema Files            IR               Output Backends
//! ─────────────       ─────────────    ───────────────────────
//! profile.ts     ─┐                 ┌─> Go types + interfaces
//! orders.ts      ─┼─> Schema ───────┼─> TypeScript types
//! ...            ─┘    (ir.rs)      └─> JSON Schema validators
//! ```
//!
//! Each file runs through a fixed pipeline: the front end (`syntax`) lowers
//! the source into a small syntax tree, the validator rejects structurally
//! broken files with a complete report, and the builder resolves every type
//! expression into the closed [`DataType`](ir::DataType) set. A file either
//! compiles fully or contributes nothing; there is no partial schema.
//!
//! # Example
//!
//! ```
//! use strand_rpcgen::{compile, Source};
//!
//! let source = Source::new(
//!     "accounts/profile.ts",
//!     r#"
//!     type Profile = Msg<{ name: str; age?: uint8 }>;
//!     type ProfileQuery = Query<{ getProfile(id: str): Profile }>;
//!     "#,
//! );
//!
//! let schemas = compile(&[source]).unwrap();
//! assert_eq!(schemas[0].messages[0].name, "Profile");
//! assert_eq!(schemas[0].query_services[0].methods[0].name, "getProfile");
//! ```
//!
//! # Selecting a Generator
//!
//! ```ignore
//! use strand_rpcgen::{generator, generators};
//!
//! for target in generators() {
//!     println!("target: {}", target.name());
//! }
//!
//! if let Some(go) = generator("go") {
//!     let code = go.generate(&schema);
//!     std::fs::write(&code.file_name, &code.source)?;
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `backend-go` - Go structs and service interfaces
//! - `backend-typescript` - TypeScript interfaces and service contracts
//! - `backend-jsonschema` - request/response JSON Schema validators

pub mod build;
pub mod classify;
pub mod error;
pub mod generator;
pub mod ir;
pub mod output;
pub mod resolve;
pub mod syntax;
pub mod validate;

use std::path::PathBuf;

// Re-export commonly used items
pub use error::{CompileError, Span};
pub use ir::{DataType, Scalar, Schema};
pub use syntax::parse_module;

// Re-export generator selection
pub use generator::{generator, generators, Code, Generator};

// Re-export generators
#[cfg(feature = "backend-go")]
pub use output::generate_go;

#[cfg(feature = "backend-typescript")]
pub use output::generate_typescript;

#[cfg(feature = "backend-jsonschema")]
pub use output::generate_json_schemas;

/// One schema source file handed to [`compile`].
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Compile a batch of schema files.
///
/// Every file is attempted independently: a file with errors contributes
/// its full error report, sibling files are unaffected. A non-empty error
/// set means zero schemas are returned for the whole batch.
pub fn compile(sources: &[Source]) -> Result<Vec<Schema>, Vec<CompileError>> {
    let mut schemas = Vec::new();
    let mut errors = Vec::new();

    for source in sources {
        let module = match syntax::parse_module(&source.path, &source.text) {
            Ok(module) => module,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };

        let violations = validate::validate(&module);
        if !violations.is_empty() {
            errors.extend(violations);
            continue;
        }

        match build::build(&module) {
            Ok(schema) => schemas.push(schema),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(schemas)
    } else {
        Err(errors)
    }
}
