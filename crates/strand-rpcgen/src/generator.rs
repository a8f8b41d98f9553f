//! Generator selection.
//!
//! Each output backend exposes a `generate_*` function with options, plus a
//! [`Generator`] implementation that pairs default-option rendering with the
//! target's output file name. Callers pick targets by name the way a build
//! command selects a code generation plugin, and write the resulting
//! [`Code`] values to disk.

use crate::ir::Schema;

/// One generated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// File name the source should be written to, derived from the schema
    /// file name (e.g. `order_items.go` for `order-items.ts`).
    pub file_name: String,
    pub source: String,
}

/// A code generation target.
pub trait Generator: Send + Sync {
    /// Target identifier (e.g. "go", "typescript", "jsonschema").
    fn name(&self) -> &'static str;

    /// Render one schema into its output file.
    fn generate(&self, schema: &Schema) -> Code;
}

/// The generators compiled into this build.
pub fn generators() -> Vec<&'static dyn Generator> {
    let mut all: Vec<&'static dyn Generator> = Vec::new();

    #[cfg(feature = "backend-go")]
    all.push(&crate::output::go::GoGenerator);

    #[cfg(feature = "backend-typescript")]
    all.push(&crate::output::typescript::TypeScriptGenerator);

    #[cfg(feature = "backend-jsonschema")]
    all.push(&crate::output::jsonschema::JsonSchemaGenerator);

    all
}

/// Look up a generator by target name.
pub fn generator(name: &str) -> Option<&'static dyn Generator> {
    generators().into_iter().find(|g| g.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_schema(file_name: &str) -> Schema {
        Schema {
            package_name: "orders".into(),
            file_name: file_name.into(),
            imports: Vec::new(),
            messages: Vec::new(),
            unions: Vec::new(),
            query_services: Vec::new(),
            mutation_services: Vec::new(),
        }
    }

    #[test]
    fn builtin_generators_are_listed() {
        let names: Vec<_> = generators().iter().map(|g| g.name()).collect();
        #[cfg(feature = "backend-go")]
        assert!(names.contains(&"go"));
        #[cfg(feature = "backend-typescript")]
        assert!(names.contains(&"typescript"));
        #[cfg(feature = "backend-jsonschema")]
        assert!(names.contains(&"jsonschema"));
    }

    #[test]
    fn unknown_target_is_none() {
        assert!(generator("fortran").is_none());
    }

    #[cfg(feature = "backend-go")]
    #[test]
    fn go_output_file_names_use_underscores() {
        let schema = empty_schema("order-items");
        let code = generator("go").expect("go generator").generate(&schema);
        assert_eq!(code.file_name, "order_items.go");
        assert!(code.source.starts_with("package orders"));
    }

    #[cfg(feature = "backend-typescript")]
    #[test]
    fn typescript_output_file_name() {
        let schema = empty_schema("profile");
        let code = generator("typescript")
            .expect("typescript generator")
            .generate(&schema);
        assert_eq!(code.file_name, "profile.ts");
    }
}
