//! Go backend: struct definitions and service interfaces.
//!
//! Services become plain interfaces taking a `context.Context`; wiring them
//! into an HTTP framework is left to downstream tooling. Tuples surface as
//! multi-value returns and `unit` as a bare `error`, so every interface
//! method is implementable as ordinary Go.

use std::fmt::Write;

use crate::generator::{Code, Generator};
use crate::ir::{DataType, Method, Property, Scalar, Schema, Service};

/// The Go target. Go file names cannot carry dashes, so `order-items.ts`
/// generates `order_items.go`.
pub struct GoGenerator;

impl Generator for GoGenerator {
    fn name(&self) -> &'static str {
        "go"
    }

    fn generate(&self, schema: &Schema) -> Code {
        Code {
            file_name: format!("{}.go", schema.file_name.replace('-', "_")),
            source: generate_go(schema, &GoOptions::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoOptions {
    /// Package name for the generated file; defaults to the schema's
    /// derived package name.
    pub package: Option<String>,
    /// Emit `json:"..."` struct tags.
    pub json_tags: bool,
    /// Render optional properties and parameters as pointers.
    pub pointer_optionals: bool,
}

impl Default for GoOptions {
    fn default() -> Self {
        Self {
            package: None,
            json_tags: true,
            pointer_optionals: true,
        }
    }
}

impl GoOptions {
    pub fn with_package(package: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            ..Self::default()
        }
    }
}

/// Generate Go source for a compiled schema.
pub fn generate_go(schema: &Schema, options: &GoOptions) -> String {
    let mut w = GoWriter {
        out: String::new(),
        options,
    };
    w.write_schema(schema);
    w.out
}

struct GoWriter<'a> {
    out: String,
    options: &'a GoOptions,
}

impl GoWriter<'_> {
    fn write_schema(&mut self, schema: &Schema) {
        let package = self
            .options
            .package
            .clone()
            .unwrap_or_else(|| schema.package_name.clone());
        let _ = writeln!(self.out, "package {}", package);

        let has_services = schema.services().next().is_some();
        let needs_time = schema_uses(schema, Scalar::Timestamp);
        if has_services || needs_time {
            self.out.push('\n');
            self.out.push_str("import (\n");
            if has_services {
                self.out.push_str("\t\"context\"\n");
            }
            if needs_time {
                self.out.push_str("\t\"time\"\n");
            }
            self.out.push_str(")\n");
        }

        for message in &schema.messages {
            self.out.push('\n');
            let _ = writeln!(self.out, "type {} struct {{", cap_first(&message.name));
            for prop in &message.properties {
                self.write_field(prop);
            }
            self.out.push_str("}\n");
        }

        for union in &schema.unions {
            self.out.push('\n');
            let variants: Vec<String> = union.types.iter().map(go_type).collect();
            let _ = writeln!(
                self.out,
                "// {} is one of: {}",
                cap_first(&union.name),
                variants.join(", ")
            );
            let _ = writeln!(self.out, "type {} = interface{{}}", cap_first(&union.name));
        }

        for service in schema.services() {
            self.write_service(service);
        }
    }

    fn write_field(&mut self, prop: &Property) {
        let pointer = if prop.optional && self.options.pointer_optionals {
            "*"
        } else {
            ""
        };
        let _ = write!(
            self.out,
            "\t{} {}{}",
            cap_first(&prop.name),
            pointer,
            go_type(&prop.ty)
        );
        if self.options.json_tags {
            let _ = write!(self.out, " `json:\"{}\"`", lower_first(&prop.name));
        }
        self.out.push('\n');
    }

    fn write_service(&mut self, service: &Service) {
        self.out.push('\n');
        let _ = writeln!(self.out, "type {} interface {{", cap_first(&service.name));
        for method in &service.methods {
            self.write_method(method);
        }
        self.out.push_str("}\n");
    }

    fn write_method(&mut self, method: &Method) {
        let _ = write!(self.out, "\t{}(ctx context.Context", cap_first(&method.name));
        for param in &method.params {
            let pointer = if param.optional && self.options.pointer_optionals {
                "*"
            } else {
                ""
            };
            let _ = write!(
                self.out,
                ", {} {}{}",
                lower_first(&param.name),
                pointer,
                go_type(&param.ty)
            );
        }
        let _ = writeln!(self.out, ") {}", go_return_type(&method.return_type));
    }
}

/// The Go type for a data type in field or parameter position.
fn go_type(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(scalar) => go_scalar(*scalar).to_string(),
        DataType::List(element) => format!("[]{}", go_type(element)),
        // JSON object keys are strings on the wire, whatever the declared
        // key scalar.
        DataType::Map { value, .. } => format!("map[string]{}", go_type(value)),
        DataType::Tuple(items) => go_multi_return(items),
        DataType::Struct { name, .. } => cap_first(name),
        DataType::StructLiteral(props) => {
            let mut fields = String::new();
            for prop in props {
                let _ = write!(
                    fields,
                    "\n\t\t{} {}{} `json:\"{}\"`",
                    cap_first(&prop.name),
                    if prop.optional { "*" } else { "" },
                    go_type(&prop.ty),
                    lower_first(&prop.name)
                );
            }
            format!("struct {{{}\n\t}}", fields)
        }
        DataType::Union { name } => cap_first(name),
        DataType::UnionLiteral(_) => "interface{}".to_string(),
    }
}

fn go_scalar(scalar: Scalar) -> &'static str {
    match scalar {
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
        Scalar::Str => "string",
        Scalar::Timestamp => "time.Time",
        Scalar::Blob => "[]byte",
        Scalar::Dyn => "interface{}",
        Scalar::Unit => "error",
        Scalar::Nil => "struct{}",
    }
}

/// Return position: `unit` collapses to a bare `error`, tuples fan out into
/// multi-value returns, everything else pairs with an `error`.
fn go_return_type(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(Scalar::Unit) => "error".to_string(),
        DataType::Tuple(items) => go_multi_return(items),
        other => format!("({}, error)", go_type(other)),
    }
}

fn go_multi_return(items: &[DataType]) -> String {
    let mut parts: Vec<String> = items.iter().map(go_type).collect();
    parts.push("error".to_string());
    format!("({})", parts.join(", "))
}

fn schema_uses(schema: &Schema, scalar: Scalar) -> bool {
    fn uses(ty: &DataType, scalar: Scalar) -> bool {
        match ty {
            DataType::Scalar(s) => *s == scalar,
            DataType::List(element) => uses(element, scalar),
            DataType::Map { key, value } => *key == scalar || uses(value, scalar),
            DataType::Tuple(items) => items.iter().any(|i| uses(i, scalar)),
            DataType::StructLiteral(props) => props.iter().any(|p| uses(&p.ty, scalar)),
            DataType::UnionLiteral(types) => types.iter().any(|t| uses(t, scalar)),
            DataType::Struct { .. } | DataType::Union { .. } => false,
        }
    }

    schema
        .messages
        .iter()
        .flat_map(|m| &m.properties)
        .map(|p| &p.ty)
        .chain(schema.unions.iter().flat_map(|u| &u.types))
        .chain(schema.services().flat_map(|svc| {
            svc.methods.iter().flat_map(|m| {
                m.params
                    .iter()
                    .map(|p| &p.ty)
                    .chain(std::iter::once(&m.return_type))
            })
        }))
        .any(|ty| uses(ty, scalar))
}

fn cap_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
