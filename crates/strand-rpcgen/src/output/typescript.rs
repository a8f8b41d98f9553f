//! TypeScript backend: interfaces for messages, type aliases for unions,
//! and service contract interfaces with promised returns.

use std::fmt::Write;

use crate::generator::{Code, Generator};
use crate::ir::{DataType, Method, Scalar, Schema, Union};

/// The TypeScript target.
pub struct TypeScriptGenerator;

impl Generator for TypeScriptGenerator {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn generate(&self, schema: &Schema) -> Code {
        Code {
            file_name: format!("{}.ts", schema.file_name),
            source: generate_typescript(schema, &TypeScriptOptions::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeScriptOptions {
    /// Prefix declarations with `export`.
    pub export: bool,
    /// Mark interface fields `readonly`.
    pub readonly: bool,
}

impl Default for TypeScriptOptions {
    fn default() -> Self {
        Self {
            export: true,
            readonly: false,
        }
    }
}

/// Generate TypeScript source for a compiled schema.
pub fn generate_typescript(schema: &Schema, options: &TypeScriptOptions) -> String {
    let mut out = String::new();
    let export = if options.export { "export " } else { "" };
    let readonly = if options.readonly { "readonly " } else { "" };
    let mut first = true;

    for message in &schema.messages {
        if !first {
            out.push('\n');
        }
        first = false;
        let _ = writeln!(out, "{}interface {} {{", export, message.name);
        for prop in &message.properties {
            let _ = writeln!(
                out,
                "  {}{}{}: {};",
                readonly,
                prop.name,
                if prop.optional { "?" } else { "" },
                ts_type(&prop.ty)
            );
        }
        out.push_str("}\n");
    }

    for union in &schema.unions {
        if !first {
            out.push('\n');
        }
        first = false;
        write_union(&mut out, union, export);
    }

    for service in schema.services() {
        if !first {
            out.push('\n');
        }
        first = false;
        let _ = writeln!(out, "{}interface {} {{", export, service.name);
        for method in &service.methods {
            write_method(&mut out, method);
        }
        out.push_str("}\n");
    }

    out
}

fn write_union(out: &mut String, union: &Union, export: &str) {
    let variants: Vec<String> = union.types.iter().map(ts_type).collect();
    let _ = writeln!(out, "{}type {} = {};", export, union.name, variants.join(" | "));
}

fn write_method(out: &mut String, method: &Method) {
    let _ = write!(out, "  {}(", method.name);
    for (i, param) in method.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(
            out,
            "{}{}: {}",
            param.name,
            if param.optional { "?" } else { "" },
            ts_type(&param.ty)
        );
    }
    let ret = if method.is_void_return() {
        "void".to_string()
    } else {
        ts_type(&method.return_type)
    };
    let _ = writeln!(out, "): Promise<{}>;", ret);
}

/// The TypeScript type for a data type. Everything numeric is `number`;
/// timestamps travel as epoch seconds.
fn ts_type(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(scalar) => ts_scalar(*scalar).to_string(),
        DataType::List(element) => {
            let inner = ts_type(element);
            if matches!(element.as_ref(), DataType::UnionLiteral(_)) {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        }
        DataType::Map { value, .. } => format!("Record<string, {}>", ts_type(value)),
        DataType::Tuple(items) => {
            let parts: Vec<String> = items.iter().map(ts_type).collect();
            format!("[{}]", parts.join(", "))
        }
        DataType::Struct { name, .. } => name.clone(),
        DataType::StructLiteral(props) => {
            let mut fields = Vec::new();
            for prop in props {
                fields.push(format!(
                    "{}{}: {}",
                    prop.name,
                    if prop.optional { "?" } else { "" },
                    ts_type(&prop.ty)
                ));
            }
            format!("{{ {} }}", fields.join("; "))
        }
        DataType::Union { name } => name.clone(),
        DataType::UnionLiteral(types) => {
            let parts: Vec<String> = types.iter().map(ts_type).collect();
            parts.join(" | ")
        }
    }
}

fn ts_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "boolean",
        Scalar::Int8
        | Scalar::Uint8
        | Scalar::Int16
        | Scalar::Uint16
        | Scalar::Int32
        | Scalar::Uint32
        | Scalar::Int64
        | Scalar::Uint64
        | Scalar::Float32
        | Scalar::Float64
        | Scalar::Timestamp => "number",
        Scalar::Str => "string",
        Scalar::Blob => "number[]",
        Scalar::Dyn => "any",
        Scalar::Unit => "void",
        Scalar::Nil => "null",
    }
}
