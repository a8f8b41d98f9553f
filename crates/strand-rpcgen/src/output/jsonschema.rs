//! JSON Schema backend: request/response validation schemas.
//!
//! Emits one draft-07 document per schema file: message and union
//! definitions under `definitions`, plus a request and response schema per
//! service method. Query-method parameters arrive via the URL, so their
//! request schemas validate strings rather than the declared types.

use serde_json::{json, Map, Value};

use crate::generator::{Code, Generator};
use crate::ir::{DataType, HttpMethod, Method, Scalar, Schema, Service};

/// The validation-schema target.
pub struct JsonSchemaGenerator;

impl Generator for JsonSchemaGenerator {
    fn name(&self) -> &'static str {
        "jsonschema"
    }

    fn generate(&self, schema: &Schema) -> Code {
        Code {
            file_name: format!("{}.json", schema.file_name),
            source: generate_json_schemas(schema, &JsonSchemaOptions::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonSchemaOptions {
    /// Pretty-print the emitted document.
    pub pretty: bool,
}

impl Default for JsonSchemaOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Generate the validation document for a compiled schema.
pub fn generate_json_schemas(schema: &Schema, options: &JsonSchemaOptions) -> String {
    let mut definitions = Map::new();
    for message in &schema.messages {
        definitions.insert(
            message.name.clone(),
            object_schema(message.properties.iter()),
        );
    }
    for union in &schema.unions {
        let variants: Vec<Value> = union.types.iter().map(type_schema).collect();
        definitions.insert(union.name.clone(), json!({ "anyOf": variants }));
    }

    let mut requests = Map::new();
    let mut responses = Map::new();
    for service in schema.services() {
        for method in &service.methods {
            let key = format!("{}.{}", service.name, method.name);
            requests.insert(key.clone(), request_schema(service, method));
            responses.insert(key, response_schema(method));
        }
    }

    let document = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": schema.file_name,
        "definitions": Value::Object(definitions),
        "requests": Value::Object(requests),
        "responses": Value::Object(responses),
    });

    if options.pretty {
        serde_json::to_string_pretty(&document).unwrap_or_default()
    } else {
        document.to_string()
    }
}

fn object_schema<'a>(props: impl Iterator<Item = &'a crate::ir::Property>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for prop in props {
        properties.insert(prop.name.clone(), type_schema(&prop.ty));
        if !prop.optional {
            required.push(Value::String(prop.name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    })
}

/// Request body/query schema for one method. GET parameters are validated
/// as the strings they arrive as; POST parameters use the declared types.
fn request_schema(service: &Service, method: &Method) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in &method.params {
        let value = match method.http_method {
            HttpMethod::Get => query_param_schema(&param.ty),
            HttpMethod::Post => type_schema(&param.ty),
        };
        properties.insert(param.name.clone(), value);
        if !param.optional {
            required.push(Value::String(param.name.clone()));
        }
    }
    json!({
        "title": format!("{}.{} request", service.name, method.name),
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    })
}

/// Response schema: void methods have no payload to validate.
fn response_schema(method: &Method) -> Value {
    if method.is_void_return() {
        return json!({});
    }
    json!({
        "title": format!("{} response", method.name),
        "type": "object",
        "properties": { "data": type_schema(&method.return_type) },
        "required": ["data"],
    })
}

fn query_param_schema(ty: &DataType) -> Value {
    match ty {
        DataType::List(_) => json!({ "type": "array", "items": { "type": "string" } }),
        _ => json!({ "type": "string" }),
    }
}

fn type_schema(ty: &DataType) -> Value {
    match ty {
        DataType::Scalar(scalar) => scalar_schema(*scalar),
        DataType::List(element) => json!({ "type": "array", "items": type_schema(element) }),
        DataType::Map { value, .. } => json!({
            "type": "object",
            "additionalProperties": type_schema(value),
        }),
        DataType::Tuple(items) => {
            let schemas: Vec<Value> = items.iter().map(type_schema).collect();
            json!({
                "type": "array",
                "items": schemas,
                "minItems": items.len(),
                "maxItems": items.len(),
            })
        }
        DataType::Struct { name, .. } | DataType::Union { name } => {
            json!({ "$ref": format!("#/definitions/{}", name) })
        }
        DataType::StructLiteral(props) => object_schema(props.iter()),
        DataType::UnionLiteral(types) => {
            let variants: Vec<Value> = types.iter().map(type_schema).collect();
            json!({ "anyOf": variants })
        }
    }
}

fn scalar_schema(scalar: Scalar) -> Value {
    match scalar {
        Scalar::Bool => json!({ "type": "boolean" }),
        s if s.is_integer() => json!({ "type": "integer" }),
        Scalar::Float32 | Scalar::Float64 | Scalar::Timestamp => json!({ "type": "number" }),
        Scalar::Str => json!({ "type": "string" }),
        Scalar::Blob => json!({ "type": "array", "items": { "type": "integer" } }),
        Scalar::Nil => json!({ "type": "null" }),
        // dyn and unit validate anything; unit only occurs in responses.
        _ => json!({}),
    }
}
