//! Type resolution: turning parsed type expressions into canonical
//! [`DataType`] values.
//!
//! Resolution is two-pass. A [`DeclIndex`] over every declaration in the
//! file (plus imported names) is built first, so references resolve lazily
//! by name and forward or mutually recursive messages work without eager
//! pointers. The [`Resolver`] then walks each expression recursively.

use std::collections::HashMap;

use crate::classify::{classify, tuple_declared_arity, TypeKind};
use crate::error::CompileError;
use crate::ir::{DataType, Property, Scalar};
use crate::syntax::{Decl, PropSig, SourceModule, TypeExpr, TypeExprKind};

/// What a bare identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Message,
    Union,
}

#[derive(Debug, Clone, Copy)]
pub struct RefEntry {
    pub kind: RefKind,
    pub use_cbor: bool,
}

/// Name-to-declaration index for one schema file.
#[derive(Debug, Default)]
pub struct DeclIndex {
    entries: HashMap<String, RefEntry>,
}

impl DeclIndex {
    /// Index every message and union declared in the module, plus imported
    /// names. Imported messages index without a cbor flag; their
    /// annotations live in the file that declares them.
    pub fn build(module: &SourceModule) -> Self {
        let mut entries = HashMap::new();
        for decl in &module.decls {
            match decl {
                Decl::Message(m) => {
                    entries.insert(
                        m.name.clone(),
                        RefEntry {
                            kind: RefKind::Message,
                            use_cbor: m.tags.has_cbor(),
                        },
                    );
                }
                Decl::Union(u) => {
                    entries.insert(
                        u.name.clone(),
                        RefEntry {
                            kind: RefKind::Union,
                            use_cbor: false,
                        },
                    );
                }
                Decl::Service(_) => {}
            }
        }
        for import in &module.imports {
            for name in &import.names {
                entries.entry(name.clone()).or_insert(RefEntry {
                    kind: RefKind::Message,
                    use_cbor: false,
                });
            }
        }
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<RefEntry> {
        self.entries.get(name).copied()
    }
}

/// Resolves type expressions against a declaration index.
pub struct Resolver<'a> {
    index: &'a DeclIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a DeclIndex) -> Self {
        Self { index }
    }

    /// Resolve one type expression into exactly one canonical [`DataType`].
    ///
    /// Fails fast on the first error; any failure aborts the containing
    /// file's compilation.
    pub fn resolve(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        if expr.text.is_empty() {
            return Err(self.invalid(expr));
        }
        let Some(kind) = classify(expr) else {
            return Err(self.invalid(expr));
        };

        match kind {
            TypeKind::Scalar(scalar) => Ok(DataType::Scalar(scalar)),
            TypeKind::StringLiteral => Ok(DataType::Scalar(Scalar::Str)),
            TypeKind::StructLiteral => self.resolve_struct_literal(expr),
            TypeKind::Reference => self.resolve_reference(expr),
            TypeKind::List => self.resolve_list(expr),
            TypeKind::Map => self.resolve_map(expr),
            TypeKind::Tuple => self.resolve_tuple(expr),
            TypeKind::UnionLiteral => self.resolve_union_literal(expr),
        }
    }

    fn resolve_struct_literal(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        let TypeExprKind::Object(members) = &expr.kind else {
            return Err(self.invalid(expr));
        };
        Ok(DataType::StructLiteral(self.resolve_props(members)?))
    }

    /// Resolve the ordered properties of a message body or inline struct.
    pub fn resolve_props(&self, members: &[PropSig]) -> Result<Vec<Property>, CompileError> {
        members
            .iter()
            .map(|prop| {
                Ok(Property {
                    name: prop.name.clone(),
                    ty: self.resolve(&prop.ty)?,
                    optional: prop.optional,
                })
            })
            .collect()
    }

    fn resolve_reference(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        let TypeExprKind::Name { head, .. } = &expr.kind else {
            return Err(self.invalid(expr));
        };
        match self.index.lookup(head) {
            Some(RefEntry {
                kind: RefKind::Message,
                use_cbor,
            }) => Ok(DataType::Struct {
                name: head.clone(),
                use_cbor,
            }),
            Some(RefEntry {
                kind: RefKind::Union,
                ..
            }) => Ok(DataType::Union { name: head.clone() }),
            None => Err(self.invalid(expr)),
        }
    }

    fn resolve_list(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        match expr.args() {
            [element] => Ok(DataType::List(Box::new(self.resolve(element)?))),
            _ => Err(self.invalid(expr)),
        }
    }

    fn resolve_map(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        let [key, value] = expr.args() else {
            return Err(self.invalid(expr));
        };
        let key_scalar = match classify(key) {
            Some(TypeKind::Scalar(s)) if s.is_map_key() => s,
            _ => {
                return Err(CompileError::InvalidMapKey {
                    text: key.text.clone(),
                    span: key.span.clone(),
                });
            }
        };
        Ok(DataType::Map {
            key: key_scalar,
            value: Box::new(self.resolve(value)?),
        })
    }

    fn resolve_tuple(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        let args = expr.args();
        let arity_ok = (2..=5).contains(&args.len());
        let declared_matches = match &expr.kind {
            TypeExprKind::Name { head, .. } => {
                tuple_declared_arity(head).is_none_or(|n| n == args.len())
            }
            _ => false,
        };
        if !arity_ok || !declared_matches {
            return Err(CompileError::InvalidTupleArity {
                arity: args.len(),
                span: expr.span.clone(),
            });
        }
        let items = args
            .iter()
            .map(|item| self.resolve(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DataType::Tuple(items))
    }

    fn resolve_union_literal(&self, expr: &TypeExpr) -> Result<DataType, CompileError> {
        let TypeExprKind::UnionInline(variants) = &expr.kind else {
            return Err(self.invalid(expr));
        };
        let types = variants
            .iter()
            .map(|v| self.resolve(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DataType::UnionLiteral(types))
    }

    fn invalid(&self, expr: &TypeExpr) -> CompileError {
        CompileError::InvalidDataType {
            text: expr.text.clone(),
            span: expr.span.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;
    use crate::syntax::parse_module;

    /// Parse a single message whose properties provide the expressions under
    /// test, and resolve the named property.
    fn resolve_prop(body: &str, prop: &str) -> Result<DataType, CompileError> {
        let source = format!("type Other = Msg<{{ flag: bool }}>;\ntype Extra = Union<[str, bool]>;\ntype Probe = Msg<{{ {} }}>;", body);
        let module = parse_module("probe/types.ts", &source).expect("parse failed");
        let index = DeclIndex::build(&module);
        let resolver = Resolver::new(&index);
        let Decl::Message(msg) = module
            .decls
            .iter()
            .find(|d| d.name() == "Probe")
            .expect("probe message")
        else {
            panic!("expected message");
        };
        let sig = msg
            .props
            .iter()
            .find(|p| p.name == prop)
            .expect("probe property");
        resolver.resolve(&sig.ty)
    }

    #[test]
    fn scalars_resolve_to_themselves() {
        for scalar in Scalar::ALL {
            let dt = resolve_prop(&format!("value: {}", scalar.tag()), "value").unwrap();
            assert_eq!(dt, DataType::Scalar(scalar));
        }
    }

    #[test]
    fn nested_lists_stay_nested() {
        let dt = resolve_prop("grid: List<List<int8>>", "grid").unwrap();
        let DataType::List(outer) = dt else {
            panic!("expected list");
        };
        let DataType::List(inner) = *outer else {
            panic!("expected nested list, got flattened type");
        };
        assert_eq!(*inner, DataType::Scalar(Scalar::Int8));
    }

    #[test]
    fn map_with_primitive_key() {
        let dt = resolve_prop("counts: Map<str, int8>", "counts").unwrap();
        assert_eq!(
            dt,
            DataType::Map {
                key: Scalar::Str,
                value: Box::new(DataType::Scalar(Scalar::Int8)),
            }
        );
    }

    #[test]
    fn map_with_struct_key_fails() {
        let err = resolve_prop("counts: Map<Other, int8>", "counts").unwrap_err();
        assert!(matches!(err, CompileError::InvalidMapKey { text, .. } if text == "Other"));
    }

    #[test]
    fn map_with_float_key_fails() {
        let err = resolve_prop("counts: Map<float32, int8>", "counts").unwrap_err();
        assert!(matches!(err, CompileError::InvalidMapKey { .. }));
    }

    #[test]
    fn tuple_items_preserve_order() {
        let dt = resolve_prop("triple: Tuple3<int8, int16, uint16>", "triple").unwrap();
        assert_eq!(
            dt,
            DataType::Tuple(vec![
                DataType::Scalar(Scalar::Int8),
                DataType::Scalar(Scalar::Int16),
                DataType::Scalar(Scalar::Uint16),
            ])
        );
    }

    #[test]
    fn tuple_arity_out_of_range() {
        let err = resolve_prop("single: Tuple1<int8>", "single").unwrap_err();
        assert!(matches!(err, CompileError::InvalidTupleArity { arity: 1, .. }));

        let err = resolve_prop(
            "six: Tuple6<int8, int8, int8, int8, int8, int8>",
            "six",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidTupleArity { arity: 6, .. }));
    }

    #[test]
    fn tuple_head_must_match_argument_count() {
        let err = resolve_prop("pair: Tuple3<int8, int8>", "pair").unwrap_err();
        assert!(matches!(err, CompileError::InvalidTupleArity { arity: 2, .. }));
    }

    #[test]
    fn references_resolve_by_kind() {
        let dt = resolve_prop("other: Other", "other").unwrap();
        assert_eq!(
            dt,
            DataType::Struct {
                name: "Other".into(),
                use_cbor: false,
            }
        );

        let dt = resolve_prop("extra: Extra", "extra").unwrap();
        assert_eq!(dt, DataType::Union { name: "Extra".into() });
    }

    #[test]
    fn unknown_reference_fails() {
        let err = resolve_prop("ghost: Missing", "ghost").unwrap_err();
        assert!(matches!(err, CompileError::InvalidDataType { text, .. } if text == "Missing"));
    }

    #[test]
    fn cbor_flag_inherited_from_referenced_message() {
        let source = r#"
            /** @kind cbor */
            type Payload = Msg<{ data: blob }>;
            type Wrapper = Msg<{ payload: Payload }>;
        "#;
        let module = parse_module("probe/types.ts", source).expect("parse failed");
        let index = DeclIndex::build(&module);
        let resolver = Resolver::new(&index);
        let Decl::Message(msg) = &module.decls[1] else {
            panic!("expected message");
        };
        let dt = resolver.resolve(&msg.props[0].ty).unwrap();
        assert_eq!(
            dt,
            DataType::Struct {
                name: "Payload".into(),
                use_cbor: true,
            }
        );
    }

    #[test]
    fn struct_literal_keeps_order_and_optionality() {
        let dt = resolve_prop("coords: { lat: float32; lng?: float32 }", "coords").unwrap();
        let DataType::StructLiteral(props) = dt else {
            panic!("expected struct literal");
        };
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "lat");
        assert!(!props[0].optional);
        assert_eq!(props[1].name, "lng");
        assert!(props[1].optional);
    }

    #[test]
    fn string_literals_resolve_to_str() {
        let dt = resolve_prop(r#"status: "active""#, "status").unwrap();
        assert_eq!(dt, DataType::Scalar(Scalar::Str));
    }

    #[test]
    fn inline_unions_resolve_variants() {
        let dt = resolve_prop("result: Other | str", "result").unwrap();
        assert_eq!(
            dt,
            DataType::UnionLiteral(vec![
                DataType::Struct {
                    name: "Other".into(),
                    use_cbor: false,
                },
                DataType::Scalar(Scalar::Str),
            ])
        );
    }

    #[test]
    fn imported_names_resolve_as_structs() {
        let source = r#"
            import { Remote } from './remote';
            type Wrapper = Msg<{ remote: Remote }>;
        "#;
        let module = parse_module("probe/types.ts", source).expect("parse failed");
        let index = DeclIndex::build(&module);
        let resolver = Resolver::new(&index);
        let Decl::Message(msg) = &module.decls[0] else {
            panic!("expected message");
        };
        let dt = resolver.resolve(&msg.props[0].ty).unwrap();
        assert_eq!(
            dt,
            DataType::Struct {
                name: "Remote".into(),
                use_cbor: false,
            }
        );
    }

    #[test]
    fn empty_expressions_fail() {
        let resolver_index = DeclIndex::default();
        let resolver = Resolver::new(&resolver_index);
        let expr = TypeExpr {
            kind: TypeExprKind::Unsupported,
            text: String::new(),
            span: Span::new("test.ts", 1),
        };
        assert!(matches!(
            resolver.resolve(&expr),
            Err(CompileError::InvalidDataType { .. })
        ));
    }
}
