//! Type expression classification.
//!
//! Decides which canonical variant an opaque type expression belongs to,
//! before resolution. The [`TypeKind`]s are mutually exclusive and jointly
//! exhaustive over legal expressions; [`classify`] returning `None` means
//! the expression is a type error, never a silent default.

use crate::ir::Scalar;
use crate::syntax::{TypeExpr, TypeExprKind};

/// The classification of a type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar(Scalar),
    List,
    Map,
    /// Any `Tuple<N>` head, regardless of arity; arity bounds are enforced
    /// by the resolver so out-of-range tuples report a tuple error rather
    /// than a generic type error.
    Tuple,
    /// A bare identifier referencing a declared message or union. Which of
    /// the two it is depends on the declaration index, not the expression.
    Reference,
    StructLiteral,
    UnionLiteral,
    StringLiteral,
}

/// Classify a type expression, or `None` when it matches no variant.
pub fn classify(expr: &TypeExpr) -> Option<TypeKind> {
    match &expr.kind {
        TypeExprKind::StringLit(_) => Some(TypeKind::StringLiteral),
        TypeExprKind::Object(_) => Some(TypeKind::StructLiteral),
        TypeExprKind::UnionInline(_) => Some(TypeKind::UnionLiteral),
        TypeExprKind::Unsupported => None,
        TypeExprKind::Name { head, args } => {
            if args.is_empty() {
                if let Some(scalar) = Scalar::from_tag(head) {
                    Some(TypeKind::Scalar(scalar))
                } else if is_container_head(head) {
                    // A container name with no type arguments is malformed,
                    // not a reference to a declaration.
                    None
                } else {
                    Some(TypeKind::Reference)
                }
            } else {
                match head.as_str() {
                    "List" => Some(TypeKind::List),
                    "Map" => Some(TypeKind::Map),
                    _ if is_tuple_head(head) => Some(TypeKind::Tuple),
                    _ => None,
                }
            }
        }
    }
}

fn is_container_head(head: &str) -> bool {
    head == "List" || head == "Map" || is_tuple_head(head)
}

/// `Tuple` optionally followed by a decimal arity: `Tuple2`, `Tuple5`,
/// also `Tuple9` (so the arity bound produces the right error).
fn is_tuple_head(head: &str) -> bool {
    match head.strip_prefix("Tuple") {
        Some("") => true,
        Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Declared arity of a tuple head (`Tuple3` -> 3), if one was written.
pub fn tuple_declared_arity(head: &str) -> Option<usize> {
    head.strip_prefix("Tuple")?.parse().ok()
}

/// Whether an expression is usable as a query-method parameter: a
/// query-paramable scalar or a `List` of one. Such parameters must
/// round-trip through URL query strings.
pub fn is_query_paramable(expr: &TypeExpr) -> bool {
    match classify(expr) {
        Some(TypeKind::Scalar(s)) => s.is_query_paramable(),
        Some(TypeKind::List) => match expr.args() {
            [element] => matches!(
                classify(element),
                Some(TypeKind::Scalar(s)) if s.is_query_paramable()
            ),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;

    fn name(head: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Name {
                head: head.to_string(),
                args,
            },
            text: head.to_string(),
            span: Span::new("test.ts", 1),
        }
    }

    #[test]
    fn scalars_classify_case_insensitively() {
        for scalar in Scalar::ALL {
            assert_eq!(
                classify(&name(scalar.tag(), Vec::new())),
                Some(TypeKind::Scalar(scalar))
            );
        }
        assert_eq!(
            classify(&name("UINT32", Vec::new())),
            Some(TypeKind::Scalar(Scalar::Uint32))
        );
    }

    #[test]
    fn bare_identifiers_are_references() {
        assert_eq!(classify(&name("Profile", Vec::new())), Some(TypeKind::Reference));
        assert_eq!(classify(&name("string", Vec::new())), Some(TypeKind::Reference));
    }

    #[test]
    fn container_heads() {
        let el = name("int8", Vec::new());
        assert_eq!(classify(&name("List", vec![el.clone()])), Some(TypeKind::List));
        assert_eq!(
            classify(&name("Map", vec![el.clone(), el.clone()])),
            Some(TypeKind::Map)
        );
        assert_eq!(
            classify(&name("Tuple2", vec![el.clone(), el.clone()])),
            Some(TypeKind::Tuple)
        );
        // Out-of-range arity still classifies as a tuple; the resolver
        // reports the arity error.
        assert_eq!(classify(&name("Tuple9", vec![el.clone()])), Some(TypeKind::Tuple));
    }

    #[test]
    fn bare_container_names_are_invalid() {
        assert_eq!(classify(&name("List", Vec::new())), None);
        assert_eq!(classify(&name("Map", Vec::new())), None);
        assert_eq!(classify(&name("Tuple2", Vec::new())), None);
    }

    #[test]
    fn unknown_generics_are_invalid() {
        let el = name("int8", Vec::new());
        assert_eq!(classify(&name("Promise", vec![el])), None);
    }

    #[test]
    fn every_legal_expression_matches_exactly_one_kind() {
        let el = name("int8", Vec::new());
        let exprs = vec![
            name("str", Vec::new()),
            name("Profile", Vec::new()),
            name("List", vec![el.clone()]),
            name("Map", vec![name("str", Vec::new()), el.clone()]),
            name("Tuple2", vec![el.clone(), el.clone()]),
            TypeExpr {
                kind: TypeExprKind::Object(Vec::new()),
                text: "{}".into(),
                span: Span::new("test.ts", 1),
            },
            TypeExpr {
                kind: TypeExprKind::UnionInline(vec![el.clone(), name("str", Vec::new())]),
                text: "int8 | str".into(),
                span: Span::new("test.ts", 1),
            },
            TypeExpr {
                kind: TypeExprKind::StringLit("active".into()),
                text: "\"active\"".into(),
                span: Span::new("test.ts", 1),
            },
        ];

        for expr in &exprs {
            let kind = classify(expr).expect("legal expression must classify");
            let matching = [
                matches!(kind, TypeKind::Scalar(_)),
                kind == TypeKind::List,
                kind == TypeKind::Map,
                kind == TypeKind::Tuple,
                kind == TypeKind::Reference,
                kind == TypeKind::StructLiteral,
                kind == TypeKind::UnionLiteral,
                kind == TypeKind::StringLiteral,
            ]
            .into_iter()
            .filter(|m| *m)
            .count();
            assert_eq!(matching, 1, "expression `{}`", expr.text);
        }
    }

    #[test]
    fn query_paramable_shapes() {
        assert!(is_query_paramable(&name("str", Vec::new())));
        assert!(is_query_paramable(&name("float64", Vec::new())));
        assert!(is_query_paramable(&name(
            "List",
            vec![name("int8", Vec::new())]
        )));

        assert!(!is_query_paramable(&name("blob", Vec::new())));
        assert!(!is_query_paramable(&name("dyn", Vec::new())));
        assert!(!is_query_paramable(&name("Profile", Vec::new())));
        assert!(!is_query_paramable(&name(
            "List",
            vec![name("Profile", Vec::new())]
        )));
        assert!(!is_query_paramable(&name(
            "List",
            vec![name("List", vec![name("int8", Vec::new())])]
        )));
        assert!(!is_query_paramable(&name(
            "Map",
            vec![name("str", Vec::new()), name("int8", Vec::new())]
        )));
    }

    #[test]
    fn tuple_arity_parsing() {
        assert_eq!(tuple_declared_arity("Tuple2"), Some(2));
        assert_eq!(tuple_declared_arity("Tuple5"), Some(5));
        assert_eq!(tuple_declared_arity("Tuple"), None);
        assert_eq!(tuple_declared_arity("List"), None);
    }
}
