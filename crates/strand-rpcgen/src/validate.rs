//! Pre-flight structural validation of schema files.
//!
//! Runs before the builder and gathers *all* violations in a file rather
//! than stopping at the first, so the caller gets a complete report. Any
//! violation is fatal for the file; resolution assumes a well-formed shape.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::classify::{classify, is_query_paramable, TypeKind};
use crate::error::{CompileError, Span};
use crate::ir::ServiceKind;
use crate::syntax::{Decl, MethodSig, PropSig, SourceModule, TypeExpr, TypeExprKind};

/// Validate one parsed schema file, collecting every violation.
pub fn validate(module: &SourceModule) -> Vec<CompileError> {
    let mut errors = Vec::new();

    for stray in &module.strays {
        errors.push(CompileError::structural(
            format!(
                "schema files may only contain imports and marker type declarations, found {}",
                stray.construct
            ),
            stray.span.clone(),
        ));
    }

    check_declaration_names(module, &mut errors);

    for decl in &module.decls {
        match decl {
            Decl::Message(msg) => {
                check_member_names("property", msg.props.iter().map(prop_entry), &mut errors);
                for prop in &msg.props {
                    check_body_type(&prop.ty, &mut errors);
                }
            }
            Decl::Union(union) => {
                if union.variants.is_empty() {
                    errors.push(CompileError::structural(
                        format!("union `{}` has no member types", union.name),
                        union.span.clone(),
                    ));
                }
                for variant in &union.variants {
                    check_body_type(variant, &mut errors);
                }
            }
            Decl::Service(svc) => {
                let mut seen = HashSet::new();
                for method in &svc.methods {
                    if !seen.insert(method.name.as_str()) {
                        errors.push(CompileError::structural(
                            format!("duplicate method name `{}`", method.name),
                            method.span.clone(),
                        ));
                    }
                    check_method(method, svc.kind, &mut errors);
                }
            }
        }
    }

    errors
}

fn check_declaration_names(module: &SourceModule, errors: &mut Vec<CompileError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for decl in &module.decls {
        if !seen.insert(decl.name()) {
            errors.push(CompileError::structural(
                format!("duplicate declaration name `{}`", decl.name()),
                decl.span().clone(),
            ));
        }
    }
}

fn check_method(method: &MethodSig, kind: ServiceKind, errors: &mut Vec<CompileError>) {
    if method.ret.is_none() {
        errors.push(CompileError::structural(
            format!("method `{}` is missing a return type", method.name),
            method.span.clone(),
        ));
    }

    check_member_names(
        "parameter",
        method
            .params
            .iter()
            .map(|p| (p.name.as_str(), &p.ty, p.optional, &p.span)),
        errors,
    );

    for param in &method.params {
        match kind {
            ServiceKind::Query => {
                // GET parameters round-trip through the URL query string,
                // so only primitives and lists of primitives are allowed.
                if !is_query_paramable(&param.ty) {
                    errors.push(CompileError::structural(
                        format!(
                            "parameter `{}` of query method `{}` must be a primitive or a list of primitives, found `{}`",
                            param.name, method.name, param.ty.text
                        ),
                        param.span.clone(),
                    ));
                }
            }
            ServiceKind::Mutation => check_body_type(&param.ty, errors),
        }
    }

    if let Some(ret) = &method.ret {
        check_return_type(ret, errors);
    }
}

fn prop_entry(prop: &PropSig) -> (&str, &TypeExpr, bool, &Span) {
    (prop.name.as_str(), &prop.ty, prop.optional, &prop.span)
}

/// Duplicate names within one owner. An exact structural duplicate (same
/// name, type text, optionality) is tolerated and deduplicated later; a
/// repeated name with a different shape is a conflict.
fn check_member_names<'a>(
    what: &str,
    members: impl Iterator<Item = (&'a str, &'a TypeExpr, bool, &'a Span)>,
    errors: &mut Vec<CompileError>,
) {
    let mut seen: HashMap<&str, (&str, bool)> = HashMap::new();
    for (name, ty, optional, span) in members {
        match seen.get(name) {
            None => {
                seen.insert(name, (ty.text.as_str(), optional));
            }
            Some((text, opt)) if *text == ty.text && *opt == optional => {}
            Some(_) => {
                errors.push(CompileError::structural(
                    format!("conflicting declarations of {} `{}`", what, name),
                    span.clone(),
                ));
            }
        }
    }
}

/// Reject returnable-only types (`unit`, `nil`, tuples) everywhere outside
/// method return position, recursing through container and literal shapes.
fn check_body_type(expr: &TypeExpr, errors: &mut Vec<CompileError>) {
    match classify(expr) {
        Some(TypeKind::Scalar(s)) if s.is_returnable_only() => {
            errors.push(CompileError::structural(
                format!("`{}` can only be used as a return type", s.tag()),
                expr.span.clone(),
            ));
        }
        Some(TypeKind::Tuple) => {
            errors.push(CompileError::structural(
                "tuples can only be used as a return type",
                expr.span.clone(),
            ));
        }
        Some(TypeKind::List) => {
            for arg in expr.args() {
                check_body_type(arg, errors);
            }
        }
        Some(TypeKind::Map) => {
            // The key is checked by the resolver; recurse into the value.
            if let [_, value] = expr.args() {
                check_body_type(value, errors);
            }
        }
        Some(TypeKind::StructLiteral) => {
            if let TypeExprKind::Object(members) = &expr.kind {
                for member in members {
                    check_body_type(&member.ty, errors);
                }
            }
        }
        Some(TypeKind::UnionLiteral) => {
            if let TypeExprKind::UnionInline(variants) = &expr.kind {
                for variant in variants {
                    check_body_type(variant, errors);
                }
            }
        }
        // References, string literals, and plain scalars are fine here;
        // unclassifiable expressions are the resolver's to report.
        Some(TypeKind::Scalar(_) | TypeKind::Reference | TypeKind::StringLiteral) | None => {}
    }
}

/// Return position: `unit`, `nil`, and tuples are legal at the top level,
/// but their element types follow the body rules.
fn check_return_type(expr: &TypeExpr, errors: &mut Vec<CompileError>) {
    match classify(expr) {
        Some(TypeKind::Scalar(_)) => {}
        Some(TypeKind::Tuple) => {
            for item in expr.args() {
                check_body_type(item, errors);
            }
        }
        _ => check_body_type(expr, errors),
    }
}
