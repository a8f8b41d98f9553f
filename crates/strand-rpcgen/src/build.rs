//! Schema assembly.
//!
//! Turns a validated [`SourceModule`] into its [`Schema`]: resolves every
//! declared type, reads the doc-tag annotations, and derives the per-method
//! HTTP metadata. Must only run on modules the validator accepted; the
//! first type error aborts the whole file.

use crate::error::CompileError;
use crate::ir::{
    is_error_code, is_response_code, Import, Message, Method, Param, Schema, Service, ServiceKind,
    Union, DEFAULT_ERROR_CODE, DEFAULT_RESPONSE_CODE,
};
use crate::resolve::{DeclIndex, Resolver};
use crate::syntax::{
    Decl, DocTags, MessageDecl, MethodSig, ServiceDecl, SourceModule, UnionDecl,
};

/// Build the schema for one validated module.
pub fn build(module: &SourceModule) -> Result<Schema, CompileError> {
    let index = DeclIndex::build(module);
    let resolver = Resolver::new(&index);

    let mut messages = Vec::new();
    let mut unions = Vec::new();
    let mut query_services = Vec::new();
    let mut mutation_services = Vec::new();

    for decl in &module.decls {
        match decl {
            Decl::Message(msg) => messages.push(build_message(msg, &resolver)?),
            Decl::Union(union) => unions.push(build_union(union, &resolver)?),
            Decl::Service(svc) => {
                let service = build_service(svc, &resolver)?;
                match service.kind {
                    ServiceKind::Query => query_services.push(service),
                    ServiceKind::Mutation => mutation_services.push(service),
                }
            }
        }
    }

    Ok(Schema {
        package_name: module.package_name.clone(),
        file_name: module.file_name.clone(),
        imports: module
            .imports
            .iter()
            .map(|imp| Import {
                message_names: imp.names.clone(),
                file_name: imp.from.clone(),
            })
            .collect(),
        messages,
        unions,
        query_services,
        mutation_services,
    })
}

fn build_message(decl: &MessageDecl, resolver: &Resolver<'_>) -> Result<Message, CompileError> {
    let mut properties = resolver.resolve_props(&decl.props)?;
    dedup_in_place(&mut properties);
    Ok(Message {
        name: decl.name.clone(),
        properties,
    })
}

fn build_union(decl: &UnionDecl, resolver: &Resolver<'_>) -> Result<Union, CompileError> {
    let types = decl
        .variants
        .iter()
        .map(|variant| resolver.resolve(variant))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Union {
        name: decl.name.clone(),
        types,
    })
}

fn build_service(decl: &ServiceDecl, resolver: &Resolver<'_>) -> Result<Service, CompileError> {
    let use_cbor = decl.tags.has_cbor();
    let methods = decl
        .methods
        .iter()
        .map(|method| build_method(method, decl.kind, use_cbor, resolver))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Service {
        name: decl.name.clone(),
        kind: decl.kind,
        methods,
        use_cbor,
    })
}

fn build_method(
    sig: &MethodSig,
    kind: ServiceKind,
    service_cbor: bool,
    resolver: &Resolver<'_>,
) -> Result<Method, CompileError> {
    let ret = sig.ret.as_ref().ok_or_else(|| {
        CompileError::structural(
            format!("method `{}` is missing a return type", sig.name),
            sig.span.clone(),
        )
    })?;

    let mut params = sig
        .params
        .iter()
        .map(|param| {
            Ok(Param {
                name: param.name.clone(),
                ty: resolver.resolve(&param.ty)?,
                optional: param.optional,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;
    dedup_in_place(&mut params);

    Ok(Method {
        name: sig.name.clone(),
        params,
        return_type: resolver.resolve(ret)?,
        http_method: kind.http_method(),
        response_code: annotated_code(&sig.tags, "returns", is_response_code, DEFAULT_RESPONSE_CODE),
        error_code: annotated_code(&sig.tags, "throws", is_error_code, DEFAULT_ERROR_CODE),
        use_cbor: service_cbor || sig.tags.has_cbor(),
    })
}

/// Parse a `@returns`/`@throws` code. Annotations are best-effort: a missing,
/// malformed, or out-of-range value silently falls back to the default.
fn annotated_code(tags: &DocTags, tag: &str, legal: fn(u16) -> bool, default: u16) -> u16 {
    tags.get(tag)
        .and_then(|value| value.split_whitespace().next())
        .and_then(|token| token.parse::<u16>().ok())
        .filter(|code| legal(*code))
        .unwrap_or(default)
}

/// Drop exact structural duplicates, preserving first-occurrence order.
/// Guards against duplicate nodes from the front end; conflicting
/// same-named members were already rejected by the validator.
fn dedup_in_place<T: PartialEq>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}
