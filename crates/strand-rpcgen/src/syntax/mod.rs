//! Schema file front end.
//!
//! Parses schema source (TypeScript type-alias declarations using the
//! `Msg` / `Union` / `Query` / `Mutation` markers) into a lightweight syntax
//! tree. The validator and builder work exclusively on these types; nothing
//! downstream touches the concrete parse tree.

mod typescript;

pub use typescript::parse_module;

use crate::error::Span;
use crate::ir::ServiceKind;

/// One parsed schema file.
#[derive(Debug, Clone)]
pub struct SourceModule {
    /// Path the file was read from, used in error spans.
    pub path: String,
    /// File name without extension.
    pub file_name: String,
    /// Package name derived from the parent directory.
    pub package_name: String,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    /// Top-level constructs the schema language does not allow, plus member
    /// shapes found in the wrong kind of declaration. The validator turns
    /// each one into a structural violation.
    pub strays: Vec<Stray>,
}

/// A construct that has no place in a schema file.
#[derive(Debug, Clone)]
pub struct Stray {
    /// Human-readable description, e.g. "function declaration".
    pub construct: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub names: Vec<String>,
    pub from: String,
    pub span: Span,
}

/// A marker-wrapped type alias declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    Message(MessageDecl),
    Union(UnionDecl),
    Service(ServiceDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Message(m) => &m.name,
            Decl::Union(u) => &u.name,
            Decl::Service(s) => &s.name,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Decl::Message(m) => &m.span,
            Decl::Union(u) => &u.span,
            Decl::Service(s) => &s.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageDecl {
    pub name: String,
    pub props: Vec<PropSig>,
    pub tags: DocTags,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: String,
    pub variants: Vec<TypeExpr>,
    pub tags: DocTags,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ServiceDecl {
    pub name: String,
    pub kind: ServiceKind,
    pub methods: Vec<MethodSig>,
    pub tags: DocTags,
    pub span: Span,
}

/// A property signature inside a message or inline struct literal.
#[derive(Debug, Clone)]
pub struct PropSig {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    pub span: Span,
}

/// A method signature inside a service declaration.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<ParamSig>,
    /// Missing when the method was declared without a return type; the
    /// validator rejects that shape.
    pub ret: Option<TypeExpr>,
    pub tags: DocTags,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParamSig {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    pub span: Span,
}

/// An opaque type expression, carrying enough structure for classification
/// and recursive resolution plus the raw text and location for error
/// messages.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    /// Raw source text, trimmed.
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// A bare or generic identifier: `str`, `Profile`, `List<str>`.
    Name { head: String, args: Vec<TypeExpr> },
    /// An inline object type: `{lat: float32; lng: float32}`.
    Object(Vec<PropSig>),
    /// An inline union: `Profile | str`.
    UnionInline(Vec<TypeExpr>),
    /// A string literal type: `"active"`.
    StringLit(String),
    /// Anything the host grammar allows but the schema language does not.
    Unsupported,
}

impl TypeExpr {
    /// Generic type arguments, empty for non-generic expressions.
    pub fn args(&self) -> &[TypeExpr] {
        match &self.kind {
            TypeExprKind::Name { args, .. } => args,
            _ => &[],
        }
    }
}

/// Doc tags parsed from the JSDoc comment attached to a declaration:
/// `@kind cbor`, `@returns 202`, `@throws 404`.
#[derive(Debug, Clone, Default)]
pub struct DocTags {
    entries: Vec<(String, String)>,
}

impl DocTags {
    /// Parse the tags out of a raw comment. Only `/** ... */` comments carry
    /// tags; everything else yields an empty set.
    pub fn parse(comment: &str) -> Self {
        let mut entries = Vec::new();
        if !comment.starts_with("/**") {
            return Self { entries };
        }
        let inner = comment
            .strip_prefix("/**")
            .and_then(|s| s.strip_suffix("*/"))
            .unwrap_or(comment);
        for line in inner.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            if let Some(rest) = line.strip_prefix('@') {
                let mut parts = rest.splitn(2, char::is_whitespace);
                if let Some(tag) = parts.next() {
                    if tag.is_empty() {
                        continue;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    entries.push((tag.to_string(), value));
                }
            }
        }
        Self { entries }
    }

    /// First value recorded for `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether these tags carry a `@kind cbor` annotation.
    pub fn has_cbor(&self) -> bool {
        self.get("kind")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("cbor"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_doc_tags() {
        let tags = DocTags::parse(
            "/**\n * Fetch a profile.\n * @kind cbor\n * @returns 202\n * @throws 404\n */",
        );
        assert_eq!(tags.get("kind"), Some("cbor"));
        assert_eq!(tags.get("returns"), Some("202"));
        assert_eq!(tags.get("throws"), Some("404"));
        assert_eq!(tags.get("access"), None);
        assert!(tags.has_cbor());
    }

    #[test]
    fn line_comments_carry_no_tags() {
        let tags = DocTags::parse("// @kind cbor");
        assert!(tags.is_empty());
        assert!(!tags.has_cbor());
    }

    #[test]
    fn first_value_wins() {
        let tags = DocTags::parse("/** @returns 201\n * @returns 202 */");
        assert_eq!(tags.get("returns"), Some("201"));
    }

    #[test]
    fn single_line_jsdoc() {
        let tags = DocTags::parse("/** @kind cbor */");
        assert!(tags.has_cbor());
    }
}
