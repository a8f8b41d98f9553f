//! Tree-sitter extraction of schema declarations.
//!
//! Schema files are parsed with the TypeScript grammar; this module lowers
//! the concrete tree into the [`SourceModule`](super::SourceModule) syntax
//! tree. Constructs the schema language does not allow are collected as
//! strays rather than dropped, so the validator can report them.

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::{
    Decl, DocTags, ImportDecl, MessageDecl, MethodSig, ParamSig, PropSig, ServiceDecl,
    SourceModule, Stray, TypeExpr, TypeExprKind, UnionDecl,
};
use crate::error::{CompileError, Span};
use crate::ir::ServiceKind;

/// Parse one schema file into its syntax tree.
pub fn parse_module(path: impl AsRef<Path>, source: &str) -> Result<SourceModule, CompileError> {
    let path = path.as_ref();
    let file = path.to_string_lossy().into_owned();

    let mut parser = Parser::new();
    parser
        .set_language(&arborium_typescript::language().into())
        .map_err(|e| CompileError::Parse {
            message: format!("tree-sitter init: {}", e),
            file: file.clone(),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| CompileError::Parse {
        message: "failed to parse schema source".into(),
        file: file.clone(),
    })?;

    let mut ctx = ExtractContext::new(source, &file);
    ctx.extract_root(tree.root_node());

    Ok(SourceModule {
        path: file.clone(),
        file_name: file_stem(path),
        package_name: package_name(path),
        imports: ctx.imports,
        decls: ctx.decls,
        strays: ctx.strays,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".into())
}

/// Package name for generated code, taken from the schema file's parent
/// directory and sanitized to a plain identifier.
fn package_name(path: &Path) -> String {
    let dir = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = String::new();
    for ch in dir.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        return "schema".into();
    }
    if out.as_bytes()[0].is_ascii_digit() {
        out.insert(0, '_');
    }
    out
}

struct ExtractContext<'a> {
    source: &'a str,
    file: &'a str,
    imports: Vec<ImportDecl>,
    decls: Vec<Decl>,
    strays: Vec<Stray>,
}

impl<'a> ExtractContext<'a> {
    fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source,
            file,
            imports: Vec::new(),
            decls: Vec::new(),
            strays: Vec::new(),
        }
    }

    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn span(&self, node: Node) -> Span {
        Span::new(self.file, node.start_position().row as u32 + 1)
    }

    fn stray(&mut self, construct: impl Into<String>, node: Node) {
        self.strays.push(Stray {
            construct: construct.into(),
            span: self.span(node),
        });
    }

    fn extract_root(&mut self, root: Node) {
        let mut pending: Option<DocTags> = None;
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if !child.is_named() {
                continue;
            }
            match child.kind() {
                "comment" => {
                    pending = Some(DocTags::parse(self.node_text(child)));
                    continue;
                }
                "import_statement" => self.extract_import(child),
                "type_alias_declaration" => {
                    let tags = pending.take().unwrap_or_default();
                    self.extract_alias(child, tags);
                }
                "export_statement" => {
                    let tags = pending.take().unwrap_or_default();
                    match child.child_by_field_name("declaration") {
                        Some(decl) if decl.kind() == "type_alias_declaration" => {
                            self.extract_alias(decl, tags);
                        }
                        Some(decl) => self.stray(construct_label(decl.kind()), decl),
                        None => self.stray("export statement", child),
                    }
                }
                "empty_statement" => {}
                kind => self.stray(construct_label(kind), child),
            }
            pending = None;
        }
    }

    fn extract_import(&mut self, node: Node) {
        let from = node
            .child_by_field_name("source")
            .map(|s| self.string_value(s))
            .unwrap_or_default();

        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "import_clause" {
                collect_import_names(self, child, &mut names);
            }
        }

        self.imports.push(ImportDecl {
            names,
            from,
            span: self.span(node),
        });
    }

    fn extract_alias(&mut self, node: Node, tags: DocTags) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.stray("type alias without a name", node);
            return;
        };
        let name = self.node_text(name_node).trim().to_string();

        let Some(value) = node.child_by_field_name("value") else {
            self.stray("type alias without a schema marker", node);
            return;
        };
        if value.kind() != "generic_type" {
            self.stray("type alias without a schema marker", node);
            return;
        }

        let head = self.generic_head(value);
        let args = self.generic_arg_nodes(value);
        let span = self.span(node);

        match head.as_str() {
            "Msg" => match args.first() {
                Some(body) if body.kind() == "object_type" => {
                    let props = self.extract_props(*body, "message");
                    self.decls.push(Decl::Message(MessageDecl {
                        name,
                        props,
                        tags,
                        span,
                    }));
                }
                _ => self.stray("message declaration without an object body", node),
            },
            "Union" => match args.first() {
                Some(arg) => {
                    let variants = self.extract_union_variants(*arg);
                    self.decls.push(Decl::Union(UnionDecl {
                        name,
                        variants,
                        tags,
                        span,
                    }));
                }
                None => self.stray("union declaration without member types", node),
            },
            "Query" | "Mutation" => {
                let kind = if head == "Query" {
                    ServiceKind::Query
                } else {
                    ServiceKind::Mutation
                };
                match args.first() {
                    Some(body) if body.kind() == "object_type" => {
                        let methods = self.extract_methods(*body);
                        self.decls.push(Decl::Service(ServiceDecl {
                            name,
                            kind,
                            methods,
                            tags,
                            span,
                        }));
                    }
                    _ => self.stray("service declaration without an object body", node),
                }
            }
            _ => self.stray("type alias without a schema marker", node),
        }
    }

    /// Head identifier of a generic type, with any module qualifier
    /// (`rpc.Msg`) reduced to its last segment.
    fn generic_head(&self, node: Node) -> String {
        let text = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n))
            .unwrap_or("");
        text.rsplit('.').next().unwrap_or("").trim().to_string()
    }

    fn generic_arg_nodes<'tree>(&self, node: Node<'tree>) -> Vec<Node<'tree>> {
        let mut out = Vec::new();
        if let Some(args) = node.child_by_field_name("type_arguments") {
            let mut cursor = args.walk();
            for child in args.children(&mut cursor) {
                if child.is_named() {
                    out.push(child);
                }
            }
        }
        out
    }

    fn extract_props(&mut self, body: Node, owner: &str) -> Vec<PropSig> {
        let mut props = Vec::new();
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "property_signature" => {
                    if let Some(prop) = self.extract_prop(child) {
                        props.push(prop);
                    }
                }
                "method_signature" => {
                    self.stray(format!("method in {} declaration", owner), child);
                }
                _ => {}
            }
        }
        props
    }

    fn extract_prop(&mut self, node: Node) -> Option<PropSig> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node).trim().to_string();
        let optional = self.has_question_mark(node);
        let span = self.span(node);

        let ty = match node
            .child_by_field_name("type")
            .and_then(|ann| self.annotation_type(ann))
        {
            Some(ty_node) => self.extract_type(ty_node),
            None => {
                self.stray(format!("property `{}` without a type annotation", name), node);
                TypeExpr {
                    kind: TypeExprKind::Unsupported,
                    text: String::new(),
                    span: span.clone(),
                }
            }
        };

        Some(PropSig {
            name,
            ty,
            optional,
            span,
        })
    }

    fn extract_methods(&mut self, body: Node) -> Vec<MethodSig> {
        let mut methods = Vec::new();
        let mut pending: Option<DocTags> = None;
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    pending = Some(DocTags::parse(self.node_text(child)));
                    continue;
                }
                "method_signature" => {
                    let tags = pending.take().unwrap_or_default();
                    if let Some(method) = self.extract_method(child, tags) {
                        methods.push(method);
                    }
                }
                "property_signature" => {
                    self.stray("non-method member in service declaration", child);
                }
                _ => {}
            }
            pending = None;
        }
        methods
    }

    fn extract_method(&mut self, node: Node, tags: DocTags) -> Option<MethodSig> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node).trim().to_string();
        let span = self.span(node);

        let params = match node.child_by_field_name("parameters") {
            Some(list) => self.extract_params(list),
            None => Vec::new(),
        };

        let ret = node
            .child_by_field_name("return_type")
            .and_then(|ann| self.annotation_type(ann))
            .map(|ty_node| self.extract_type(ty_node));

        Some(MethodSig {
            name,
            params,
            ret,
            tags,
            span,
        })
    }

    fn extract_params(&mut self, list: Node) -> Vec<ParamSig> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            let optional = match child.kind() {
                "required_parameter" => false,
                "optional_parameter" => true,
                _ => continue,
            };
            let name = child
                .child_by_field_name("pattern")
                .map(|p| self.node_text(p).trim().to_string())
                .unwrap_or_default();
            let span = self.span(child);

            let ty = match child
                .child_by_field_name("type")
                .and_then(|ann| self.annotation_type(ann))
            {
                Some(ty_node) => self.extract_type(ty_node),
                None => {
                    self.stray(
                        format!("parameter `{}` without a type annotation", name),
                        child,
                    );
                    TypeExpr {
                        kind: TypeExprKind::Unsupported,
                        text: String::new(),
                        span: span.clone(),
                    }
                }
            };

            params.push(ParamSig {
                name,
                ty,
                optional,
                span,
            });
        }
        params
    }

    /// Union declaration members: `Union<[A, B]>` (array form) or
    /// `Union<A | B>`; a single type is a one-variant union.
    fn extract_union_variants(&mut self, arg: Node) -> Vec<TypeExpr> {
        match arg.kind() {
            "tuple_type" => {
                let mut out = Vec::new();
                let mut cursor = arg.walk();
                for child in arg.children(&mut cursor) {
                    if child.is_named() {
                        out.push(self.extract_type(child));
                    }
                }
                out
            }
            "union_type" => {
                let mut out = Vec::new();
                self.flatten_union(arg, &mut out);
                out
            }
            _ => vec![self.extract_type(arg)],
        }
    }

    /// The type node inside a `: T` annotation.
    fn annotation_type<'tree>(&self, annotation: Node<'tree>) -> Option<Node<'tree>> {
        let mut cursor = annotation.walk();
        annotation.children(&mut cursor).find(|c| c.is_named())
    }

    fn has_question_mark(&self, node: Node) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() && self.node_text(child) == "?" {
                return true;
            }
        }
        false
    }

    fn extract_type(&mut self, node: Node) -> TypeExpr {
        let text = self.node_text(node).trim().to_string();
        let span = self.span(node);

        let kind = match node.kind() {
            "type_identifier" | "predefined_type" => TypeExprKind::Name {
                head: text.clone(),
                args: Vec::new(),
            },
            "nested_type_identifier" => TypeExprKind::Name {
                head: text.rsplit('.').next().unwrap_or("").trim().to_string(),
                args: Vec::new(),
            },
            "generic_type" => {
                let head = self.generic_head(node);
                let args = self
                    .generic_arg_nodes(node)
                    .into_iter()
                    .map(|arg| self.extract_type(arg))
                    .collect();
                TypeExprKind::Name { head, args }
            }
            "object_type" => TypeExprKind::Object(self.extract_props(node, "inline struct")),
            "union_type" => {
                let mut variants = Vec::new();
                self.flatten_union(node, &mut variants);
                TypeExprKind::UnionInline(variants)
            }
            "literal_type" => match self.string_literal_value(node) {
                Some(value) => TypeExprKind::StringLit(value),
                None => TypeExprKind::Unsupported,
            },
            "parenthesized_type" => {
                let mut cursor = node.walk();
                let inner = node.children(&mut cursor).find(|c| c.is_named());
                match inner {
                    Some(inner) => return self.extract_type(inner),
                    None => TypeExprKind::Unsupported,
                }
            }
            _ => TypeExprKind::Unsupported,
        };

        TypeExpr { kind, text, span }
    }

    fn flatten_union(&mut self, node: Node, out: &mut Vec<TypeExpr>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() {
                continue;
            }
            if child.kind() == "union_type" {
                self.flatten_union(child, out);
            } else {
                out.push(self.extract_type(child));
            }
        }
    }

    fn string_literal_value(&self, node: Node) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "string" {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    if inner.kind() == "string_fragment" {
                        return Some(self.node_text(inner).to_string());
                    }
                }
                // Empty string literal: no fragment, just quotes.
                let text = self.node_text(child);
                if text.len() >= 2 {
                    return Some(text[1..text.len() - 1].to_string());
                }
            }
        }
        None
    }

    fn string_value(&self, node: Node) -> String {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "string_fragment" {
                return self.node_text(child).to_string();
            }
        }
        let text = self.node_text(node);
        if text.len() >= 2 && (text.starts_with('"') || text.starts_with('\'')) {
            text[1..text.len() - 1].to_string()
        } else {
            text.to_string()
        }
    }
}

fn collect_import_names(ctx: &ExtractContext<'_>, clause: Node, names: &mut Vec<String>) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "import_specifier" {
                        if let Some(name) = spec.child_by_field_name("name") {
                            names.push(ctx.node_text(name).trim().to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn construct_label(kind: &str) -> String {
    match kind {
        "expression_statement" => "executable statement".into(),
        "lexical_declaration" | "variable_declaration" => "variable declaration".into(),
        _ => kind.replace('_', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TypeExprKind;

    fn parse(source: &str) -> SourceModule {
        parse_module("accounts/profile.ts", source).expect("parse failed")
    }

    #[test]
    fn message_with_properties() {
        let module = parse(
            r#"
            type Profile = Msg<{
                name: str;
                age?: uint8;
            }>;
            "#,
        );
        assert_eq!(module.file_name, "profile");
        assert_eq!(module.package_name, "accounts");
        assert_eq!(module.decls.len(), 1);
        let Decl::Message(msg) = &module.decls[0] else {
            panic!("expected message");
        };
        assert_eq!(msg.name, "Profile");
        assert_eq!(msg.props.len(), 2);
        assert_eq!(msg.props[0].name, "name");
        assert!(!msg.props[0].optional);
        assert_eq!(msg.props[1].name, "age");
        assert!(msg.props[1].optional);
    }

    #[test]
    fn exported_and_qualified_markers() {
        let module = parse(
            r#"
            export type Profile = rpc.Msg<{
                name: str;
            }>;
            "#,
        );
        assert_eq!(module.decls.len(), 1);
        assert!(matches!(&module.decls[0], Decl::Message(m) if m.name == "Profile"));
    }

    #[test]
    fn service_with_methods_and_tags() {
        let module = parse(
            r#"
            /** @kind cbor */
            type ProfileQuery = Query<{
                /**
                 * @returns 202
                 * @throws 404
                 */
                getProfile(id: str): Profile;
                listProfiles(): List<Profile>;
            }>;
            "#,
        );
        let Decl::Service(svc) = &module.decls[0] else {
            panic!("expected service");
        };
        assert_eq!(svc.kind, ServiceKind::Query);
        assert!(svc.tags.has_cbor());
        assert_eq!(svc.methods.len(), 2);

        let get = &svc.methods[0];
        assert_eq!(get.name, "getProfile");
        assert_eq!(get.tags.get("returns"), Some("202"));
        assert_eq!(get.tags.get("throws"), Some("404"));
        assert_eq!(get.params.len(), 1);
        assert_eq!(get.params[0].name, "id");
        assert!(get.ret.is_some());

        let list = &svc.methods[1];
        assert!(list.tags.is_empty());
        assert!(list.params.is_empty());
    }

    #[test]
    fn union_array_form() {
        let module = parse(r#"type Result = Union<[Profile, str]>;"#);
        let Decl::Union(u) = &module.decls[0] else {
            panic!("expected union");
        };
        assert_eq!(u.variants.len(), 2);
        assert_eq!(u.variants[0].text, "Profile");
        assert_eq!(u.variants[1].text, "str");
    }

    #[test]
    fn union_pipe_form() {
        let module = parse(r#"type Result = Union<Profile | str | bool>;"#);
        let Decl::Union(u) = &module.decls[0] else {
            panic!("expected union");
        };
        assert_eq!(u.variants.len(), 3);
    }

    #[test]
    fn generic_type_arguments_nest() {
        let module = parse(r#"type Holder = Msg<{ grid: Map<str, List<int8>> }>;"#);
        let Decl::Message(msg) = &module.decls[0] else {
            panic!("expected message");
        };
        let ty = &msg.props[0].ty;
        let TypeExprKind::Name { head, args } = &ty.kind else {
            panic!("expected name expr");
        };
        assert_eq!(head, "Map");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].text, "str");
        let TypeExprKind::Name { head, args } = &args[1].kind else {
            panic!("expected name expr");
        };
        assert_eq!(head, "List");
        assert_eq!(args[0].text, "int8");
    }

    #[test]
    fn inline_struct_literal() {
        let module = parse(r#"type Place = Msg<{ coords: { lat: float32; lng: float32 } }>;"#);
        let Decl::Message(msg) = &module.decls[0] else {
            panic!("expected message");
        };
        let TypeExprKind::Object(props) = &msg.props[0].ty.kind else {
            panic!("expected object expr");
        };
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "lat");
    }

    #[test]
    fn imports_are_collected() {
        let module = parse(
            r#"
            import { Profile, Account } from './accounts';
            type Wrapper = Msg<{ profile: Profile }>;
            "#,
        );
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].names, vec!["Profile", "Account"]);
        assert_eq!(module.imports[0].from, "./accounts");
    }

    #[test]
    fn free_functions_become_strays() {
        let module = parse(
            r#"
            const helper = () => 1;
            function doThings() {}
            type Profile = Msg<{ name: str }>;
            "#,
        );
        assert_eq!(module.decls.len(), 1);
        assert_eq!(module.strays.len(), 2);
        assert_eq!(module.strays[0].construct, "variable declaration");
        assert_eq!(module.strays[1].construct, "function declaration");
    }

    #[test]
    fn unmarked_alias_is_a_stray() {
        let module = parse(r#"type Alias = str;"#);
        assert!(module.decls.is_empty());
        assert_eq!(module.strays.len(), 1);
        assert_eq!(module.strays[0].construct, "type alias without a schema marker");
    }

    #[test]
    fn spans_use_one_based_lines() {
        let module = parse("\n\ntype Profile = Msg<{ name: str }>;");
        assert_eq!(module.decls[0].span().line, 3);
        assert_eq!(module.decls[0].span().file, "accounts/profile.ts");
    }

    #[test]
    fn string_literal_types() {
        let module = parse(r#"type Status = Union<["active", "inactive"]>;"#);
        let Decl::Union(u) = &module.decls[0] else {
            panic!("expected union");
        };
        assert!(matches!(&u.variants[0].kind, TypeExprKind::StringLit(v) if v == "active"));
    }
}
