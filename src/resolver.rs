//! Type resolution for `type=` template constraints.
//!
//! The engine itself never type-checks. A [`Resolver`] maps an expression node
//! to a fully-qualified type and its supertypes; templates consult it only for
//! variables carrying a `type=` constraint.

use crate::search;
use crate::syntax::{Language, NodeKind, SyntaxNode};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A resolved type and every supertype it conforms to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub fq_name: String,
    pub supertypes: Vec<String>,
}

impl ResolvedType {
    pub fn new(fq_name: impl Into<String>) -> Self {
        Self {
            fq_name: fq_name.into(),
            supertypes: Vec::new(),
        }
    }

    pub fn with_supertypes(mut self, supertypes: Vec<String>) -> Self {
        self.supertypes = supertypes;
        self
    }

    /// True if `fq_name` is this type or one of its supertypes.
    pub fn conforms_to(&self, fq_name: &str) -> bool {
        self.fq_name == fq_name || self.supertypes.iter().any(|s| s == fq_name)
    }
}

pub trait Resolver: Send + Sync {
    fn resolve_type(&self, node: SyntaxNode<'_>) -> Option<ResolvedType>;
}

const JAVA_PRIMITIVES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "boolean", "char", "void",
];

const JAVA_LANG: &[&str] = &[
    "Boolean", "Byte", "Character", "CharSequence", "Comparable", "Double", "Enum",
    "Exception", "Float", "Integer", "Iterable", "Long", "Math", "Number", "Object",
    "Record", "Runnable", "RuntimeException", "Short", "String", "StringBuilder", "System",
    "Thread", "Throwable", "Void",
];

const KOTLIN: &[&str] = &[
    "Any", "Array", "Boolean", "Byte", "Char", "CharSequence", "Comparable", "Double",
    "Float", "Int", "Long", "Nothing", "Number", "Pair", "Short", "String", "Throwable",
    "Triple", "UByte", "UInt", "ULong", "UShort", "Unit",
];

const KOTLIN_COLLECTIONS: &[&str] = &[
    "ArrayList", "Collection", "HashMap", "HashSet", "Iterable", "LinkedHashMap", "List",
    "Map", "MutableCollection", "MutableList", "MutableMap", "MutableSet", "Set",
];

fn builtin_hierarchy() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        ("java.lang.String", &["java.lang.CharSequence", "java.lang.Comparable"]),
        ("java.lang.Integer", &["java.lang.Number", "java.lang.Comparable"]),
        ("java.lang.Long", &["java.lang.Number", "java.lang.Comparable"]),
        ("java.lang.Double", &["java.lang.Number", "java.lang.Comparable"]),
        ("java.lang.RuntimeException", &["java.lang.Exception"]),
        ("java.lang.Exception", &["java.lang.Throwable"]),
        ("kotlin.String", &["kotlin.CharSequence", "kotlin.Comparable"]),
        ("kotlin.Int", &["kotlin.Number", "kotlin.Comparable"]),
        ("kotlin.Long", &["kotlin.Number", "kotlin.Comparable"]),
        ("kotlin.Double", &["kotlin.Number", "kotlin.Comparable"]),
        ("kotlin.Float", &["kotlin.Number", "kotlin.Comparable"]),
        ("kotlin.collections.MutableList", &["kotlin.collections.List", "kotlin.collections.MutableCollection"]),
        ("kotlin.collections.List", &["kotlin.collections.Collection"]),
        ("kotlin.collections.MutableCollection", &["kotlin.collections.Collection"]),
        ("kotlin.collections.Collection", &["kotlin.collections.Iterable"]),
    ];
    entries
        .iter()
        .map(|(name, supers)| {
            (
                name.to_string(),
                supers.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

/// A syntactic resolver working from what is written in the file.
///
/// Handles literals, constructor calls, and identifiers declared earlier in
/// the file as a variable, property or parameter with an explicit type (or an
/// initializer it can resolve). Simple names are qualified through the file's
/// imports, the language's implicit packages, then the file's package.
/// Supertypes come from a hierarchy table; user entries extend the built-in
/// ones.
#[derive(Debug, Clone)]
pub struct DeclaredTypeResolver {
    hierarchy: BTreeMap<String, Vec<String>>,
}

impl Default for DeclaredTypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

const MAX_INFERENCE_DEPTH: usize = 8;

impl DeclaredTypeResolver {
    pub fn new() -> Self {
        Self {
            hierarchy: builtin_hierarchy(),
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: BTreeMap<String, Vec<String>>) -> Self {
        for (name, supers) in hierarchy {
            self.add_supertypes(name, supers);
        }
        self
    }

    pub fn add_supertypes(&mut self, fq_name: impl Into<String>, supertypes: Vec<String>) {
        let entry = self.hierarchy.entry(fq_name.into()).or_default();
        for supertype in supertypes {
            if !entry.contains(&supertype) {
                entry.push(supertype);
            }
        }
    }

    /// Transitive supertypes in breadth-first order, ending with the root type.
    pub fn supertypes_of(&self, fq_name: &str, language: Language) -> Vec<String> {
        let mut seen = BTreeSet::from([fq_name.to_string()]);
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from([fq_name.to_string()]);

        while let Some(current) = queue.pop_front() {
            for parent in self.hierarchy.get(&current).into_iter().flatten() {
                if seen.insert(parent.clone()) {
                    ordered.push(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }

        let root = language.root_type();
        let primitive = language == Language::Java && JAVA_PRIMITIVES.contains(&fq_name);
        if !primitive && fq_name != root && !ordered.iter().any(|s| s == root) {
            ordered.push(root.to_string());
        }
        ordered
    }

    fn written_type(&self, node: SyntaxNode<'_>, depth: usize) -> Option<String> {
        if depth > MAX_INFERENCE_DEPTH {
            return None;
        }
        match node.kind() {
            NodeKind::Literal => literal_type(node),
            NodeKind::Parenthesized => self.written_type(node.inner()?, depth + 1),
            NodeKind::NewInstance => Some(bare_type(node.callee()?.text())),
            NodeKind::Call if node.language() == Language::Kotlin && node.receiver().is_none() => {
                let callee = node.callee()?.text();
                callee
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
                    .then(|| bare_type(callee))
            }
            NodeKind::Variable => match node.declared_type() {
                Some(ty) => Some(bare_type(ty.text())),
                None => self.written_type(node.initializer()?, depth + 1),
            },
            NodeKind::Identifier => self.declaration_type(node, depth),
            _ => None,
        }
    }

    /// Type of the closest declaration of `ident` that precedes it.
    fn declaration_type(&self, ident: SyntaxNode<'_>, depth: usize) -> Option<String> {
        let root = file_root(ident);
        let name = ident.text();
        let declaration = search::descendants(root)
            .filter(|n| n.end_offset() <= ident.start_offset())
            .filter_map(|n| declared_name(n).filter(|d| d.text() == name).map(|_| n))
            .last()?;

        if declaration.kind() == NodeKind::Variable {
            return self.written_type(declaration, depth + 1);
        }
        parameter_type(declaration).map(|ty| bare_type(ty.text()))
    }

    fn qualify(&self, written: &str, root: SyntaxNode<'_>) -> String {
        let language = root.language();
        if written.contains('.') {
            return written.to_string();
        }
        if language == Language::Java && JAVA_PRIMITIVES.contains(&written) {
            return written.to_string();
        }
        if let Some(imported) = imports(root).into_iter().find_map(|(path, alias)| {
            let simple = alias.unwrap_or_else(|| path.rsplit('.').next().unwrap_or(&path).to_string());
            (simple == written).then_some(path)
        }) {
            return imported;
        }
        let implicit = match language {
            Language::Java => JAVA_LANG.contains(&written).then(|| format!("java.lang.{written}")),
            Language::Kotlin => {
                if KOTLIN.contains(&written) {
                    Some(format!("kotlin.{written}"))
                } else if KOTLIN_COLLECTIONS.contains(&written) {
                    Some(format!("kotlin.collections.{written}"))
                } else {
                    None
                }
            }
        };
        if let Some(fq) = implicit {
            return fq;
        }
        match package(root) {
            Some(pkg) => format!("{pkg}.{written}"),
            None => written.to_string(),
        }
    }
}

impl Resolver for DeclaredTypeResolver {
    fn resolve_type(&self, node: SyntaxNode<'_>) -> Option<ResolvedType> {
        let written = self.written_type(node, 0)?;
        let fq_name = self.qualify(&written, file_root(node));
        let supertypes = self.supertypes_of(&fq_name, node.language());
        tracing::trace!(node = node.text(), %fq_name, "resolved type");
        Some(ResolvedType::new(fq_name).with_supertypes(supertypes))
    }
}

fn file_root(node: SyntaxNode<'_>) -> SyntaxNode<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// `List<String>?` → `List`.
fn bare_type(text: &str) -> String {
    let text = text.split('<').next().unwrap_or(text);
    text.trim().trim_end_matches('?').trim().to_string()
}

fn literal_type(node: SyntaxNode<'_>) -> Option<String> {
    let text = node.text();
    let ty = match (node.language(), node.grammar_kind()) {
        (Language::Java, "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal") => {
            if text.ends_with(['l', 'L']) {
                "long"
            } else {
                "int"
            }
        }
        (Language::Java, "decimal_floating_point_literal" | "hex_floating_point_literal") => {
            if text.ends_with(['f', 'F']) {
                "float"
            } else {
                "double"
            }
        }
        (Language::Java, "true" | "false") => "boolean",
        (Language::Java, "character_literal") => "char",
        (Language::Java, "string_literal" | "text_block") => "String",
        (Language::Kotlin, "integer_literal" | "hex_literal" | "bin_literal") => "Int",
        (Language::Kotlin, "long_literal") => "Long",
        (Language::Kotlin, "unsigned_literal") => {
            if text.ends_with(['L']) {
                "ULong"
            } else {
                "UInt"
            }
        }
        (Language::Kotlin, "real_literal") => {
            if text.ends_with(['f', 'F']) {
                "Float"
            } else {
                "Double"
            }
        }
        (Language::Kotlin, "boolean_literal") => "Boolean",
        (Language::Kotlin, "character_literal") => "Char",
        (Language::Kotlin, "string_literal") => "String",
        _ => return None,
    };
    Some(ty.to_string())
}

/// Name node of a variable or parameter declaration.
fn declared_name<'t>(node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match (node.language(), node.grammar_kind()) {
        (_, _) if node.kind() == NodeKind::Variable => node.name(),
        (Language::Java, "formal_parameter") => node.child_by_field("name"),
        (Language::Kotlin, "parameter" | "class_parameter") => {
            node.first_named_of(&["simple_identifier"])
        }
        _ => None,
    }
}

fn parameter_type<'t>(node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.language() {
        Language::Java => node.child_by_field("type"),
        Language::Kotlin => node
            .named_children()
            .into_iter()
            .find(|c| c.kind() == NodeKind::Type),
    }
}

/// `(path, alias)` for every single-type import in the file.
fn imports(root: SyntaxNode<'_>) -> Vec<(String, Option<String>)> {
    let mut found = Vec::new();
    for child in root.named_children() {
        match (root.language(), child.grammar_kind()) {
            (Language::Java, "import_declaration") => {
                let text = child.text();
                let path = text
                    .trim_start_matches("import")
                    .trim_end_matches(';')
                    .trim();
                if !path.starts_with("static") && !path.ends_with('*') {
                    found.push((path.to_string(), None));
                }
            }
            (Language::Kotlin, "import_list") => {
                for header in child.named_children() {
                    push_kotlin_import(header, &mut found);
                }
            }
            (Language::Kotlin, "import_header") => push_kotlin_import(child, &mut found),
            _ => {}
        }
    }
    found
}

fn push_kotlin_import(header: SyntaxNode<'_>, found: &mut Vec<(String, Option<String>)>) {
    if header.grammar_kind() != "import_header" {
        return;
    }
    let Some(path) = header.first_named_of(&["identifier"]) else {
        return;
    };
    let alias = header
        .first_named_of(&["import_alias"])
        .and_then(|a| a.named_children().into_iter().last())
        .map(|a| a.text().to_string());
    found.push((path.text().to_string(), alias));
}

fn package(root: SyntaxNode<'_>) -> Option<String> {
    let header = root
        .named_children()
        .into_iter()
        .find(|c| matches!(c.grammar_kind(), "package_declaration" | "package_header"))?;
    let name = header
        .named_children()
        .into_iter()
        .find(|c| matches!(c.grammar_kind(), "scoped_identifier" | "identifier"))?;
    Some(name.text().to_string())
}
