//! Compile source snippets with `#name#` placeholders into matchers.
//!
//! ```no_run
//! use jk_rewrite::template::{template, Template};
//! use jk_rewrite::matcher::{Matcher, NodeType};
//! use jk_rewrite::syntax::{Language, NodeKind};
//!
//! # fn main() -> Result<(), jk_rewrite::template::TemplateError> {
//! // Any two-argument call to doIt.
//! let do_it = template(Language::Kotlin, NodeKind::Call, "doIt(#a#, #b#)")?;
//!
//! // An externally supplied sub-matcher for one variable.
//! let logged = Template::new(Language::Java, NodeKind::Call, "log.info(#msg#)")
//!     .variable("msg", Matcher::of_kind(NodeKind::Literal))
//!     .compile()?;
//! # Ok(())
//! # }
//! ```

mod compiler;
mod errors;
pub mod placeholder;

pub use errors::TemplateError;
pub use placeholder::{Constraint, Placeholder};

use crate::cache;
use crate::matcher::{Matcher, NodeType};
use crate::pool;
use crate::resolver::Resolver;
use crate::search;
use crate::syntax::{Language, NodeKind, ParsedSource, SyntaxNode};
use compiler::Compiler;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A template snippet plus the options used to compile it.
#[derive(Clone)]
pub struct Template {
    language: Language,
    target: NodeType,
    snippet: String,
    variables: BTreeMap<String, Matcher>,
    resolver: Option<Arc<dyn Resolver>>,
}

impl Template {
    pub fn new(language: Language, target: impl Into<NodeType>, snippet: impl Into<String>) -> Self {
        Self {
            language,
            target: target.into(),
            snippet: snippet.into(),
            variables: BTreeMap::new(),
            resolver: None,
        }
    }

    /// Use `matcher` wherever `#name#` appears instead of a free variable.
    pub fn variable(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.variables.insert(name.into(), matcher);
        self
    }

    /// Resolver consulted by `type=` constraints.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn target(&self) -> NodeType {
        self.target
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn compile(&self) -> Result<Matcher, TemplateError> {
        let snippet = self.snippet.trim();
        let placeholders = placeholder::scan(snippet)?;

        let mut seen = BTreeSet::new();
        for placeholder in &placeholders {
            if !seen.insert(placeholder.name.as_str()) {
                return Err(TemplateError::DuplicateVariable {
                    name: placeholder.name.clone(),
                });
            }
        }
        if let Some(name) = self.variables.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(TemplateError::UnknownVariable { name: name.clone() });
        }

        let mut stand_ins = HashMap::new();
        let mut source = String::with_capacity(snippet.len());
        let mut last = 0;
        for placeholder in &placeholders {
            let stand_in = self.language.stand_in(&placeholder.name);
            source.push_str(&snippet[last..placeholder.span.start]);
            source.push_str(&stand_in);
            last = placeholder.span.end;
            stand_ins.insert(stand_in, placeholder.name.clone());
        }
        source.push_str(&snippet[last..]);

        let compiler = Compiler::new(
            &placeholders,
            stand_ins,
            self.variables.clone(),
            self.resolver.clone(),
        )?;

        let parsed = self.parse_snippet(&source)?;
        let root = template_root(&parsed.tree, parsed.start, source.len(), self.target)
            .ok_or_else(|| TemplateError::NoTemplateNode {
                target: self.target.to_string(),
                snippet: snippet.to_string(),
            })?;

        tracing::debug!(
            language = %self.language,
            target = %self.target,
            kind = %root.kind(),
            snippet,
            "compiling template"
        );
        compiler.compile_root(root, self.target)
    }

    /// Parse the stand-in snippet inside the first wrapper that yields an
    /// error-free tree with a usable root node.
    fn parse_snippet(&self, source: &str) -> Result<WrappedSnippet, TemplateError> {
        let mut parsed_any = false;
        for (prefix, suffix) in self.language.snippet_wrappers() {
            let tree = pool::parse(self.language, format!("{prefix}{source}{suffix}"))?;
            if tree.has_errors() {
                continue;
            }
            parsed_any = true;
            let start = prefix.len();
            if template_root(&tree, start, source.len(), self.target).is_some() {
                return Ok(WrappedSnippet { tree, start });
            }
        }

        if parsed_any {
            Err(TemplateError::NoTemplateNode {
                target: self.target.to_string(),
                snippet: self.snippet.trim().to_string(),
            })
        } else {
            Err(TemplateError::Unparseable {
                language: self.language.to_string(),
                snippet: self.snippet.trim().to_string(),
            })
        }
    }
}

struct WrappedSnippet {
    tree: ParsedSource,
    start: usize,
}

/// Outermost node of an accepted kind covering exactly the snippet.
///
/// Java statement wrappers append `;`, so a declaration may extend one byte
/// further than the snippet.
fn template_root(
    tree: &ParsedSource,
    start: usize,
    len: usize,
    target: NodeType,
) -> Option<SyntaxNode<'_>> {
    let end = start + len;
    let with_semicolon =
        tree.language() == Language::Java && tree.source().get(end..end + 1) == Some(";");

    search::descendants(tree.root()).find(|node| {
        let kind = node.kind();
        kind != NodeKind::Other
            && target.accepts(kind)
            && node.start_offset() == start
            && (node.end_offset() == end || (with_semicolon && node.end_offset() == end + 1))
    })
}

/// Compile a template without external variables, through the thread-local
/// compiled-template cache.
pub fn template(
    language: Language,
    target: impl Into<NodeType>,
    snippet: &str,
) -> Result<Matcher, TemplateError> {
    let target = target.into();
    cache::get_or_compile(language, target, snippet, || {
        Template::new(language, target, snippet).compile()
    })
}
