use crate::syntax::errors::SyntaxError;
use crate::syntax::lang::Language;
use crate::syntax::node::SyntaxNode;
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper for one source language.
pub struct SourceParser {
    parser: Parser,
    language: Language,
}

impl SourceParser {
    /// Create a parser for the given language.
    pub fn new(language: Language) -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.ts_language())
            .map_err(|_| SyntaxError::LanguageSet {
                language: language.to_string(),
            })?;

        Ok(Self { parser, language })
    }

    /// Get the configured language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse source code into an owned [`ParsedSource`].
    pub fn parse(&mut self, source: impl Into<String>) -> Result<ParsedSource, SyntaxError> {
        let source = source.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| SyntaxError::ParseFailed {
                language: self.language.to_string(),
            })?;

        Ok(ParsedSource {
            language: self.language,
            source,
            tree,
        })
    }
}

/// A parsed source file: the text together with its syntax tree.
///
/// Node handles borrow from this value, so replacing it with a re-parsed
/// version invalidates every handle taken from the old one.
#[derive(Clone)]
pub struct ParsedSource {
    language: Language,
    source: String,
    tree: Tree,
}

impl ParsedSource {
    /// Get the root node of the tree.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), &self.source, self.language)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Consume the tree and return its text.
    pub fn into_source(self) -> String {
        self.source
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("language", &self.language)
            .field("len", &self.source.len())
            .finish()
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
        });
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_java() {
        let mut parser = SourceParser::new(Language::Java).unwrap();
        let parsed = parser
            .parse("class A { void f() { g(1); } }")
            .unwrap();

        assert!(!parsed.has_errors());
        assert_eq!(parsed.root().grammar_kind(), "program");
    }

    #[test]
    fn parse_valid_kotlin() {
        let mut parser = SourceParser::new(Language::Kotlin).unwrap();
        let parsed = parser.parse("fun main() { println(1) }").unwrap();

        assert!(!parsed.has_errors());
        assert_eq!(parsed.root().grammar_kind(), "source_file");
    }

    #[test]
    fn parse_invalid_java() {
        let mut parser = SourceParser::new(Language::Java).unwrap();
        let parsed = parser.parse("class A { void f( { }").unwrap();

        assert!(parsed.has_errors());
        assert!(!parsed.error_nodes().is_empty());
    }

    #[test]
    fn reparse_is_independent() {
        let mut parser = SourceParser::new(Language::Kotlin).unwrap();
        let first = parser.parse("val a = 1").unwrap();
        let second = parser.parse("val b = 2").unwrap();

        assert_eq!(first.source(), "val a = 1");
        assert_eq!(second.root().text(), "val b = 2");
    }
}
