//! Language-neutral view over Java and Kotlin tree-sitter nodes.
//!
//! The matching engine only ever talks to [`SyntaxNode`]. Each accessor is
//! answered by the grammar module for the node's language, so one matcher works
//! against both trees even though the concrete shapes differ (Java puts the
//! receiver inside `method_invocation`, Kotlin wraps a `navigation_expression`
//! in a `call_expression`).

use crate::syntax::lang::Language;
use crate::syntax::{java, kotlin};
use std::fmt;
use std::ops::Range;

/// Closed set of node kinds shared by both grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Function or method call, optionally with a receiver.
    Call,
    /// Java `new T(...)`.
    NewInstance,
    /// Member access that is not itself a call: `a.b`, `a?.b`.
    Qualified,
    /// Binary operator, assignment, type check or cast.
    Binary,
    /// Prefix or postfix operator.
    Unary,
    Parenthesized,
    Identifier,
    Literal,
    This,
    Super,
    /// Type reference.
    Type,
    /// Local variable, field or property declaration.
    Variable,
    Annotation,
    /// `name = value` argument.
    NamedArgument,
    /// Anything the engine has no structural rule for.
    Other,
}

impl NodeKind {
    /// Whether nodes of this kind appear in expression position.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Call
                | NodeKind::NewInstance
                | NodeKind::Qualified
                | NodeKind::Binary
                | NodeKind::Unary
                | NodeKind::Parenthesized
                | NodeKind::Identifier
                | NodeKind::Literal
                | NodeKind::This
                | NodeKind::Super
        )
    }

    /// Kinds the template compiler compares by text instead of structure.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeKind::Identifier | NodeKind::Literal | NodeKind::This | NodeKind::Super | NodeKind::Type
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Call => "call",
            NodeKind::NewInstance => "new",
            NodeKind::Qualified => "qualified",
            NodeKind::Binary => "binary",
            NodeKind::Unary => "unary",
            NodeKind::Parenthesized => "parenthesized",
            NodeKind::Identifier => "identifier",
            NodeKind::Literal => "literal",
            NodeKind::This => "this",
            NodeKind::Super => "super",
            NodeKind::Type => "type",
            NodeKind::Variable => "variable",
            NodeKind::Annotation => "annotation",
            NodeKind::NamedArgument => "named-argument",
            NodeKind::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-node accessors usable as matcher extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Callee,
    Receiver,
    Selector,
    TypeArguments,
    Left,
    Right,
    Operand,
    Inner,
    Name,
    DeclaredType,
    Initializer,
    Delegate,
    Value,
}

/// List accessors usable as matcher extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    /// Call, constructor or annotation arguments.
    Arguments,
    /// All children as returned by [`SyntaxNode::children`].
    Children,
}

/// Copyable handle to one node of a parsed Java or Kotlin tree.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    raw: tree_sitter::Node<'t>,
    source: &'t str,
    language: Language,
}

impl<'t> SyntaxNode<'t> {
    pub(crate) fn new(raw: tree_sitter::Node<'t>, source: &'t str, language: Language) -> Self {
        Self {
            raw,
            source,
            language,
        }
    }

    pub(crate) fn wrap(&self, raw: tree_sitter::Node<'t>) -> Self {
        Self::new(raw, self.source, self.language)
    }

    pub(crate) fn raw(&self) -> tree_sitter::Node<'t> {
        self.raw
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The engine-level kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self.language {
            Language::Java => java::classify(self),
            Language::Kotlin => kotlin::classify(self),
        }
    }

    /// The grammar's own node type name, e.g. `method_invocation`.
    pub fn grammar_kind(&self) -> &'static str {
        self.raw.kind()
    }

    pub fn text(&self) -> &'t str {
        &self.source[self.raw.byte_range()]
    }

    pub fn start_offset(&self) -> usize {
        self.raw.start_byte()
    }

    pub fn end_offset(&self) -> usize {
        self.raw.end_byte()
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.raw.byte_range()
    }

    /// Zero-based `(row, column)` of the node start.
    pub fn position(&self) -> (usize, usize) {
        let point = self.raw.start_position();
        (point.row, point.column)
    }

    /// Identity of the node within its tree.
    pub fn id(&self) -> usize {
        self.raw.id()
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.raw.parent().map(|p| self.wrap(p))
    }

    /// Named children plus anonymous tokens that classify to a real kind.
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.raw.walk();
        self.raw
            .children(&mut cursor)
            .map(|child| self.wrap(child))
            .filter(|child| !child.raw.is_extra())
            .filter(|child| child.raw.is_named() || child.kind() != NodeKind::Other)
            .collect()
    }

    pub(crate) fn named_children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.raw.walk();
        self.raw
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .map(|child| self.wrap(child))
            .collect()
    }

    pub(crate) fn all_children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.raw.walk();
        self.raw
            .children(&mut cursor)
            .map(|child| self.wrap(child))
            .collect()
    }

    pub(crate) fn child_by_field(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.raw.child_by_field_name(name).map(|c| self.wrap(c))
    }

    pub(crate) fn first_named_of(&self, kinds: &[&str]) -> Option<SyntaxNode<'t>> {
        self.named_children()
            .into_iter()
            .find(|c| kinds.contains(&c.grammar_kind()))
    }

    /// Trimmed source text between two offsets.
    pub(crate) fn text_between(&self, start: usize, end: usize) -> Option<&'t str> {
        if start > end || end > self.source.len() {
            return None;
        }
        self.source.get(start..end).map(str::trim)
    }

    /// True when `other` lies strictly below this node.
    pub fn is_ancestor_of(&self, other: &SyntaxNode<'_>) -> bool {
        let mut current = other.raw.parent();
        while let Some(node) = current {
            if node.id() == self.raw.id() {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Callee of a call: the method name, or the called expression.
    pub fn callee(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::callee(self),
            Language::Kotlin => kotlin::callee(self),
        }
    }

    /// Receiver of a call or member access.
    pub fn receiver(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::receiver(self),
            Language::Kotlin => kotlin::receiver(self),
        }
    }

    /// Member name of a qualified access.
    pub fn selector(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::selector(self),
            Language::Kotlin => kotlin::selector(self),
        }
    }

    /// Explicit type arguments of a call, e.g. `<String>`.
    pub fn type_arguments(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::type_arguments(self),
            Language::Kotlin => kotlin::type_arguments(self),
        }
    }

    /// Argument expressions of a call, constructor call or annotation.
    ///
    /// Named arguments are returned as [`NodeKind::NamedArgument`] nodes, all
    /// other arguments as the bare expression.
    pub fn arguments(&self) -> Vec<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::arguments(self),
            Language::Kotlin => kotlin::arguments(self),
        }
    }

    pub fn left(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::left(self),
            Language::Kotlin => kotlin::left(self),
        }
    }

    pub fn right(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::right(self),
            Language::Kotlin => kotlin::right(self),
        }
    }

    pub fn operand(&self) -> Option<SyntaxNode<'t>> {
        if self.kind() != NodeKind::Unary {
            return None;
        }
        match self.language {
            Language::Java => java::operand(self),
            Language::Kotlin => kotlin::operand(self),
        }
    }

    /// Whether a unary operator precedes its operand.
    pub fn is_prefix(&self) -> Option<bool> {
        let operand = self.operand()?;
        Some(operand.start_offset() > self.start_offset())
    }

    /// Operator token of a binary, unary, qualified or receiver-qualified
    /// call node, e.g. `+`, `!!`, `?.`, `instanceof`.
    pub fn operator(&self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Binary => {
                let left = self.left()?;
                let right = self.right()?;
                self.text_between(left.end_offset(), right.start_offset())
            }
            NodeKind::Unary => {
                let operand = self.operand()?;
                if operand.start_offset() > self.start_offset() {
                    self.text_between(self.start_offset(), operand.start_offset())
                } else {
                    self.text_between(operand.end_offset(), self.end_offset())
                }
            }
            NodeKind::Qualified | NodeKind::Call => {
                let receiver = self.receiver()?;
                let selector = match self.kind() {
                    NodeKind::Call => self.callee()?,
                    _ => self.selector()?,
                };
                self.text_between(receiver.end_offset(), selector.start_offset())
            }
            _ => None,
        }
    }

    /// Expression inside parentheses.
    pub fn inner(&self) -> Option<SyntaxNode<'t>> {
        if self.kind() != NodeKind::Parenthesized {
            return None;
        }
        self.named_children().into_iter().next()
    }

    /// Declared name of a variable, annotation name, or argument name.
    pub fn name(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::name(self),
            Language::Kotlin => kotlin::name(self),
        }
    }

    /// Explicit type of a variable declaration.
    pub fn declared_type(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::declared_type(self),
            Language::Kotlin => kotlin::declared_type(self),
        }
    }

    /// Initializer expression of a variable declaration.
    pub fn initializer(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::initializer(self),
            Language::Kotlin => kotlin::initializer(self),
        }
    }

    /// Delegate expression of a Kotlin `by` property.
    pub fn delegate(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => None,
            Language::Kotlin => kotlin::delegate(self),
        }
    }

    /// `val` / `var` of a Kotlin property.
    pub fn binding_keyword(&self) -> Option<&'t str> {
        match self.language {
            Language::Java => None,
            Language::Kotlin => kotlin::binding_keyword(self),
        }
    }

    /// Value of a named argument.
    pub fn value(&self) -> Option<SyntaxNode<'t>> {
        match self.language {
            Language::Java => java::value(self),
            Language::Kotlin => kotlin::value(self),
        }
    }

    /// Annotation name without package qualifier or type arguments.
    pub fn annotation_short_name(&self) -> Option<&'t str> {
        if self.kind() != NodeKind::Annotation {
            return None;
        }
        let name = self.name()?.text();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit('.').next().map(str::trim)
    }

    /// Resolve a [`Field`] accessor.
    pub fn field(&self, field: Field) -> Option<SyntaxNode<'t>> {
        match field {
            Field::Callee => self.callee(),
            Field::Receiver => self.receiver(),
            Field::Selector => self.selector(),
            Field::TypeArguments => self.type_arguments(),
            Field::Left => self.left(),
            Field::Right => self.right(),
            Field::Operand => self.operand(),
            Field::Inner => self.inner(),
            Field::Name => self.name(),
            Field::DeclaredType => self.declared_type(),
            Field::Initializer => self.initializer(),
            Field::Delegate => self.delegate(),
            Field::Value => self.value(),
        }
    }

    /// Resolve a [`ListField`] accessor.
    pub fn list(&self, field: ListField) -> Vec<SyntaxNode<'t>> {
        match field {
            ListField::Arguments => self.arguments(),
            ListField::Children => self.children(),
        }
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) {:?} {:?}",
            self.kind(),
            self.grammar_kind(),
            self.byte_range(),
            self.text()
        )
    }
}
