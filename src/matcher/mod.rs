//! Composable structural matchers over [`SyntaxNode`]s.
//!
//! A [`Matcher`] targets a [`NodeType`] and carries an ordered list of checks.
//! Every check must succeed for the matcher to succeed; the bindings produced
//! by each check are merged and, when the matcher has a variable name, the
//! matched node is bound under it.
//!
//! ```no_run
//! use jk_rewrite::matcher::{Index, Matcher, NodeType};
//! use jk_rewrite::syntax::{Field, ListField, NodeKind};
//!
//! # fn main() -> Result<(), jk_rewrite::matcher::MatcherError> {
//! // println(<anything bound as "arg">)
//! let matcher = Matcher::of_kind(NodeKind::Call)
//!     .add_child_predicate(Field::Callee, |callee| callee.text() == "println")
//!     .add_indexed_matchers(
//!         ListField::Arguments,
//!         vec![(Index::first(), Matcher::new(NodeType::Expression).bind("arg")?)],
//!     )?;
//! # Ok(())
//! # }
//! ```

mod adaptive;
mod bindings;
mod errors;
mod index;
mod list;

pub use adaptive::AdaptiveMatcher;
pub use bindings::{Bindings, MatchResult};
pub use errors::MatcherError;
pub use index::Index;
pub use list::match_all_in_order;

use crate::search;
use crate::syntax::{Field, ListField, NodeKind, SyntaxNode};
use list::{InOrderCheck, IndexedCheck};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The node kinds a matcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Any,
    /// Any kind usable in expression position.
    Expression,
    Kind(NodeKind),
}

impl NodeType {
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            NodeType::Any => true,
            NodeType::Expression => kind.is_expression(),
            NodeType::Kind(expected) => expected == kind,
        }
    }
}

impl From<NodeKind> for NodeType {
    fn from(kind: NodeKind) -> Self {
        NodeType::Kind(kind)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Any => write!(f, "any"),
            NodeType::Expression => write!(f, "expression"),
            NodeType::Kind(kind) => write!(f, "{kind}"),
        }
    }
}

impl FromStr for NodeType {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "any" => return Ok(NodeType::Any),
            "expression" => return Ok(NodeType::Expression),
            "call" => NodeKind::Call,
            "new" => NodeKind::NewInstance,
            "qualified" => NodeKind::Qualified,
            "binary" => NodeKind::Binary,
            "unary" => NodeKind::Unary,
            "parenthesized" => NodeKind::Parenthesized,
            "identifier" => NodeKind::Identifier,
            "literal" => NodeKind::Literal,
            "this" => NodeKind::This,
            "super" => NodeKind::Super,
            "type" => NodeKind::Type,
            "variable" => NodeKind::Variable,
            "annotation" => NodeKind::Annotation,
            "named-argument" => NodeKind::NamedArgument,
            _ => {
                return Err(MatcherError::UnknownNodeType {
                    name: s.to_string(),
                })
            }
        };
        Ok(NodeType::Kind(kind))
    }
}

/// One child check of a matcher.
///
/// Checks must be pure: the result may depend only on the node passed in.
/// [`AdaptiveMatcher`] relies on this to reorder them.
pub trait Check: Send + Sync {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>>;
}

type NodePredicate = dyn Fn(SyntaxNode<'_>) -> bool + Send + Sync;
type NodeExtractor = dyn for<'t> Fn(SyntaxNode<'t>) -> Option<SyntaxNode<'t>> + Send + Sync;
type NodeListExtractor = dyn for<'t> Fn(SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> + Send + Sync;

/// Extracts a single sub-node.
#[derive(Clone)]
pub enum Extractor {
    Field(Field),
    Custom(Arc<NodeExtractor>),
}

impl Extractor {
    pub fn custom<F>(f: F) -> Self
    where
        F: for<'t> Fn(SyntaxNode<'t>) -> Option<SyntaxNode<'t>> + Send + Sync + 'static,
    {
        Extractor::Custom(Arc::new(f))
    }

    pub fn extract<'t>(&self, node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        match self {
            Extractor::Field(field) => node.field(*field),
            Extractor::Custom(f) => f(node),
        }
    }
}

impl From<Field> for Extractor {
    fn from(field: Field) -> Self {
        Extractor::Field(field)
    }
}

/// Extracts an ordered list of sub-nodes.
#[derive(Clone)]
pub enum ListExtractor {
    Field(ListField),
    Custom(Arc<NodeListExtractor>),
}

impl ListExtractor {
    pub fn custom<F>(f: F) -> Self
    where
        F: for<'t> Fn(SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> + Send + Sync + 'static,
    {
        ListExtractor::Custom(Arc::new(f))
    }

    pub fn extract<'t>(&self, node: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        match self {
            ListExtractor::Field(field) => node.list(*field),
            ListExtractor::Custom(f) => f(node),
        }
    }
}

impl From<ListField> for ListExtractor {
    fn from(field: ListField) -> Self {
        ListExtractor::Field(field)
    }
}

struct PredicateCheck {
    extract: Option<Extractor>,
    predicate: Arc<NodePredicate>,
}

impl Check for PredicateCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        let value = match &self.extract {
            Some(extract) => extract.extract(node)?,
            None => node,
        };
        (self.predicate)(value).then(Bindings::new)
    }
}

struct ChildCheck {
    extract: Extractor,
    matcher: Matcher,
}

impl Check for ChildCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        self.matcher.matches_opt(self.extract.extract(node))
    }
}

struct AnyOfCheck {
    alternatives: Vec<Matcher>,
}

impl Check for AnyOfCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        self.alternatives.iter().find_map(|m| m.matches(node))
    }
}

/// A composable predicate over one node kind.
#[derive(Clone)]
pub struct Matcher {
    target: NodeType,
    checks: Vec<Arc<dyn Check>>,
    variable: Option<String>,
    optional: bool,
    names: BTreeSet<String>,
}

impl Matcher {
    /// A matcher accepting every node of `target` with no further checks.
    pub fn new(target: impl Into<NodeType>) -> Self {
        Self {
            target: target.into(),
            checks: Vec::new(),
            variable: None,
            optional: false,
            names: BTreeSet::new(),
        }
    }

    pub fn any() -> Self {
        Self::new(NodeType::Any)
    }

    pub fn of_kind(kind: NodeKind) -> Self {
        Self::new(kind)
    }

    /// A matcher whose first check is `predicate`.
    pub fn with_predicate<P>(target: impl Into<NodeType>, predicate: P) -> Self
    where
        P: Fn(SyntaxNode<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(target).add_custom_matcher(predicate)
    }

    /// Succeeds if any alternative matches, with that alternative's bindings.
    ///
    /// Alternatives are tried in order. The same variable name may appear in
    /// several alternatives since only one of them binds per match.
    pub fn any_of(alternatives: Vec<Matcher>) -> Self {
        let mut names = BTreeSet::new();
        for alternative in &alternatives {
            names.extend(alternative.names.iter().cloned());
        }
        let mut matcher = Self::any();
        matcher.names = names;
        matcher.checks.push(Arc::new(AnyOfCheck { alternatives }));
        matcher
    }

    pub fn target(&self) -> NodeType {
        self.target
    }

    pub fn variable_name(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Every variable name this matcher tree can bind.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn binds(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    fn absorb(&mut self, names: &BTreeSet<String>) -> Result<(), MatcherError> {
        if let Some(dup) = names.intersection(&self.names).next() {
            return Err(MatcherError::DuplicateVariable { name: dup.clone() });
        }
        self.names.extend(names.iter().cloned());
        Ok(())
    }

    /// Bind the matched node under `name` on success.
    pub fn bind(mut self, name: impl Into<String>) -> Result<Self, MatcherError> {
        let name = name.into();
        if let Some(previous) = self.variable.take() {
            self.names.remove(&previous);
        }
        self.absorb(&BTreeSet::from([name.clone()]))?;
        self.variable = Some(name);
        Ok(self)
    }

    /// Make an absent node (`None`) match with no bindings.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Append a raw check. The check must not bind names.
    pub(crate) fn add_check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn add_custom_matcher<P>(self, predicate: P) -> Self
    where
        P: Fn(SyntaxNode<'_>) -> bool + Send + Sync + 'static,
    {
        self.add_check(Arc::new(PredicateCheck {
            extract: None,
            predicate: Arc::new(predicate),
        }))
    }

    /// Extract a sub-node and test it with `predicate`. Fails when the
    /// sub-node is absent.
    pub fn add_child_predicate<P>(self, extract: impl Into<Extractor>, predicate: P) -> Self
    where
        P: Fn(SyntaxNode<'_>) -> bool + Send + Sync + 'static,
    {
        self.add_check(Arc::new(PredicateCheck {
            extract: Some(extract.into()),
            predicate: Arc::new(predicate),
        }))
    }

    /// Extract a sub-node and delegate to `matcher`, propagating its bindings.
    /// An absent sub-node succeeds only if `matcher` is optional.
    pub fn add_child_matcher(
        mut self,
        extract: impl Into<Extractor>,
        matcher: Matcher,
    ) -> Result<Self, MatcherError> {
        self.absorb(&matcher.names)?;
        Ok(self.add_check(Arc::new(ChildCheck {
            extract: extract.into(),
            matcher,
        })))
    }

    /// For each `(index, matcher)` pair in order, some candidate selected by
    /// the index must match.
    pub fn add_indexed_matchers(
        mut self,
        list: impl Into<ListExtractor>,
        entries: Vec<(Index, Matcher)>,
    ) -> Result<Self, MatcherError> {
        for (_, matcher) in &entries {
            self.absorb(&matcher.names)?;
        }
        Ok(self.add_check(Arc::new(IndexedCheck {
            list: list.into(),
            entries,
        })))
    }

    /// Greedy left-to-right alignment of `matchers` against the list.
    pub fn add_matchers_in_order(
        mut self,
        list: impl Into<ListExtractor>,
        matchers: Vec<Matcher>,
    ) -> Result<Self, MatcherError> {
        for matcher in &matchers {
            self.absorb(&matcher.names)?;
        }
        Ok(self.add_check(Arc::new(InOrderCheck {
            list: list.into(),
            matchers,
        })))
    }

    /// Match a node, returning the bindings on success.
    pub fn matches<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        if !self.target.accepts(node.kind()) {
            return None;
        }
        let mut bindings = Bindings::new();
        for check in &self.checks {
            bindings.extend(check.check(node)?);
        }
        Some(self.finish(node, bindings))
    }

    /// Match a possibly absent node. `None` matches only optional matchers.
    pub fn matches_opt<'t>(&self, node: Option<SyntaxNode<'t>>) -> Option<Bindings<'t>> {
        match node {
            Some(node) => self.matches(node),
            None if self.optional => Some(Bindings::new()),
            None => None,
        }
    }

    pub(crate) fn finish<'t>(&self, node: SyntaxNode<'t>, mut bindings: Bindings<'t>) -> Bindings<'t> {
        if let Some(name) = &self.variable {
            bindings.insert(name.clone(), node);
        }
        bindings
    }

    pub(crate) fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    pub(crate) fn with_check_order(&self, order: &[usize]) -> Self {
        let mut matcher = self.clone();
        matcher.checks = order.iter().map(|&i| Arc::clone(&self.checks[i])).collect();
        matcher
    }

    /// Every node under `root` (inclusive) that matches, in pre-order.
    pub fn find_all<'t>(&self, root: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        search::find_all(root, self)
    }

    /// Every match under `root` (inclusive) with its bindings, in pre-order.
    pub fn find_all_with_variables<'t>(&self, root: SyntaxNode<'t>) -> Vec<MatchResult<'t>> {
        search::find_all_with_variables(root, self)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("target", &self.target)
            .field("checks", &self.checks.len())
            .field("variable", &self.variable)
            .field("optional", &self.optional)
            .field("names", &self.names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool;
    use crate::syntax::{Language, ParsedSource};

    fn kotlin(source: &str) -> ParsedSource {
        pool::parse(Language::Kotlin, source).unwrap()
    }

    fn call_named(name: &'static str) -> Matcher {
        Matcher::of_kind(NodeKind::Call).add_child_predicate(Field::Callee, move |c| c.text() == name)
    }

    #[test]
    fn rejects_other_kinds() {
        let parsed = kotlin("fun f() { g(1) }");
        let matcher = Matcher::of_kind(NodeKind::Binary);
        assert!(matcher.find_all(parsed.root()).is_empty());
    }

    #[test]
    fn child_predicate_and_binding() {
        let parsed = kotlin("fun f() { g(1)\n h(2) }");
        let matcher = call_named("h").bind("call").unwrap();

        let found = matcher.find_all_with_variables(parsed.root());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bindings.text("call"), Some("h(2)"));
    }

    #[test]
    fn child_matcher_propagates_bindings() {
        let parsed = kotlin("fun f() { a + b }");
        let matcher = Matcher::of_kind(NodeKind::Binary)
            .add_child_matcher(Field::Left, Matcher::any().bind("lhs").unwrap())
            .unwrap()
            .add_child_matcher(Field::Right, Matcher::any().bind("rhs").unwrap())
            .unwrap();

        let found = matcher.find_all_with_variables(parsed.root());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bindings.text("lhs"), Some("a"));
        assert_eq!(found[0].bindings.text("rhs"), Some("b"));
    }

    #[test]
    fn absent_child_needs_optional_matcher() {
        let parsed = kotlin("fun f() { g(1) }");
        let strict = Matcher::of_kind(NodeKind::Call)
            .add_child_matcher(Field::Receiver, Matcher::any())
            .unwrap();
        let lenient = Matcher::of_kind(NodeKind::Call)
            .add_child_matcher(Field::Receiver, Matcher::any().optional())
            .unwrap();

        assert!(strict.find_all(parsed.root()).is_empty());
        assert_eq!(lenient.find_all(parsed.root()).len(), 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = Matcher::of_kind(NodeKind::Binary)
            .add_child_matcher(Field::Left, Matcher::any().bind("x").unwrap())
            .unwrap()
            .add_child_matcher(Field::Right, Matcher::any().bind("x").unwrap());

        assert_eq!(
            result.unwrap_err(),
            MatcherError::DuplicateVariable { name: "x".into() }
        );
    }

    #[test]
    fn binding_own_name_twice_rejected() {
        let inner = Matcher::any().bind("x").unwrap();
        let result = Matcher::of_kind(NodeKind::Parenthesized)
            .add_child_matcher(Field::Inner, inner)
            .unwrap()
            .bind("x");
        assert!(matches!(result, Err(MatcherError::DuplicateVariable { .. })));
    }

    #[test]
    fn rebinding_replaces_own_name() {
        let matcher = Matcher::any().bind("a").unwrap().bind("b").unwrap();
        assert_eq!(matcher.variables().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn any_of_allows_shared_names() {
        let parsed = kotlin("fun f() { g(1)\n h(2)\n k(3) }");
        let either = Matcher::any_of(vec![
            call_named("g").bind("c").unwrap(),
            call_named("h").bind("c").unwrap(),
        ]);

        let found = either.find_all_with_variables(parsed.root());
        let texts: Vec<_> = found.iter().map(|m| m.bindings.text("c").unwrap()).collect();
        assert_eq!(texts, vec!["g(1)", "h(2)"]);
        assert!(either.binds("c"));
    }

    #[test]
    fn indexed_matchers() {
        let parsed = kotlin("fun f() { g(1, x, 3)\n g(x) }");
        let matcher = call_named("g")
            .add_indexed_matchers(
                ListField::Arguments,
                vec![
                    (
                        Index::at(1),
                        Matcher::of_kind(NodeKind::Identifier).bind("second").unwrap(),
                    ),
                    (Index::last(), Matcher::of_kind(NodeKind::Literal)),
                ],
            )
            .unwrap();

        let found = matcher.find_all_with_variables(parsed.root());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "g(1, x, 3)");
        assert_eq!(found[0].bindings.text("second"), Some("x"));
    }

    #[test]
    fn indexed_any_finds_first_matching_candidate() {
        let parsed = kotlin("fun f() { g(1, x, y) }");
        let matcher = call_named("g")
            .add_indexed_matchers(
                ListField::Arguments,
                vec![(Index::any(), Matcher::of_kind(NodeKind::Identifier).bind("id").unwrap())],
            )
            .unwrap();

        let found = matcher.find_all_with_variables(parsed.root());
        assert_eq!(found[0].bindings.text("id"), Some("x"));
    }

    #[test]
    fn custom_extractor() {
        let parsed = kotlin("fun f() { outer(inner(1)) }");
        let matcher = call_named("inner")
            .add_child_matcher(
                Extractor::custom(|n| n.parent()),
                Matcher::any(),
            )
            .unwrap();
        assert_eq!(matcher.find_all(parsed.root()).len(), 1);
    }

    #[test]
    fn node_type_parsing() {
        assert_eq!("call".parse::<NodeType>().unwrap(), NodeType::Kind(NodeKind::Call));
        assert_eq!("Expression".parse::<NodeType>().unwrap(), NodeType::Expression);
        assert_eq!(
            "named-argument".parse::<NodeType>().unwrap(),
            NodeType::Kind(NodeKind::NamedArgument)
        );
        assert!("lambda".parse::<NodeType>().is_err());
    }

    #[test]
    fn expression_type_excludes_declarations() {
        assert!(NodeType::Expression.accepts(NodeKind::Call));
        assert!(!NodeType::Expression.accepts(NodeKind::Variable));
        assert!(!NodeType::Expression.accepts(NodeKind::Type));
    }
}
