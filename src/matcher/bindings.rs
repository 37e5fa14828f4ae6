use crate::syntax::SyntaxNode;
use crate::template::placeholder;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Variable name → bound node for one successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings<'t> {
    map: BTreeMap<String, SyntaxNode<'t>>,
}

impl<'t> Bindings<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, node: SyntaxNode<'t>) {
        self.map.insert(name.into(), node);
    }

    /// Merge another set of bindings into this one.
    ///
    /// Names are unique per matcher tree, so merging never shadows a binding
    /// produced by a sibling check.
    pub fn extend(&mut self, other: Bindings<'t>) {
        self.map.extend(other.map);
    }

    pub fn get(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.map.get(name).copied()
    }

    /// Source text of the node bound to `name`.
    pub fn text(&self, name: &str) -> Option<&'t str> {
        self.get(name).map(|node| node.text())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, SyntaxNode<'t>> {
        self.map.iter()
    }
}

impl<'a, 't> IntoIterator for &'a Bindings<'t> {
    type Item = (&'a String, &'a SyntaxNode<'t>);
    type IntoIter = btree_map::Iter<'a, String, SyntaxNode<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

/// One search hit: the matched node and the variables it bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'t> {
    pub node: SyntaxNode<'t>,
    pub bindings: Bindings<'t>,
}

impl<'t> MatchResult<'t> {
    pub fn new(node: SyntaxNode<'t>, bindings: Bindings<'t>) -> Self {
        Self { node, bindings }
    }

    pub fn text(&self) -> &'t str {
        self.node.text()
    }

    /// Fill `#name#` placeholders in `replacement` with bound text.
    ///
    /// Placeholders for unbound variables (an optional argument that was
    /// absent) render as empty text.
    pub fn render(&self, replacement: &str) -> String {
        placeholder::substitute(replacement, |name| self.bindings.text(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool;
    use crate::syntax::{Language, NodeKind};

    #[test]
    fn render_substitutes_bound_text() {
        let parsed = pool::parse(Language::Kotlin, "fun f() { g(1, b) }").unwrap();
        let root = parsed.root();
        let call = crate::search::descendants(root)
            .find(|n| n.kind() == NodeKind::Call)
            .unwrap();
        let args = call.arguments();

        let mut bindings = Bindings::new();
        bindings.insert("a", args[0]);
        bindings.insert("b", args[1]);
        let result = MatchResult::new(call, bindings);

        assert_eq!(result.render("h(#b#, #a#)"), "h(b, 1)");
        assert_eq!(result.render("h(#missing?#)"), "h()");
        assert_eq!(result.text(), "g(1, b)");
    }

    #[test]
    fn extend_merges_names() {
        let parsed = pool::parse(Language::Java, "class A {}").unwrap();
        let root = parsed.root();

        let mut left = Bindings::new();
        left.insert("a", root);
        let mut right = Bindings::new();
        right.insert("b", root);
        left.extend(right);

        assert_eq!(left.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(left.contains("b"));
        assert_eq!(left.len(), 2);
    }
}
