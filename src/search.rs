//! Pre-order tree search.

use crate::matcher::{MatchResult, Matcher};
use crate::syntax::SyntaxNode;

/// Pre-order, left-to-right iterator over `root` and all its descendants.
pub struct Descendants<'t> {
    stack: Vec<SyntaxNode<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

pub fn descendants(root: SyntaxNode<'_>) -> Descendants<'_> {
    Descendants { stack: vec![root] }
}

/// Every node under `root` (inclusive) accepted by `matcher`.
pub fn find_all<'t>(root: SyntaxNode<'t>, matcher: &Matcher) -> Vec<SyntaxNode<'t>> {
    descendants(root)
        .filter(|node| matcher.matches(*node).is_some())
        .collect()
}

/// Every match under `root` (inclusive) with its bindings.
///
/// Matched subtrees are still searched, so nested matches are all reported.
pub fn find_all_with_variables<'t>(root: SyntaxNode<'t>, matcher: &Matcher) -> Vec<MatchResult<'t>> {
    let results: Vec<_> = descendants(root)
        .filter_map(|node| {
            matcher
                .matches(node)
                .map(|bindings| MatchResult::new(node, bindings))
        })
        .collect();
    tracing::trace!(matches = results.len(), "search finished");
    results
}
