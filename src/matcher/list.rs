//! List checks: indexed selection and greedy in-order alignment.

use super::{Bindings, Check, Index, ListExtractor, Matcher};
use crate::syntax::SyntaxNode;

pub(super) struct IndexedCheck {
    pub(super) list: ListExtractor,
    pub(super) entries: Vec<(Index, Matcher)>,
}

impl Check for IndexedCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        let items = self.list.extract(node);
        let mut bindings = Bindings::new();
        for (index, matcher) in &self.entries {
            let found = index
                .select(&items)
                .iter()
                .find_map(|&candidate| matcher.matches(candidate))?;
            bindings.extend(found);
        }
        Some(bindings)
    }
}

pub(super) struct InOrderCheck {
    pub(super) list: ListExtractor,
    pub(super) matchers: Vec<Matcher>,
}

impl Check for InOrderCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        match_all_in_order(&self.matchers, &self.list.extract(node))
    }
}

/// Align `matchers` against `nodes` left to right without backtracking.
///
/// A matcher that fails on the current node is skipped when it is optional;
/// otherwise the alignment fails. Succeeds when every node is consumed and
/// every leftover matcher is optional.
pub fn match_all_in_order<'t>(matchers: &[Matcher], nodes: &[SyntaxNode<'t>]) -> Option<Bindings<'t>> {
    let mut bindings = Bindings::new();
    let mut i = 0;
    let mut j = 0;

    while j < nodes.len() {
        let matcher = matchers.get(i)?;
        if let Some(found) = matcher.matches(nodes[j]) {
            bindings.extend(found);
            j += 1;
        } else if matcher.matches_opt(None).is_none() {
            return None;
        }
        i += 1;
    }

    matchers[i..]
        .iter()
        .all(|m| m.matches_opt(None).is_some())
        .then_some(bindings)
}
