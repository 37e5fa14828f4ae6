//! Find-all-then-replace-all rewriting with fixpoint passes.
//!
//! Each pass searches the current tree, patches only the innermost matches
//! (a match with a matched descendant waits for a later pass), applies the
//! patches and re-parses. A match whose patch would leave the text as it is
//! counts as settled and no longer holds back its ancestors. Passes continue
//! until nothing matches or every match is settled. Every pass must see
//! strictly fewer matches than the one before, which bounds the pass count by
//! the nesting depth.

mod errors;

pub use errors::RewriteError;

use crate::matcher::{MatchResult, Matcher};
use crate::patch::{apply_patches, Patch};
use crate::pool;
use crate::search;
use crate::syntax::{validate_change, ParsedSource};
use crate::template::placeholder;
use std::collections::HashSet;
use tracing::debug;

/// Outcome of a rewrite.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// The final tree.
    pub tree: ParsedSource,
    /// Passes run, including a final pass that found nothing to change.
    pub passes: usize,
    /// Patches applied across all passes.
    pub replacements: usize,
}

impl Rewrite {
    pub fn source(&self) -> &str {
        self.tree.source()
    }

    pub fn into_source(self) -> String {
        self.tree.into_source()
    }
}

/// Rewrite options.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    validate_syntax: bool,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject passes whose output has parse errors the input did not have.
    pub fn validate_syntax(mut self, enabled: bool) -> Self {
        self.validate_syntax = enabled;
        self
    }

    /// Replace every match with `replacement(match)`.
    pub fn replace_all<F>(
        &self,
        tree: ParsedSource,
        matcher: &Matcher,
        mut replacement: F,
    ) -> Result<Rewrite, RewriteError>
    where
        F: FnMut(&MatchResult<'_>) -> String,
    {
        self.rewrite_with(tree, matcher, |m| Patch::replace(m.node, replacement(m)))
    }

    /// Like [`Rewriter::replace_all`], but the callback chooses the patch span.
    pub fn rewrite_with<F>(
        &self,
        tree: ParsedSource,
        matcher: &Matcher,
        mut make_patch: F,
    ) -> Result<Rewrite, RewriteError>
    where
        F: FnMut(&MatchResult<'_>) -> Patch,
    {
        let language = tree.language();
        let mut current = tree;
        let mut passes = 0;
        let mut replacements = 0;
        let mut previous: Option<usize> = None;

        loop {
            let pass = passes + 1;
            let (next_source, applied) = {
                let matches = search::find_all_with_variables(current.root(), matcher);
                if matches.is_empty() {
                    break;
                }
                if let Some(previous) = previous {
                    if matches.len() >= previous {
                        return Err(RewriteError::Diverged {
                            pass,
                            matches: matches.len(),
                            previous,
                        });
                    }
                }
                previous = Some(matches.len());

                let patches = pending_patches(&matches, current.source(), &mut make_patch);
                debug!(
                    pass,
                    matches = matches.len(),
                    patches = patches.len(),
                    "rewrite pass"
                );
                let applied = patches.len();
                (apply_patches(current.source(), patches)?, applied)
            };
            passes = pass;

            if applied == 0 || next_source == current.source() {
                break;
            }
            if self.validate_syntax {
                validate_change(language, current.source(), &next_source)
                    .map_err(|error| RewriteError::InvalidResult { pass, error })?;
            }
            replacements += applied;
            current = pool::parse(language, next_source)?;
        }

        Ok(Rewrite {
            tree: current,
            passes,
            replacements,
        })
    }
}

/// Patches for the innermost unsettled matches of one pass.
///
/// No-op patches settle their match and are dropped. When a whole round is
/// no-ops the next layer of ancestors is tried on the same tree, so the result
/// is empty only once every match is settled.
fn pending_patches<F>(matches: &[MatchResult<'_>], source: &str, make_patch: &mut F) -> Vec<Patch>
where
    F: FnMut(&MatchResult<'_>) -> Patch,
{
    let mut settled = HashSet::new();
    loop {
        let ready = innermost(matches, &settled);
        if ready.is_empty() {
            return Vec::new();
        }
        let mut patches = Vec::new();
        for m in ready {
            let patch = make_patch(m);
            if patch.is_noop(source) {
                settled.insert(m.node.id());
            } else {
                patches.push(patch);
            }
        }
        if !patches.is_empty() {
            return patches;
        }
    }
}

/// Unsettled matches that have no other unsettled match below them.
fn innermost<'m, 't>(
    matches: &'m [MatchResult<'t>],
    settled: &HashSet<usize>,
) -> Vec<&'m MatchResult<'t>> {
    let open: Vec<&MatchResult<'t>> = matches
        .iter()
        .filter(|m| !settled.contains(&m.node.id()))
        .collect();
    let ids: HashSet<usize> = open.iter().map(|m| m.node.id()).collect();
    let mut deferred = HashSet::new();
    for m in &open {
        let mut ancestor = m.node.parent();
        while let Some(node) = ancestor {
            if ids.contains(&node.id()) {
                deferred.insert(node.id());
            }
            ancestor = node.parent();
        }
    }
    open.into_iter()
        .filter(|m| !deferred.contains(&m.node.id()))
        .collect()
}

/// Replace every match of `matcher` in `tree` with `replacement(match)`.
pub fn replace_all<F>(tree: ParsedSource, matcher: &Matcher, replacement: F) -> Result<Rewrite, RewriteError>
where
    F: FnMut(&MatchResult<'_>) -> String,
{
    Rewriter::new().replace_all(tree, matcher, replacement)
}

/// Rewrite with caller-built patches.
pub fn rewrite_with<F>(tree: ParsedSource, matcher: &Matcher, make_patch: F) -> Result<Rewrite, RewriteError>
where
    F: FnMut(&MatchResult<'_>) -> Patch,
{
    Rewriter::new().rewrite_with(tree, matcher, make_patch)
}

/// A matcher paired with a `#name#` replacement template.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    matcher: Matcher,
    replacement: String,
}

impl RewriteRule {
    /// Every variable in `replacement` must be bindable by `matcher`.
    pub fn new(matcher: Matcher, replacement: impl Into<String>) -> Result<Self, RewriteError> {
        let replacement = replacement.into();
        for name in placeholder::names(&replacement) {
            if !matcher.binds(&name) {
                let suggestion = matcher
                    .variables()
                    .map(|known| (strsim::levenshtein(&name, known), known))
                    .filter(|(distance, _)| *distance <= 2)
                    .min()
                    .map(|(_, known)| known.to_string());
                return Err(RewriteError::UndefinedVariable { name, suggestion });
            }
        }
        Ok(Self {
            matcher,
            replacement,
        })
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn render(&self, m: &MatchResult<'_>) -> String {
        m.render(&self.replacement)
    }

    pub fn apply(&self, tree: ParsedSource, rewriter: &Rewriter) -> Result<Rewrite, RewriteError> {
        rewriter.replace_all(tree, &self.matcher, |m| self.render(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Language, NodeKind};
    use crate::template::template;

    fn kotlin(source: &str) -> ParsedSource {
        pool::parse(Language::Kotlin, source).unwrap()
    }

    #[test]
    fn replaces_flat_matches_in_one_pass() {
        let m = template(Language::Kotlin, NodeKind::Call, "old(#x#)").unwrap();
        let rule = RewriteRule::new(m, "new(#x#)").unwrap();
        let out = rule
            .apply(kotlin("fun f() {\n old(1)\n old(2)\n}"), &Rewriter::new())
            .unwrap();

        assert_eq!(out.source(), "fun f() {\n new(1)\n new(2)\n}");
        assert_eq!(out.replacements, 2);
        assert_eq!(out.passes, 1);
    }

    #[test]
    fn nested_matches_need_several_passes() {
        let m = template(Language::Kotlin, NodeKind::Call, "wrap(#x#)").unwrap();
        let out = replace_all(kotlin("val a = wrap(wrap(wrap(1)))"), &m, |m| {
            m.render("box(#x#)")
        })
        .unwrap();
        assert_eq!(out.source(), "val a = box(box(box(1)))");
        assert_eq!(out.passes, 3);
        assert_eq!(out.replacements, 3);
    }

    #[test]
    fn no_matches_returns_input() {
        let m = template(Language::Kotlin, NodeKind::Call, "absent(#x#)").unwrap();
        let out = replace_all(kotlin("val a = 1"), &m, |_| unreachable!()).unwrap();
        assert_eq!(out.source(), "val a = 1");
        assert_eq!(out.passes, 0);
    }

    #[test]
    fn identity_replacement_stops_after_one_pass() {
        let m = template(Language::Kotlin, NodeKind::Call, "f(#x#)").unwrap();
        let source = "val a = f(f(1))";
        let out = replace_all(kotlin(source), &m, |m| m.text().to_string()).unwrap();
        assert_eq!(out.source(), source);
        assert_eq!(out.passes, 1);
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn growing_rewrite_diverges() {
        let m = template(Language::Kotlin, NodeKind::Call, "f(#x#)").unwrap();
        let err = replace_all(kotlin("val a = f(1)"), &m, |m| m.render("f(f(#x#))")).unwrap_err();
        assert!(matches!(err, RewriteError::Diverged { pass: 2, .. }));
        assert!(err.to_string().contains("cannot converge"));
    }

    #[test]
    fn syntax_validation_rejects_broken_output() {
        let m = template(Language::Kotlin, NodeKind::Call, "f(#x#)").unwrap();
        let err = Rewriter::new()
            .validate_syntax(true)
            .replace_all(kotlin("val a = f(1)"), &m, |m| m.render("g(#x#"))
            .unwrap_err();
        assert!(matches!(err, RewriteError::InvalidResult { pass: 1, .. }));
    }

    #[test]
    fn undefined_replacement_variable_suggests() {
        let m = template(Language::Kotlin, NodeKind::Call, "f(#value#)").unwrap();
        let err = RewriteRule::new(m, "g(#valeu#)").unwrap_err();
        match &err {
            RewriteError::UndefinedVariable { name, suggestion } => {
                assert_eq!(name, "valeu");
                assert_eq!(suggestion.as_deref(), Some("value"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("did you mean 'value'"));
    }

    #[test]
    fn innermost_defers_ancestors() {
        let parsed = kotlin("val a = f(f(1), f(2))");
        let m = template(Language::Kotlin, NodeKind::Call, "f(#a?#, #b?#)").unwrap();
        let matches = m.find_all_with_variables(parsed.root());
        assert_eq!(matches.len(), 3);
        let ready: Vec<_> = innermost(&matches, &HashSet::new())
            .iter()
            .map(|m| m.text())
            .collect();
        assert_eq!(ready, vec!["f(1)", "f(2)"]);

        let settled: HashSet<usize> = matches
            .iter()
            .filter(|m| m.text() != "f(f(1), f(2))")
            .map(|m| m.node.id())
            .collect();
        let ready: Vec<_> = innermost(&matches, &settled).iter().map(|m| m.text()).collect();
        assert_eq!(ready, vec!["f(f(1), f(2))"]);
    }

    fn box_unless_one(m: &MatchResult<'_>) -> String {
        match m.bindings.text("x") {
            Some("1") => m.text().to_string(),
            _ => m.render("box(#x#)"),
        }
    }

    #[test]
    fn unchanged_inner_match_releases_ancestor() {
        let m = template(Language::Kotlin, NodeKind::Call, "wrap(#x#)").unwrap();
        let out = replace_all(kotlin("val a = wrap(wrap(1))"), &m, box_unless_one).unwrap();
        assert_eq!(out.source(), "val a = box(wrap(1))");
        assert_eq!(out.replacements, 1);
    }

    #[test]
    fn unchanged_inner_match_beside_changed_sibling() {
        let m = template(Language::Kotlin, NodeKind::Call, "wrap(#x#)").unwrap();
        let source = "val a = wrap(wrap(1))\nval b = wrap(2)";
        let out = replace_all(kotlin(source), &m, box_unless_one).unwrap();
        assert_eq!(out.source(), "val a = box(wrap(1))\nval b = box(2)");
        assert_eq!(out.replacements, 2);
    }

    #[test]
    fn unchanged_middle_of_three_levels() {
        let m = template(Language::Kotlin, NodeKind::Call, "wrap(#x#)").unwrap();
        let out = replace_all(kotlin("val a = wrap(wrap(wrap(1)))"), &m, box_unless_one).unwrap();
        assert_eq!(out.source(), "val a = box(box(wrap(1)))");
        assert_eq!(out.replacements, 2);
    }
}
