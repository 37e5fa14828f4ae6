use jk_rewrite::{pool, replace_all, template, AdaptiveMatcher, Language, NodeKind};
use jk_rewrite::search::descendants;
use proptest::prelude::*;

/// Kotlin call expressions nested up to a few levels.
fn kotlin_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..100).prop_map(|n| n.to_string()),
        prop::sample::select(vec!["a", "b", "name"]).prop_map(str::to_string),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        (
            prop::sample::select(vec!["f", "g", "invoke"]),
            prop::collection::vec(inner, 0..3),
        )
            .prop_map(|(callee, args)| format!("{callee}({})", args.join(", ")))
    })
}

proptest! {
    #[test]
    fn identity_replacement_preserves_text(expr in kotlin_expr()) {
        let source = format!("val x = {expr}");
        let matcher = template(Language::Kotlin, NodeKind::Call, "f(#a?#, #b?#)").unwrap();
        let tree = pool::parse(Language::Kotlin, source.clone()).unwrap();

        let out = replace_all(tree, &matcher, |m| m.text().to_string()).unwrap();
        prop_assert_eq!(out.source(), source.as_str());
        prop_assert_eq!(out.replacements, 0);
    }

    #[test]
    fn rewrite_removes_every_match(expr in kotlin_expr()) {
        let source = format!("val x = {expr}");
        let matcher = template(Language::Kotlin, NodeKind::Call, "invoke(#a?#, #b?#)").unwrap();
        let tree = pool::parse(Language::Kotlin, source).unwrap();

        let out = replace_all(tree, &matcher, |m| {
            let replacement = match (m.bindings.contains("a"), m.bindings.contains("b")) {
                (true, true) => "apply(#a#, #b#)",
                (true, false) => "apply(#a#)",
                _ => "apply()",
            };
            m.render(replacement)
        })
        .unwrap();
        prop_assert!(matcher.find_all(out.tree.root()).is_empty());
        prop_assert!(!out.source().contains("invoke("));
    }

    #[test]
    fn adaptive_reordering_never_changes_outcomes(expr in kotlin_expr()) {
        let source = format!("val x = {expr}");
        let tree = pool::parse(Language::Kotlin, source).unwrap();
        let matcher = template(Language::Kotlin, NodeKind::Call, "g(#a#, #b?#)").unwrap();
        let mut adaptive = AdaptiveMatcher::new(matcher.clone());

        for _ in 0..3 {
            for node in descendants(tree.root()) {
                let expected = matcher.matches(node).map(|b| b.len());
                let actual = adaptive.matches(node).map(|b| b.len());
                prop_assert_eq!(expected, actual);
            }
        }
    }
}
