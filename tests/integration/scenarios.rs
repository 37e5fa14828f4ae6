use jk_rewrite::{pool, replace_all, template, Language, Matcher, NodeKind, RewriteRule, Rewriter};

fn texts(language: Language, matcher: &Matcher, source: &str) -> Vec<String> {
    let tree = pool::parse(language, source).unwrap();
    matcher
        .find_all(tree.root())
        .iter()
        .map(|node| node.text().to_string())
        .collect()
}

const KOTLIN_CALLS: &str = r#"
fun calls() {
    doIt()
    doIt(1)
    doIt(1, 2)
    doIt(1, 2, 3)
}
"#;

const JAVA_CALLS: &str = r#"
class Calls {
    void calls() {
        doIt();
        doIt(1);
        doIt(1, 2);
        doIt(1, 2, 3);
    }
}
"#;

#[test]
fn exact_arity_without_optional_markers() {
    for (language, source) in [(Language::Kotlin, KOTLIN_CALLS), (Language::Java, JAVA_CALLS)] {
        let matcher = template(language, NodeKind::Call, "doIt(#a#, #b#)").unwrap();
        assert_eq!(texts(language, &matcher, source), vec!["doIt(1, 2)"], "{language}");
    }
}

#[test]
fn optional_markers_relax_arity() {
    for (language, source) in [(Language::Kotlin, KOTLIN_CALLS), (Language::Java, JAVA_CALLS)] {
        let matcher = template(language, NodeKind::Call, "doIt(#a?#, #b?#)").unwrap();
        assert_eq!(
            texts(language, &matcher, source),
            vec!["doIt()", "doIt(1)", "doIt(1, 2)"],
            "{language}"
        );
    }
}

#[test]
fn nested_invoke_converges_kotlin() {
    let matcher = template(Language::Kotlin, NodeKind::Call, "invoke(#x?#)").unwrap();
    let tree = pool::parse(
        Language::Kotlin,
        "val r = invoke(invoke(invoke() + invoke(2)))",
    )
    .unwrap();

    let out = replace_all(tree, &matcher, |m| m.render("apply(#x#)")).unwrap();
    assert_eq!(out.source(), "val r = apply(apply(apply() + apply(2)))");
    assert_eq!(out.replacements, 4);
    assert_eq!(out.passes, 3);
}

#[test]
fn nested_invoke_converges_java() {
    let matcher = template(Language::Java, NodeKind::Call, "invoke(#x?#)").unwrap();
    let rule = RewriteRule::new(matcher.clone(), "apply(#x#)").unwrap();
    let source = "class A {\n  int r = invoke(invoke(invoke() + invoke(2)));\n}\n";
    let tree = pool::parse(Language::Java, source).unwrap();

    let out = rule
        .apply(tree, &Rewriter::new().validate_syntax(true))
        .unwrap();
    assert_eq!(
        out.source(),
        "class A {\n  int r = apply(apply(apply() + apply(2)));\n}\n"
    );

    // The replacement no longer matches, so a fresh search is empty.
    assert!(matcher.find_all(out.tree.root()).is_empty());
}

#[test]
fn receiver_qualified_template_only_matches_qualified_calls() {
    let matcher = template(Language::Kotlin, NodeKind::Call, "#list#.add(#item#)").unwrap();
    let source = "fun f() {\n  xs.add(1)\n  add(2)\n  ys?.add(3)\n}";
    assert_eq!(texts(Language::Kotlin, &matcher, source), vec!["xs.add(1)"]);
}

#[test]
fn bindings_render_into_replacement() {
    let matcher = template(Language::Java, NodeKind::Binary, "#a# + #b#").unwrap();
    let tree = pool::parse(Language::Java, "class A { int x = one() + two; }").unwrap();
    let out = replace_all(tree, &matcher, |m| m.render("sum(#a#, #b#)")).unwrap();
    assert_eq!(out.source(), "class A { int x = sum(one(), two); }");
}

#[test]
fn text_constraint_filters_matches() {
    let matcher = template(Language::Kotlin, NodeKind::Call, r#"log(#msg{text="[^"]*"}#)"#).unwrap();
    let source = "fun f() {\n  log(\"hi\")\n  log(name)\n}";
    assert_eq!(texts(Language::Kotlin, &matcher, source), vec!["log(\"hi\")"]);
}

#[test]
fn partial_identity_rewrite_reaches_outer_calls() {
    let matcher = template(Language::Java, NodeKind::Call, "wrap(#x#)").unwrap();
    let source = "class A {\n  int a = wrap(wrap(1));\n  int b = wrap(2);\n}";
    let tree = pool::parse(Language::Java, source).unwrap();
    let out = Rewriter::new()
        .validate_syntax(true)
        .replace_all(tree, &matcher, |m| match m.bindings.text("x") {
            Some("1") => m.text().to_string(),
            _ => m.render("box(#x#)"),
        })
        .unwrap();
    assert_eq!(
        out.source(),
        "class A {\n  int a = box(wrap(1));\n  int b = box(2);\n}"
    );
    assert_eq!(out.replacements, 2);
    assert_eq!(texts(Language::Java, &matcher, out.source()), vec!["wrap(1)"]);
}
