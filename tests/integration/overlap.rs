use jk_rewrite::{pool, rewrite_with, template, Language, NodeKind, Patch, PatchError, RewriteError};

#[test]
fn overlapping_patches_fail_the_whole_rewrite() {
    let source = "val a = f(1) + f(2)";
    let matcher = template(Language::Kotlin, NodeKind::Call, "f(#x#)").unwrap();
    let tree = pool::parse(Language::Kotlin, source).unwrap();

    // Each patch reaches four bytes back, so the second eats the end of the first.
    let err = rewrite_with(tree, &matcher, |m| {
        let start = m.node.start_offset().saturating_sub(4);
        let end = m.node.end_offset();
        Patch::new(start, end, "g()", &source[start..end])
    })
    .unwrap_err();

    match err {
        RewriteError::Patch(PatchError::Overlap {
            first_start,
            first_end,
            second_start,
            second_end,
            ..
        }) => {
            assert_eq!((first_start, first_end), (4, 12));
            assert_eq!((second_start, second_end), (11, 19));
        }
        other => panic!("expected overlap, got {other:?}"),
    }
}

#[test]
fn sibling_matches_do_not_overlap() {
    let source = "val a = f(1) + f(2)";
    let matcher = template(Language::Kotlin, NodeKind::Call, "f(#x#)").unwrap();
    let tree = pool::parse(Language::Kotlin, source).unwrap();

    let out = rewrite_with(tree, &matcher, |m| Patch::replace(m.node, m.render("h(#x#)"))).unwrap();
    assert_eq!(out.source(), "val a = h(1) + h(2)");
}

#[test]
fn stale_before_text_is_rejected() {
    let matcher = template(Language::Java, NodeKind::Call, "f(#x#)").unwrap();
    let tree = pool::parse(Language::Java, "class A { int a = f(1); }").unwrap();

    let err = rewrite_with(tree, &matcher, |m| {
        Patch::new(m.node.start_offset(), m.node.end_offset(), "g(1)", "not this")
    })
    .unwrap_err();
    assert!(matches!(
        err,
        RewriteError::Patch(PatchError::BeforeTextMismatch { .. })
    ));
}
