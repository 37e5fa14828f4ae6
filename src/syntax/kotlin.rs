//! Accessors for the tree-sitter-kotlin grammar.
//!
//! Kotlin has no dedicated method-call node: `a.b(c)` is a `call_expression`
//! whose first child is the `navigation_expression` `a.b`. The navigation node
//! in that position is folded into the call and classified as `Other`.

use crate::syntax::node::{NodeKind, SyntaxNode};

pub(crate) fn classify(node: &SyntaxNode<'_>) -> NodeKind {
    if !node.raw().is_named() {
        return match node.grammar_kind() {
            "null" => NodeKind::Literal,
            _ => NodeKind::Other,
        };
    }
    match node.grammar_kind() {
        "call_expression" => NodeKind::Call,
        "navigation_expression" if is_call_target(node) => NodeKind::Other,
        "navigation_expression" => NodeKind::Qualified,
        "directly_assignable_expression" if navigation_suffix(node).is_some() => {
            NodeKind::Qualified
        }
        "additive_expression"
        | "multiplicative_expression"
        | "comparison_expression"
        | "equality_expression"
        | "conjunction_expression"
        | "disjunction_expression"
        | "elvis_expression"
        | "infix_expression"
        | "range_expression"
        | "check_expression"
        | "as_expression"
        | "assignment" => NodeKind::Binary,
        "prefix_expression" | "postfix_expression" => NodeKind::Unary,
        "parenthesized_expression" => NodeKind::Parenthesized,
        "simple_identifier" => NodeKind::Identifier,
        "integer_literal" | "long_literal" | "hex_literal" | "bin_literal" | "real_literal"
        | "unsigned_literal" | "boolean_literal" | "character_literal" | "string_literal" => {
            NodeKind::Literal
        }
        "this_expression" => NodeKind::This,
        "super_expression" => NodeKind::Super,
        "user_type" | "nullable_type" | "function_type" | "parenthesized_type"
        | "non_nullable_type" => NodeKind::Type,
        "property_declaration" => NodeKind::Variable,
        "annotation" => NodeKind::Annotation,
        "value_argument" if is_named_argument(node) => NodeKind::NamedArgument,
        _ => NodeKind::Other,
    }
}

fn is_call_target(node: &SyntaxNode<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        parent.grammar_kind() == "call_expression"
            && parent
                .named_children()
                .first()
                .is_some_and(|first| first.id() == node.id())
    })
}

fn has_token(node: &SyntaxNode<'_>, token: &str) -> bool {
    node.all_children()
        .iter()
        .any(|c| !c.raw().is_named() && c.grammar_kind() == token)
}

fn is_named_argument(node: &SyntaxNode<'_>) -> bool {
    has_token(node, "=")
}

fn navigation_suffix<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.first_named_of(&["navigation_suffix"])
}

fn call_target<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.named_children().into_iter().next()
}

fn call_suffix<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.first_named_of(&["call_suffix"])
}

fn last_named<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.named_children().into_iter().last()
}

pub(crate) fn callee<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if node.grammar_kind() != "call_expression" {
        return None;
    }
    let target = call_target(node)?;
    if target.grammar_kind() == "navigation_expression" {
        last_named(&navigation_suffix(&target)?)
    } else {
        Some(target)
    }
}

pub(crate) fn receiver<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Call => {
            let target = call_target(node)?;
            if target.grammar_kind() == "navigation_expression" {
                call_target(&target)
            } else {
                None
            }
        }
        NodeKind::Qualified => node.named_children().into_iter().next(),
        _ => None,
    }
}

pub(crate) fn selector<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Qualified => last_named(&navigation_suffix(node)?),
        _ => None,
    }
}

pub(crate) fn type_arguments<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "call_expression" => call_suffix(node)?.first_named_of(&["type_arguments"]),
        _ => None,
    }
}

fn unwrap_argument<'t>(argument: SyntaxNode<'t>) -> SyntaxNode<'t> {
    if is_named_argument(&argument) {
        return argument;
    }
    last_named(&argument).unwrap_or(argument)
}

fn value_arguments<'t>(list: &SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    list.named_children()
        .into_iter()
        .filter(|c| c.grammar_kind() == "value_argument")
        .map(unwrap_argument)
        .collect()
}

pub(crate) fn arguments<'t>(node: &SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "call_expression" => {
            let Some(suffix) = call_suffix(node) else {
                return Vec::new();
            };
            let mut args = suffix
                .first_named_of(&["value_arguments"])
                .map(|list| value_arguments(&list))
                .unwrap_or_default();
            // Trailing lambda counts as the last argument.
            if let Some(lambda) = suffix.first_named_of(&["annotated_lambda"]) {
                args.push(lambda.first_named_of(&["lambda_literal"]).unwrap_or(lambda));
            }
            args
        }
        "annotation" => node
            .first_named_of(&["constructor_invocation"])
            .and_then(|ctor| ctor.first_named_of(&["value_arguments"]))
            .map(|list| value_arguments(&list))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `x` on the left of `x = 1` is wrapped in a suffix-less assignable node.
fn unwrap_assignable<'t>(node: SyntaxNode<'t>) -> SyntaxNode<'t> {
    if node.grammar_kind() == "directly_assignable_expression" && navigation_suffix(&node).is_none()
    {
        let children = node.named_children();
        if children.len() == 1 {
            return children[0];
        }
    }
    node
}

pub(crate) fn left<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Binary => node.named_children().into_iter().next().map(unwrap_assignable),
        _ => None,
    }
}

pub(crate) fn right<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Binary => {
            let children = node.named_children();
            if children.len() < 2 {
                return None;
            }
            children.last().copied()
        }
        _ => None,
    }
}

pub(crate) fn operand<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    let children = node.named_children();
    match node.grammar_kind() {
        "prefix_expression" => children.last().copied(),
        "postfix_expression" => children.first().copied(),
        _ => None,
    }
}

fn variable_declaration<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.first_named_of(&["variable_declaration"])
}

fn annotation_type<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.first_named_of(&["user_type"]).or_else(|| {
        node.first_named_of(&["constructor_invocation"])?
            .first_named_of(&["user_type"])
    })
}

pub(crate) fn name<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Variable => variable_declaration(node)?.first_named_of(&["simple_identifier"]),
        NodeKind::Annotation => annotation_type(node),
        NodeKind::NamedArgument => node.first_named_of(&["simple_identifier"]),
        _ => None,
    }
}

pub(crate) fn declared_type<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if classify(node) != NodeKind::Variable {
        return None;
    }
    variable_declaration(node)?
        .named_children()
        .into_iter()
        .find(|c| classify(c) == NodeKind::Type)
}

pub(crate) fn initializer<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if classify(node) != NodeKind::Variable {
        return None;
    }
    let mut after_assign = false;
    for child in node.all_children() {
        if after_assign && child.raw().is_named() && !child.raw().is_extra() {
            return Some(child);
        }
        if !child.raw().is_named() && child.grammar_kind() == "=" {
            after_assign = true;
        }
    }
    None
}

pub(crate) fn delegate<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if classify(node) != NodeKind::Variable {
        return None;
    }
    last_named(&node.first_named_of(&["property_delegate"])?)
}

pub(crate) fn binding_keyword<'t>(node: &SyntaxNode<'t>) -> Option<&'t str> {
    if classify(node) != NodeKind::Variable {
        return None;
    }
    node.first_named_of(&["binding_pattern_kind"])
        .map(|kw| kw.text())
}

pub(crate) fn value<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::NamedArgument => last_named(node),
        _ => None,
    }
}
