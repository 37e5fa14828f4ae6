//! Accessors for the tree-sitter-java grammar.

use crate::syntax::node::{NodeKind, SyntaxNode};

pub(crate) fn classify(node: &SyntaxNode<'_>) -> NodeKind {
    if !node.raw().is_named() {
        return NodeKind::Other;
    }
    match node.grammar_kind() {
        "method_invocation" => NodeKind::Call,
        "object_creation_expression" => NodeKind::NewInstance,
        "field_access" => NodeKind::Qualified,
        "binary_expression" | "assignment_expression" | "instanceof_expression" => {
            NodeKind::Binary
        }
        "unary_expression" | "update_expression" => NodeKind::Unary,
        "parenthesized_expression" => NodeKind::Parenthesized,
        "identifier" => NodeKind::Identifier,
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal"
        | "decimal_floating_point_literal"
        | "hex_floating_point_literal"
        | "true"
        | "false"
        | "character_literal"
        | "string_literal"
        | "text_block"
        | "null_literal" => NodeKind::Literal,
        "this" => NodeKind::This,
        "super" => NodeKind::Super,
        "type_identifier"
        | "generic_type"
        | "scoped_type_identifier"
        | "array_type"
        | "integral_type"
        | "floating_point_type"
        | "boolean_type"
        | "void_type" => NodeKind::Type,
        "local_variable_declaration" | "field_declaration" => NodeKind::Variable,
        "marker_annotation" | "annotation" => NodeKind::Annotation,
        "element_value_pair" => NodeKind::NamedArgument,
        _ => NodeKind::Other,
    }
}

pub(crate) fn callee<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "method_invocation" => node.child_by_field("name"),
        "object_creation_expression" => node.child_by_field("type"),
        _ => None,
    }
}

pub(crate) fn receiver<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "method_invocation" | "field_access" => node.child_by_field("object"),
        _ => None,
    }
}

pub(crate) fn selector<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "field_access" => node.child_by_field("field"),
        _ => None,
    }
}

pub(crate) fn type_arguments<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "method_invocation" | "object_creation_expression" => {
            node.child_by_field("type_arguments")
        }
        _ => None,
    }
}

pub(crate) fn arguments<'t>(node: &SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "method_invocation" | "object_creation_expression" | "annotation" => node
            .child_by_field("arguments")
            .map(|list| list.named_children())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

pub(crate) fn left<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Binary => node.child_by_field("left"),
        _ => None,
    }
}

pub(crate) fn right<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Binary => node
            .child_by_field("right")
            .or_else(|| node.child_by_field("pattern")),
        _ => None,
    }
}

pub(crate) fn operand<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "unary_expression" => node.child_by_field("operand"),
        "update_expression" => node.named_children().into_iter().next(),
        _ => None,
    }
}

fn declarator<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.child_by_field("declarator")
}

pub(crate) fn name<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Variable => declarator(node)?.child_by_field("name"),
        NodeKind::Annotation => node.child_by_field("name"),
        NodeKind::NamedArgument => node.child_by_field("key"),
        _ => None,
    }
}

pub(crate) fn declared_type<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Variable => node.child_by_field("type"),
        _ => None,
    }
}

pub(crate) fn initializer<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match classify(node) {
        NodeKind::Variable => declarator(node)?.child_by_field("value"),
        _ => None,
    }
}

pub(crate) fn value<'t>(node: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    match node.grammar_kind() {
        "element_value_pair" => node.child_by_field("value"),
        _ => None,
    }
}
