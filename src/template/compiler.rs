//! Recursive compilation of a parsed snippet into a [`Matcher`].

use crate::matcher::{Bindings, Check, Index, Matcher, NodeType};
use crate::resolver::Resolver;
use crate::syntax::{Field, ListField, NodeKind, SyntaxNode};
use crate::template::errors::TemplateError;
use crate::template::placeholder::{Constraint, Placeholder};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Syntactic position a sub-template occupies in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    Expression,
    Type,
    /// The template root; free variables take the requested target.
    Root(NodeType),
}

impl Site {
    fn describe(self) -> &'static str {
        match self {
            Site::Expression | Site::Root(_) => "expression",
            Site::Type => "type",
        }
    }

    fn for_node(node: SyntaxNode<'_>) -> Self {
        if node.kind() == NodeKind::Type {
            Site::Type
        } else {
            Site::Expression
        }
    }
}

struct TextCheck {
    pattern: Regex,
}

impl Check for TextCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        self.pattern.is_match(node.text()).then(Bindings::new)
    }
}

struct TypeCheck {
    fq_name: String,
    resolver: Arc<dyn Resolver>,
}

impl Check for TypeCheck {
    fn check<'t>(&self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        self.resolver
            .resolve_type(node)
            .is_some_and(|ty| ty.conforms_to(&self.fq_name))
            .then(Bindings::new)
    }
}

enum Prepared {
    Text(Regex),
    Type(String),
}

/// One template variable ready to be placed.
struct Variable {
    optional: bool,
    constraints: Vec<Prepared>,
    supplied: Option<Matcher>,
}

pub(crate) struct Compiler {
    stand_ins: HashMap<String, String>,
    variables: BTreeMap<String, Variable>,
    resolver: Option<Arc<dyn Resolver>>,
    reached: BTreeSet<String>,
}

fn whitespace_free(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl Compiler {
    pub(crate) fn new(
        placeholders: &[Placeholder],
        stand_ins: HashMap<String, String>,
        mut supplied: BTreeMap<String, Matcher>,
        resolver: Option<Arc<dyn Resolver>>,
    ) -> Result<Self, TemplateError> {
        let mut variables = BTreeMap::new();
        for placeholder in placeholders {
            let mut constraints = Vec::new();
            for constraint in &placeholder.constraints {
                match constraint {
                    Constraint::Text(pattern) => {
                        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                            TemplateError::InvalidPattern {
                                name: placeholder.name.clone(),
                                message: e.to_string(),
                            }
                        })?;
                        constraints.push(Prepared::Text(regex));
                    }
                    Constraint::Type(fq_name) => {
                        if resolver.is_none() {
                            return Err(TemplateError::MissingResolver {
                                name: placeholder.name.clone(),
                            });
                        }
                        constraints.push(Prepared::Type(fq_name.clone()));
                    }
                }
            }
            variables.insert(
                placeholder.name.clone(),
                Variable {
                    optional: placeholder.optional,
                    constraints,
                    supplied: supplied.remove(&placeholder.name),
                },
            );
        }
        Ok(Self {
            stand_ins,
            variables,
            resolver,
            reached: BTreeSet::new(),
        })
    }

    /// Compile the template root and verify every variable was placed.
    pub(crate) fn compile_root(
        mut self,
        node: SyntaxNode<'_>,
        target: NodeType,
    ) -> Result<Matcher, TemplateError> {
        let site = if target == NodeType::Kind(NodeKind::Type) {
            Site::Type
        } else {
            Site::Root(target)
        };
        let matcher = self.compile(node, site)?;
        if let Some(name) = self.variables.keys().find(|name| !self.reached.contains(*name)) {
            return Err(TemplateError::UnreachableVariable { name: name.clone() });
        }
        Ok(matcher)
    }

    fn compile(&mut self, node: SyntaxNode<'_>, site: Site) -> Result<Matcher, TemplateError> {
        if let Some(name) = self.stand_ins.get(node.text()).cloned() {
            return self.variable(&name, site);
        }

        let kind = node.kind();
        match kind {
            NodeKind::Call | NodeKind::NewInstance => self.call(node),
            NodeKind::Qualified => self.qualified(node),
            NodeKind::Binary => self.binary(node),
            NodeKind::Unary => self.unary(node),
            NodeKind::Parenthesized => {
                let inner = self.child(node.inner(), node)?;
                let inner = self.compile(inner, Site::Expression)?;
                Ok(Matcher::of_kind(kind).add_child_matcher(Field::Inner, inner)?)
            }
            NodeKind::Variable => self.variable_declaration(node),
            NodeKind::Annotation => self.annotation(node),
            NodeKind::NamedArgument => {
                let name = self.child(node.name(), node)?;
                let value = self.child(node.value(), node)?;
                let name = self.compile(name, Site::Expression)?;
                let value = self.compile(value, Site::Expression)?;
                Ok(Matcher::of_kind(kind)
                    .add_child_matcher(Field::Name, name)?
                    .add_child_matcher(Field::Value, value)?)
            }
            NodeKind::Type => {
                let expected = whitespace_free(node.text());
                Ok(Matcher::of_kind(kind)
                    .add_custom_matcher(move |n| whitespace_free(n.text()) == expected))
            }
            NodeKind::Identifier | NodeKind::Literal | NodeKind::This | NodeKind::Super => {
                let expected = node.text().to_string();
                Ok(Matcher::of_kind(kind).add_custom_matcher(move |n| n.text() == expected))
            }
            NodeKind::Other => Err(unsupported(node)),
        }
    }

    fn child<'t>(
        &self,
        child: Option<SyntaxNode<'t>>,
        parent: SyntaxNode<'_>,
    ) -> Result<SyntaxNode<'t>, TemplateError> {
        child.ok_or_else(|| unsupported(parent))
    }

    fn variable(&mut self, name: &str, site: Site) -> Result<Matcher, TemplateError> {
        self.reached.insert(name.to_string());
        let Some(variable) = self.variables.get(name) else {
            return Err(TemplateError::UnreachableVariable {
                name: name.to_string(),
            });
        };

        let mut matcher = match &variable.supplied {
            Some(supplied) => {
                check_site(name, supplied.target(), site)?;
                supplied.clone()
            }
            None => Matcher::new(match site {
                Site::Root(target) => target,
                Site::Type => NodeType::Kind(NodeKind::Type),
                Site::Expression => NodeType::Any,
            }),
        };

        for constraint in &variable.constraints {
            let check: Arc<dyn Check> = match constraint {
                Prepared::Text(pattern) => Arc::new(TextCheck {
                    pattern: pattern.clone(),
                }),
                Prepared::Type(fq_name) => {
                    let Some(resolver) = &self.resolver else {
                        return Err(TemplateError::MissingResolver {
                            name: name.to_string(),
                        });
                    };
                    Arc::new(TypeCheck {
                        fq_name: fq_name.clone(),
                        resolver: Arc::clone(resolver),
                    })
                }
            };
            matcher = matcher.add_check(check);
        }

        let matcher = matcher.bind(name)?;
        Ok(if variable.optional {
            matcher.optional()
        } else {
            matcher
        })
    }

    fn arguments(
        &mut self,
        matcher: Matcher,
        arguments: Vec<SyntaxNode<'_>>,
    ) -> Result<Matcher, TemplateError> {
        let count = arguments.len();
        let compiled = arguments
            .into_iter()
            .map(|arg| self.compile(arg, Site::Expression))
            .collect::<Result<Vec<_>, _>>()?;

        if compiled.iter().any(Matcher::is_optional) {
            return Ok(matcher.add_matchers_in_order(ListField::Arguments, compiled)?);
        }
        let indexed = compiled
            .into_iter()
            .enumerate()
            .map(|(i, m)| (Index::at(i), m))
            .collect();
        Ok(matcher
            .add_custom_matcher(move |n| n.arguments().len() == count)
            .add_indexed_matchers(ListField::Arguments, indexed)?)
    }

    fn call(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let callee = self.child(node.callee(), node)?;
        let callee = self.compile(callee, Site::for_node(callee))?;
        let mut matcher = Matcher::of_kind(node.kind()).add_child_matcher(Field::Callee, callee)?;

        matcher = match node.receiver() {
            Some(receiver) => {
                let operator = node.operator().map(str::to_string);
                let receiver = self.compile(receiver, Site::Expression)?;
                matcher
                    .add_child_matcher(Field::Receiver, receiver)?
                    .add_custom_matcher(move |n| n.operator() == operator.as_deref())
            }
            None => matcher.add_custom_matcher(|n| n.receiver().is_none()),
        };

        if let Some(type_arguments) = node.type_arguments() {
            let expected = whitespace_free(type_arguments.text());
            matcher = matcher.add_child_predicate(Field::TypeArguments, move |t| {
                whitespace_free(t.text()) == expected
            });
        }

        self.arguments(matcher, node.arguments())
    }

    fn qualified(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let receiver = self.child(node.receiver(), node)?;
        let selector = self.child(node.selector(), node)?;
        let operator = node.operator().map(str::to_string);
        let receiver = self.compile(receiver, Site::Expression)?;
        let selector = self.compile(selector, Site::Expression)?;

        Ok(Matcher::of_kind(NodeKind::Qualified)
            .add_custom_matcher(move |n| n.operator() == operator.as_deref())
            .add_child_matcher(Field::Receiver, receiver)?
            .add_child_matcher(Field::Selector, selector)?)
    }

    fn binary(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let left = self.child(node.left(), node)?;
        let right = self.child(node.right(), node)?;
        let operator = node
            .operator()
            .map(str::to_string)
            .ok_or_else(|| unsupported(node))?;
        let left = self.compile(left, Site::for_node(left))?;
        let right = self.compile(right, Site::for_node(right))?;

        Ok(Matcher::of_kind(NodeKind::Binary)
            .add_custom_matcher(move |n| n.operator() == Some(operator.as_str()))
            .add_child_matcher(Field::Left, left)?
            .add_child_matcher(Field::Right, right)?)
    }

    fn unary(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let operand = self.child(node.operand(), node)?;
        let operator = node.operator().map(str::to_string);
        let prefix = node.is_prefix();
        let operand = self.compile(operand, Site::Expression)?;

        Ok(Matcher::of_kind(NodeKind::Unary)
            .add_custom_matcher(move |n| {
                n.is_prefix() == prefix && n.operator() == operator.as_deref()
            })
            .add_child_matcher(Field::Operand, operand)?)
    }

    fn variable_declaration(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let mut matcher = Matcher::of_kind(NodeKind::Variable);

        if let Some(keyword) = node.binding_keyword() {
            let keyword = keyword.to_string();
            matcher = matcher.add_custom_matcher(move |n| n.binding_keyword() == Some(keyword.as_str()));
        }

        let name = self.child(node.name(), node)?;
        let name = self.compile(name, Site::Expression)?;
        matcher = matcher.add_child_matcher(Field::Name, name)?;

        if let Some(ty) = node.declared_type() {
            let ty = self.compile(ty, Site::Type)?;
            matcher = matcher.add_child_matcher(Field::DeclaredType, ty)?;
        }
        if let Some(init) = node.initializer() {
            let init = self.compile(init, Site::Expression)?;
            matcher = matcher.add_child_matcher(Field::Initializer, init)?;
        }
        if let Some(delegate) = node.delegate() {
            let delegate = self.compile(delegate, Site::Expression)?;
            matcher = matcher.add_child_matcher(Field::Delegate, delegate)?;
        }
        Ok(matcher)
    }

    fn annotation(&mut self, node: SyntaxNode<'_>) -> Result<Matcher, TemplateError> {
        let name = self.child(node.name(), node)?;
        let mut matcher = Matcher::of_kind(NodeKind::Annotation);

        if self.stand_ins.contains_key(name.text()) {
            let name = self.compile(name, Site::Expression)?;
            matcher = matcher.add_child_matcher(Field::Name, name)?;
        } else {
            let short = node
                .annotation_short_name()
                .map(str::to_string)
                .ok_or_else(|| unsupported(node))?;
            matcher = matcher
                .add_custom_matcher(move |n| n.annotation_short_name() == Some(short.as_str()));
        }

        self.arguments(matcher, node.arguments())
    }
}

/// An externally supplied matcher must fit where its placeholder sits.
fn check_site(name: &str, target: NodeType, site: Site) -> Result<(), TemplateError> {
    let fits = match (site, target) {
        (Site::Type, target) => target.accepts(NodeKind::Type),
        (_, NodeType::Kind(kind)) => !matches!(
            kind,
            NodeKind::Type | NodeKind::Variable | NodeKind::Annotation
        ),
        _ => true,
    };
    if fits {
        Ok(())
    } else {
        Err(TemplateError::TypeMismatch {
            name: name.to_string(),
            expected: target.to_string(),
            found: site.describe().to_string(),
        })
    }
}

fn unsupported(node: SyntaxNode<'_>) -> TemplateError {
    TemplateError::Unsupported {
        kind: node.grammar_kind().to_string(),
        text: node.text().to_string(),
    }
}
