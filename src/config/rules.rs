//! Compiling a loaded rule file into matchers and rewrite rules.

use crate::config::schema::{RuleConfig, RuleDefinition};
use crate::matcher::Matcher;
use crate::resolver::DeclaredTypeResolver;
use crate::rewrite::{RewriteError, RewriteRule, Rewriter};
use crate::syntax::{Language, ParsedSource};
use crate::template::{Template, TemplateError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule '{id}' ({language}): {source}")]
    Template {
        id: String,
        language: Language,
        source: TemplateError,
    },

    #[error("rule '{id}' ({language}): {source}")]
    Rewrite {
        id: String,
        language: Language,
        source: RewriteError,
    },
}

/// One rule compiled for one language.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub language: Language,
    pub matcher: Matcher,
    /// `None` for search-only rules.
    pub rewrite: Option<RewriteRule>,
}

/// A match reported by [`RuleSet::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub byte_start: usize,
    pub byte_end: usize,
    /// 1-based line and column.
    pub line: usize,
    pub column: usize,
    pub text: String,
}

/// Per-rule replacement count from [`RuleSet::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub replacements: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule for every language it names. Type constraints are
    /// resolved with a [`DeclaredTypeResolver`] extended by the `[types]` table.
    pub fn compile(config: &RuleConfig) -> Result<Self, RuleError> {
        let rules = compile_each(config).into_iter().collect::<Result<Vec<_>, _>>()?;
        debug!(rules = rules.len(), "compiled rule set");
        Ok(Self { rules })
    }

    /// Build a set from a single ad-hoc rule.
    pub fn single(
        id: impl Into<String>,
        language: Language,
        matcher: Matcher,
        replacement: Option<&str>,
    ) -> Result<Self, RuleError> {
        let id = id.into();
        let rewrite = replacement
            .map(|r| RewriteRule::new(matcher.clone(), r))
            .transpose()
            .map_err(|source| RuleError::Rewrite {
                id: id.clone(),
                language,
                source,
            })?;
        Ok(Self {
            rules: vec![CompiledRule {
                id,
                language,
                matcher,
                rewrite,
            }],
        })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn for_language(&self, language: Language) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(move |r| r.language == language)
    }

    /// Every match of every rule for the tree's language, in rule then
    /// document order.
    pub fn search(&self, tree: &ParsedSource) -> Vec<RuleMatch> {
        let mut found = Vec::new();
        for rule in self.for_language(tree.language()) {
            for node in rule.matcher.find_all(tree.root()) {
                let (row, column) = node.position();
                found.push(RuleMatch {
                    rule_id: rule.id.clone(),
                    byte_start: node.start_offset(),
                    byte_end: node.end_offset(),
                    line: row + 1,
                    column: column + 1,
                    text: node.text().to_string(),
                });
            }
        }
        found
    }

    /// Apply the rewriting rules for the tree's language one after another.
    pub fn rewrite(
        &self,
        tree: ParsedSource,
        rewriter: &Rewriter,
    ) -> Result<(ParsedSource, Vec<RuleOutcome>), RuleError> {
        let mut current = tree;
        let mut outcomes = Vec::new();
        for rule in self.for_language(current.language()) {
            let Some(rewrite) = &rule.rewrite else {
                continue;
            };
            let result = rewrite
                .apply(current, rewriter)
                .map_err(|source| RuleError::Rewrite {
                    id: rule.id.clone(),
                    language: rule.language,
                    source,
                })?;
            if result.replacements > 0 {
                outcomes.push(RuleOutcome {
                    rule_id: rule.id.clone(),
                    replacements: result.replacements,
                });
            }
            current = result.tree;
        }
        Ok((current, outcomes))
    }
}

/// Compile every (rule, language) pair independently, keeping failures.
pub fn compile_each(config: &RuleConfig) -> Vec<Result<CompiledRule, RuleError>> {
    let resolver = Arc::new(DeclaredTypeResolver::new().with_hierarchy(config.types.clone()));
    config
        .rules
        .iter()
        .flat_map(|definition| {
            definition
                .languages()
                .into_iter()
                .map(move |language| (definition, language))
        })
        .map(|(definition, language)| compile_rule(definition, language, resolver.clone()))
        .collect()
}

fn compile_rule(
    definition: &RuleDefinition,
    language: Language,
    resolver: Arc<DeclaredTypeResolver>,
) -> Result<CompiledRule, RuleError> {
    let matcher = Template::new(language, definition.node_type(), definition.template.as_str())
        .resolver(resolver)
        .compile()
        .map_err(|source| RuleError::Template {
            id: definition.id.clone(),
            language,
            source,
        })?;
    let rewrite = definition
        .replacement
        .as_deref()
        .map(|replacement| RewriteRule::new(matcher.clone(), replacement))
        .transpose()
        .map_err(|source| RuleError::Rewrite {
            id: definition.id.clone(),
            language,
            source,
        })?;
    Ok(CompiledRule {
        id: definition.id.clone(),
        language,
        matcher,
        rewrite,
    })
}
