use crate::matcher::NodeType;
use crate::syntax::Language;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    /// Extra supertype edges, fully qualified name to direct supertypes.
    #[serde(default)]
    pub types: BTreeMap<String, Vec<String>>,
}

impl RuleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            let rule_id = (!rule.id.trim().is_empty()).then(|| rule.id.clone());
            match &rule_id {
                None => issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                }),
                Some(id) => {
                    if !seen.insert(rule.id.as_str()) {
                        issues.push(ValidationIssue::DuplicateId { rule_id: id.clone() });
                    }
                }
            }

            if rule.template.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: rule_id.clone(),
                    field: "template",
                });
            }
            if let Some(replacement) = &rule.replacement {
                if replacement.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: rule_id.clone(),
                        field: "replacement",
                    });
                }
            }
            if let Some(language) = &rule.language {
                if let Err(e) = language.parse::<Language>() {
                    issues.push(ValidationIssue::InvalidValue {
                        rule_id: rule_id.clone(),
                        field: "language",
                        message: e.to_string(),
                    });
                }
            }
            if let Some(kind) = &rule.kind {
                if let Err(e) = kind.parse::<NodeType>() {
                    issues.push(ValidationIssue::InvalidValue {
                        rule_id: rule_id.clone(),
                        field: "kind",
                        message: e.to_string(),
                    });
                }
            }
        }

        for (name, supers) in &self.types {
            if name.trim().is_empty() || supers.iter().any(|s| s.trim().is_empty()) {
                issues.push(ValidationIssue::InvalidValue {
                    rule_id: None,
                    field: "types",
                    message: format!("blank type name in entry '{name}'"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    /// Absent means the rule applies to every language.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub template: String,
    /// Absent means a search-only rule.
    #[serde(default)]
    pub replacement: Option<String>,
}

impl RuleDefinition {
    /// Languages this rule applies to. Only meaningful after validation.
    pub fn languages(&self) -> Vec<Language> {
        match &self.language {
            Some(name) => name.parse().map(|l| vec![l]).unwrap_or_default(),
            None => Language::ALL.to_vec(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind
            .as_deref()
            .and_then(|kind| kind.parse().ok())
            .unwrap_or(NodeType::Any)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        rule_id: String,
    },
    InvalidValue {
        rule_id: Option<String>,
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule file contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { rule_id } => {
                write!(f, "rule id '{rule_id}' is used more than once")
            }
            ValidationIssue::InvalidValue {
                rule_id,
                field,
                message,
            } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid '{field}': {message}"),
                None => write!(f, "invalid '{field}': {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> RuleDefinition {
        RuleDefinition {
            id: id.into(),
            language: None,
            kind: None,
            template: "f(#x#)".into(),
            replacement: None,
        }
    }

    #[test]
    fn duplicate_ids_reported_once_per_repeat() {
        let config = RuleConfig {
            rules: vec![rule("a"), rule("b"), rule("a"), rule("a")],
            ..Default::default()
        };
        let issues = config.validate().unwrap_err().issues;
        assert_eq!(
            issues,
            vec![
                ValidationIssue::DuplicateId { rule_id: "a".into() },
                ValidationIssue::DuplicateId { rule_id: "a".into() },
            ]
        );
    }

    #[test]
    fn distinct_ids_validate() {
        let config = RuleConfig {
            rules: vec![rule("a"), rule("b")],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
