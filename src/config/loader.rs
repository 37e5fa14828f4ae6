use crate::config::schema::{RuleConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse rule file ({}): {}", path.display(), source),
                None => write!(f, "failed to parse rule file: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule file ({}): {}", path.display(), source),
                None => write!(f, "invalid rule file: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleConfig, ConfigError> {
    let config: RuleConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;

    #[test]
    fn loads_minimal_rule() {
        let config = load_from_str(
            r##"
[meta]
name = "demo"

[[rules]]
id = "invoke"
template = "invoke(#x?#)"
"##,
        )
        .unwrap();
        assert_eq!(config.meta.name, "demo");
        assert_eq!(config.rules.len(), 1);
        assert!(config.rules[0].replacement.is_none());
        assert_eq!(config.rules[0].languages().len(), 2);
    }

    #[test]
    fn collects_every_issue() {
        let err = load_from_str(
            r##"
[[rules]]
id = "a"
language = "scala"
kind = "lambda"
template = " "

[[rules]]
id = "a"
template = "f()"
replacement = ""
"##,
        )
        .unwrap_err();
        let ConfigError::Validation { source, path: None } = err else {
            panic!("expected validation error");
        };
        let issues = source.issues;
        assert!(issues.contains(&ValidationIssue::DuplicateId {
            rule_id: "a".into()
        }));
        assert!(issues.contains(&ValidationIssue::MissingField {
            rule_id: Some("a".into()),
            field: "template"
        }));
        assert!(issues.contains(&ValidationIssue::MissingField {
            rule_id: Some("a".into()),
            field: "replacement"
        }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::InvalidValue { field: "language", .. })));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::InvalidValue { field: "kind", .. })));
    }

    #[test]
    fn empty_file_is_invalid() {
        let err = load_from_str("").unwrap_err();
        assert!(err.to_string().contains("no rules"));
    }

    #[test]
    fn path_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, "[[rules]]\nid = 3\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: Some(_), .. }));
        assert!(err.to_string().contains("rules.toml"));

        let missing = load_from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
