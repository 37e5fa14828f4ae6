//! The `#name{key=value,...}?#` placeholder mini-language.

use crate::template::errors::TemplateError;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"#([A-Za-z_][A-Za-z0-9_]*)(?:\{([^{}#]*)\})?(\?)?#")
            .expect("placeholder pattern is valid")
    })
}

/// A constraint attached to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The bound node's text must fully match this regex.
    Text(String),
    /// The bound node's resolved type or one of its supertypes must be this
    /// fully-qualified name.
    Type(String),
}

/// One placeholder occurrence in a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub optional: bool,
    pub constraints: Vec<Constraint>,
    /// Byte range of the whole `#...#` token.
    pub span: Range<usize>,
}

fn parse_constraints(name: &str, raw: &str) -> Result<Vec<Constraint>, TemplateError> {
    let mut constraints = Vec::new();
    for argument in raw.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let Some((key, value)) = argument.split_once('=') else {
            return Err(TemplateError::MalformedArgument {
                name: name.to_string(),
                argument: argument.to_string(),
            });
        };
        let value = value.trim().to_string();
        match key.trim() {
            "text" => constraints.push(Constraint::Text(value)),
            "type" => constraints.push(Constraint::Type(value)),
            other => {
                return Err(TemplateError::UnknownArgument {
                    name: name.to_string(),
                    key: other.to_string(),
                })
            }
        }
    }
    Ok(constraints)
}

/// All placeholder occurrences in `text`, in source order.
pub fn scan(text: &str) -> Result<Vec<Placeholder>, TemplateError> {
    placeholder_regex()
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
            let name = caps[1].to_string();
            let constraints = match caps.get(2) {
                Some(args) => parse_constraints(&name, args.as_str())?,
                None => Vec::new(),
            };
            Ok(Placeholder {
                optional: caps.get(3).is_some(),
                name,
                constraints,
                span: whole,
            })
        })
        .collect()
}

/// Names of every placeholder in `text`, ignoring their arguments.
pub fn names(text: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace every placeholder in `text` with `lookup(name)`, or nothing when
/// the lookup fails.
pub fn substitute<'a, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    placeholder_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_optional_and_constrained() {
        let found = scan("f(#a#, #b?#, #c{text=[0-9]+, type=kotlin.Int}#)").unwrap();
        assert_eq!(found.len(), 3);

        assert_eq!(found[0].name, "a");
        assert!(!found[0].optional);
        assert_eq!(found[0].span, 2..5);

        assert!(found[1].optional);

        assert_eq!(
            found[2].constraints,
            vec![
                Constraint::Text("[0-9]+".into()),
                Constraint::Type("kotlin.Int".into())
            ]
        );
    }

    #[test]
    fn constrained_optional() {
        let found = scan("#x{text=a}?#").unwrap();
        assert!(found[0].optional);
        assert_eq!(found[0].constraints, vec![Constraint::Text("a".into())]);
    }

    #[test]
    fn unknown_argument_key() {
        let err = scan("#x{kind=call}#").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownArgument {
                name: "x".into(),
                key: "kind".into()
            }
        );
    }

    #[test]
    fn malformed_argument() {
        assert!(matches!(
            scan("#x{text}#"),
            Err(TemplateError::MalformedArgument { .. })
        ));
    }

    #[test]
    fn lone_hashes_are_not_placeholders() {
        assert!(scan("a # b").unwrap().is_empty());
        assert!(scan("#1#").unwrap().is_empty());
    }

    #[test]
    fn substitute_unbound_renders_empty() {
        let out = substitute("apply(#x#, #y?#)", |name| (name == "x").then_some("42"));
        assert_eq!(out, "apply(42, )");
    }

    #[test]
    fn names_ignore_arguments() {
        assert_eq!(names("#a{text=x}# + #b?#"), vec!["a", "b"]);
    }
}
