use crate::matcher::MatcherError;
use crate::syntax::SyntaxError;
use thiserror::Error;

/// Construction-time errors raised while compiling a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder '#{name}#' has malformed argument '{argument}' (expected key=value)")]
    MalformedArgument { name: String, argument: String },

    #[error("placeholder '#{name}#' has unknown argument '{key}' (expected text or type)")]
    UnknownArgument { name: String, key: String },

    #[error("placeholder '#{name}#' has an invalid text pattern: {message}")]
    InvalidPattern { name: String, message: String },

    #[error("variable '{name}' appears more than once in the template")]
    DuplicateVariable { name: String },

    #[error("variable '{name}' was supplied but does not appear in the template")]
    UnknownVariable { name: String },

    #[error("variable '{name}' sits inside text the template compares literally")]
    UnreachableVariable { name: String },

    #[error("no resolver configured: variable '{name}' has a type constraint")]
    MissingResolver { name: String },

    #[error("variable '{name}' targets {expected} but is used at a {found} position")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("unsupported template shape: {kind} node `{text}`")]
    Unsupported { kind: String, text: String },

    #[error("template does not parse as {language}: `{snippet}`")]
    Unparseable { language: String, snippet: String },

    #[error("template has no {target} node spanning `{snippet}`")]
    NoTemplateNode { target: String, snippet: String },

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}
