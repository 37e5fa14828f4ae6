use crate::patch::PatchError;
use crate::syntax::SyntaxError;
use thiserror::Error;

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(
        "patches intersect, cannot converge: pass {pass} found {matches} matches \
         after {previous} in the previous pass"
    )]
    Diverged {
        pass: usize,
        matches: usize,
        previous: usize,
    },

    #[error("rewrite pass {pass} introduced a syntax error: {error}")]
    InvalidResult { pass: usize, error: SyntaxError },

    #[error("replacement uses undefined variable '{name}'{}", did_you_mean(.suggestion))]
    UndefinedVariable {
        name: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}
