use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("variable '{name}' is bound more than once in the same matcher")]
    DuplicateVariable { name: String },

    #[error("unknown node type '{name}'")]
    UnknownNodeType { name: String },
}
