//! Parsing and the language-neutral node view.

pub mod errors;
mod java;
mod kotlin;
pub mod lang;
pub mod node;
pub mod parser;
pub mod validator;

pub use errors::SyntaxError;
pub use lang::Language;
pub use node::{Field, ListField, NodeKind, SyntaxNode};
pub use parser::{ErrorNode, ParsedSource, SourceParser};
pub use validator::{validate_change, validate_syntax};
