pub mod loader;
pub mod rules;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use rules::{compile_each, CompiledRule, RuleError, RuleMatch, RuleOutcome, RuleSet};
pub use schema::{Metadata, RuleConfig, RuleDefinition, ValidationError, ValidationIssue};
