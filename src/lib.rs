//! jk-rewrite: structural search and rewrite for Java and Kotlin
//!
//! Matchers are composable predicates over a language-neutral view of the
//! syntax tree. They are built by hand or compiled from source snippets with
//! `#name#` placeholders, and drive a find-all-then-replace-all rewrite engine.
//!
//! # Architecture
//!
//! All rewrites compile down to a single primitive: [`Patch`], a verified
//! byte-span replacement. Intelligence lives in choosing the spans (matchers,
//! templates, the innermost-first pass loop), not in applying them.
//!
//! # Safety
//!
//! - Every patch verifies its expected before-text
//! - Overlapping patches are rejected, never merged
//! - Atomic file writes (tempfile + fsync + rename)
//! - Workspace boundary enforcement
//! - Optional rejection of rewrites that introduce syntax errors
//!
//! # Example
//!
//! ```no_run
//! use jk_rewrite::{pool, template, Language, NodeKind, RewriteRule, Rewriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let matcher = template(Language::Kotlin, NodeKind::Call, "invoke(#x?#)")?;
//! let rule = RewriteRule::new(matcher, "apply(#x#)")?;
//!
//! let tree = pool::parse(Language::Kotlin, "val a = invoke(invoke(1))")?;
//! let result = rule.apply(tree, &Rewriter::new())?;
//! assert_eq!(result.source(), "val a = apply(apply(1))");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod matcher;
pub mod patch;
pub mod pool;
pub mod resolver;
pub mod rewrite;
pub mod safety;
pub mod search;
pub mod syntax;
pub mod template;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RuleConfig, RuleError, RuleSet};
pub use matcher::{match_all_in_order, AdaptiveMatcher, Bindings, Index, MatchResult, Matcher, MatcherError, NodeType};
pub use patch::{apply_patches, FileOutcome, FileRewrite, Patch, PatchError, Verification};
pub use resolver::{DeclaredTypeResolver, ResolvedType, Resolver};
pub use rewrite::{replace_all, rewrite_with, Rewrite, RewriteError, RewriteRule, Rewriter};
pub use safety::{SafetyError, WorkspaceGuard};
pub use syntax::{Language, NodeKind, ParsedSource, SyntaxError, SyntaxNode};
pub use template::{template, Template, TemplateError};
