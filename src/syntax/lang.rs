//! Java and Kotlin language support via ast-grep-language.
//!
//! We use the grammars bundled with `ast-grep-language` instead of depending
//! on the individual tree-sitter grammar crates, so the grammar versions always
//! agree with the tree-sitter runtime.

use crate::syntax::errors::SyntaxError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The two source languages the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Java,
    Kotlin,
}

impl Language {
    /// Every supported language, in a stable order.
    pub const ALL: [Language; 2] = [Language::Java, Language::Kotlin];

    /// Detect the language from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "java" => Some(Language::Java),
            "kt" | "kts" => Some(Language::Kotlin),
            _ => None,
        }
    }

    /// Detect the language from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// File extensions handled by this language.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
        }
    }

    /// The ast-grep language handle.
    pub fn support_lang(self) -> SupportLang {
        match self {
            Language::Java => SupportLang::Java,
            Language::Kotlin => SupportLang::Kotlin,
        }
    }

    /// The raw tree-sitter grammar.
    pub fn ts_language(self) -> tree_sitter::Language {
        self.support_lang().get_ts_language()
    }

    /// Identifier substituted for a `#name#` placeholder before parsing a
    /// template snippet.
    ///
    /// Kotlin gets a backtick-quoted identifier, Java a `$`-prefixed one; both
    /// parse as plain identifiers in their grammar.
    pub fn stand_in(self, name: &str) -> String {
        match self {
            Language::Java => format!("$__{name}"),
            Language::Kotlin => format!("`__{name}`"),
        }
    }

    /// Source wrappers tried in order when parsing a template snippet.
    ///
    /// Each entry is `(prefix, suffix)`; the snippet is placed between them.
    pub(crate) fn snippet_wrappers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::Java => &[
                ("class __Template {\n  void __template() {\n    ", ";\n  }\n}\n"),
                ("class __Template {\n  ", "\n}\n"),
                ("", "\nclass __Template {}\n"),
            ],
            Language::Kotlin => &[
                ("fun __template() {\n    ", "\n}\n"),
                ("", "\n"),
                ("", "\nfun __template() {}\n"),
            ],
        }
    }

    /// Name of the implicit root supertype.
    pub fn root_type(self) -> &'static str {
        match self {
            Language::Java => "java.lang.Object",
            Language::Kotlin => "kotlin.Any",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Java => write!(f, "java"),
            Language::Kotlin => write!(f, "kotlin"),
        }
    }
}

impl FromStr for Language {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            _ => Err(SyntaxError::UnknownLanguage {
                name: s.to_string(),
            }),
        }
    }
}
