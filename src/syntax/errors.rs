use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("failed to set {language} language for parser")]
    LanguageSet { language: String },

    #[error("failed to parse {language} source code")]
    ParseFailed { language: String },

    #[error("unknown language '{name}' (expected java or kotlin)")]
    UnknownLanguage { name: String },

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes")]
    MultipleSyntaxErrors { count: usize },
}
