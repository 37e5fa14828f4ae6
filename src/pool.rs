//! Thread-local parser pooling.
//!
//! One parser per language per thread, created on first use and reused for
//! every later parse on that thread.

use crate::syntax::{Language, ParsedSource, SourceParser, SyntaxError};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Language, SourceParser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with the pooled parser for `language`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use jk_rewrite::pool::with_parser;
/// use jk_rewrite::Language;
///
/// let parsed = with_parser(Language::Kotlin, |parser| parser.parse("fun main() {}"))??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(language: Language, f: F) -> Result<R, SyntaxError>
where
    F: FnOnce(&mut SourceParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(SourceParser::new(language)?),
        };
        Ok(f(parser))
    })
}

/// Parse `source` with the pooled parser.
pub fn parse(language: Language, source: impl Into<String>) -> Result<ParsedSource, SyntaxError> {
    with_parser(language, |parser| parser.parse(source))?
}
