//! Thread-local cache of compiled templates.
//!
//! Compiling a template parses the snippet and walks the tree, so rule sets
//! applied across many files compile each template once per thread instead of
//! once per file. The cache holds at most 256 entries and is cleared when
//! full. Compilation errors are not cached.

use crate::matcher::{Matcher, NodeType};
use crate::syntax::Language;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

type CacheKey = (Language, NodeType, String);

thread_local! {
    static TEMPLATE_CACHE: RefCell<HashMap<CacheKey, Matcher>> = RefCell::new(HashMap::new());
}

/// Return the cached matcher for `(language, target, snippet)`, or run
/// `compile` and cache its result.
pub fn get_or_compile<E, F>(
    language: Language,
    target: NodeType,
    snippet: &str,
    compile: F,
) -> Result<Matcher, E>
where
    F: FnOnce() -> Result<Matcher, E>,
{
    let key = (language, target, snippet.to_string());
    if let Some(hit) = TEMPLATE_CACHE.with(|cache| cache.borrow().get(&key).cloned()) {
        return Ok(hit);
    }

    // Compile outside the borrow: compilation may itself consult the cache.
    let compiled = compile()?;
    TEMPLATE_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(key, compiled.clone());
    });
    Ok(compiled)
}

/// Clear the cache (mainly for testing).
pub fn clear_cache() {
    TEMPLATE_CACHE.with(|cache| cache.borrow_mut().clear());
}

pub fn cache_size() -> usize {
    TEMPLATE_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeKind;

    #[test]
    fn errors_are_not_cached() {
        clear_cache();
        let result: Result<Matcher, &str> =
            get_or_compile(Language::Java, NodeType::Any, "broken", || Err("nope"));
        assert!(result.is_err());
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn keys_include_language_and_target() {
        clear_cache();
        let ok = || Ok::<_, ()>(Matcher::any());
        get_or_compile(Language::Java, NodeType::Any, "x", ok).unwrap();
        get_or_compile(Language::Kotlin, NodeType::Any, "x", ok).unwrap();
        get_or_compile(Language::Kotlin, NodeKind::Call.into(), "x", ok).unwrap();
        get_or_compile(Language::Kotlin, NodeKind::Call.into(), "x", || Err(())).unwrap();
        assert_eq!(cache_size(), 3);
    }

    #[test]
    fn evicts_when_full() {
        clear_cache();
        for i in 0..MAX_CACHE_ENTRIES {
            get_or_compile(Language::Java, NodeType::Any, &i.to_string(), || {
                Ok::<_, ()>(Matcher::any())
            })
            .unwrap();
        }
        assert_eq!(cache_size(), MAX_CACHE_ENTRIES);
        get_or_compile(Language::Java, NodeType::Any, "one more", || Ok::<_, ()>(Matcher::any()))
            .unwrap();
        assert_eq!(cache_size(), 1);
    }
}
