use crate::pool;
use crate::syntax::errors::SyntaxError;
use crate::syntax::lang::Language;
use crate::syntax::parser::ErrorNode;

fn report(errors: &[&ErrorNode]) -> Result<(), SyntaxError> {
    match errors {
        [] => Ok(()),
        [only] => Err(SyntaxError::SyntaxError {
            byte_start: only.byte_start,
            byte_end: only.byte_end,
        }),
        _ => Err(SyntaxError::MultipleSyntaxErrors {
            count: errors.len(),
        }),
    }
}

/// Validate that source code has no syntax errors.
pub fn validate_syntax(language: Language, source: &str) -> Result<(), SyntaxError> {
    let parsed = pool::parse(language, source)?;
    let errors = parsed.error_nodes();
    report(&errors.iter().collect::<Vec<_>>())
}

/// Validate that `after` has no ERROR nodes that `before` did not already have.
///
/// Errors are compared by byte span, which is imprecise once text shifts but
/// keeps already-broken input from blocking unrelated rewrites.
pub fn validate_change(language: Language, before: &str, after: &str) -> Result<(), SyntaxError> {
    let original = pool::parse(language, before)?.error_nodes();
    let updated = pool::parse(language, after)?.error_nodes();

    let introduced: Vec<&ErrorNode> = updated
        .iter()
        .filter(|e| {
            !original
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .collect();
    report(&introduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sources() {
        assert!(validate_syntax(Language::Java, "class A { void f() { g(); } }").is_ok());
        assert!(validate_syntax(Language::Kotlin, "fun f() { g() }").is_ok());
    }

    #[test]
    fn invalid_source() {
        assert!(validate_syntax(Language::Java, "class A { void f( { }").is_err());
    }

    #[test]
    fn single_error_reports_its_span() {
        let error = ErrorNode {
            byte_start: 3,
            byte_end: 7,
            start_point: tree_sitter::Point { row: 0, column: 3 },
            end_point: tree_sitter::Point { row: 0, column: 7 },
        };
        assert_eq!(
            report(&[&error]),
            Err(SyntaxError::SyntaxError {
                byte_start: 3,
                byte_end: 7
            })
        );
        assert_eq!(
            report(&[&error, &error]),
            Err(SyntaxError::MultipleSyntaxErrors { count: 2 })
        );
        assert_eq!(report(&[]), Ok(()));
    }

    #[test]
    fn change_introducing_error() {
        let before = "class A { void f() { g(1); } }";
        let after = "class A { void f() { g(1; } }";
        assert!(validate_change(Language::Java, before, after).is_err());
    }

    #[test]
    fn change_on_broken_source() {
        let before = "class A { void f( { g(1); }";
        assert!(validate_change(Language::Java, before, before).is_ok());
    }
}
