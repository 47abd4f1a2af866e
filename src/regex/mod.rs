//! Brzozowski-derivative regex engine.
//!
//! Patterns compile to a hash-consed algebraic form instead of an NFA.
//! The algebra is boolean-closed: besides the usual operators it supports
//! intersection (`&`) and complement (`!`), so token definitions can say
//! things like "any identifier except a keyword" directly.
//!
//! Pipeline: [`parser::parse`] turns pattern text into a surface [`Ast`]
//! (possibly containing `{name}` interpolation references), [`lower`]
//! interns it into an [`ExprPool`], and the pool provides nullability,
//! derivatives and alphabet partitions: everything the DFA builder in
//! [`crate::dfa`] needs.

pub mod ast;
pub mod expr;
pub mod parser;
pub mod unicode;

pub use ast::Ast;
pub use expr::{ExprId, ExprNode, ExprPool, TokenId};
pub use parser::parse;
pub use unicode::{PropertyProvider, UnicodeTables};

use crate::error::{Result, ScanError};

/// Intern a surface tree into the pool. Interpolation references are
/// looked up through `resolve`; an unresolved name is an error.
pub fn lower(
    pool: &mut ExprPool,
    ast: &Ast,
    resolve: &mut dyn FnMut(&str) -> Option<ExprId>,
) -> Result<ExprId> {
    match ast {
        Ast::Epsilon => Ok(pool.epsilon()),
        Ast::Chars(set) => pool.chars(set.clone()),
        Ast::Concat(a, b) => {
            let x = lower(pool, a, resolve)?;
            let y = lower(pool, b, resolve)?;
            pool.concat(x, y)
        }
        Ast::Alt(a, b) => {
            let x = lower(pool, a, resolve)?;
            let y = lower(pool, b, resolve)?;
            pool.alt([x, y])
        }
        Ast::And(a, b) => {
            let x = lower(pool, a, resolve)?;
            let y = lower(pool, b, resolve)?;
            pool.and([x, y])
        }
        Ast::Not(a) => {
            let x = lower(pool, a, resolve)?;
            pool.not(x)
        }
        Ast::Star(a) => {
            let x = lower(pool, a, resolve)?;
            pool.star(x)
        }
        Ast::Ref(name) => {
            resolve(name).ok_or_else(|| ScanError::UndefinedReference(name.clone()))
        }
    }
}

/// Parse and intern a standalone pattern (no interpolation context).
pub fn compile(
    pool: &mut ExprPool,
    pattern: &str,
    props: &dyn PropertyProvider,
) -> Result<ExprId> {
    let ast = parser::parse(pattern, props)?;
    lower(pool, &ast, &mut |_| None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, input: &str) -> bool {
        let mut pool = ExprPool::new();
        let e = compile(&mut pool, pattern, &UnicodeTables).unwrap();
        pool.matches(e, input).unwrap()
    }

    #[test]
    fn test_integration_simple() {
        assert!(matches("hello", "hello"));
        assert!(!matches("hello", "world"));
    }

    #[test]
    fn test_integration_star() {
        assert!(matches("a*b", "b"));
        assert!(matches("a*b", "ab"));
        assert!(matches("a*b", "aaab"));
        assert!(!matches("a*b", "a"));
    }

    #[test]
    fn test_integration_intersection() {
        // strings starting with 'a' AND ending with 'b'
        assert!(matches("a.*&.*b", "ab"));
        assert!(matches("a.*&.*b", "axxb"));
        assert!(!matches("a.*&.*b", "a"));
        assert!(!matches("a.*&.*b", "b"));
        assert!(!matches("a.*&.*b", "ba"));
    }

    #[test]
    fn test_integration_complement() {
        assert!(!matches("!(bad)", "bad"));
        assert!(matches("!(bad)", "good"));
        assert!(matches("!(bad)", "ba"));
        assert!(matches("!(bad)", ""));
        assert!(matches("!(bad)", "badly"));
    }

    #[test]
    fn test_integration_class() {
        assert!(matches("[A-Z][a-z]+", "Config"));
        assert!(matches("[A-Z][a-z]+", "Manager"));
        assert!(!matches("[A-Z][a-z]+", "config"));
        assert!(!matches("[A-Z][a-z]+", "CONFIG"));
    }

    #[test]
    fn test_integration_counted() {
        assert!(!matches("a{2,3}", "a"));
        assert!(matches("a{2,3}", "aa"));
        assert!(matches("a{2,3}", "aaa"));
        assert!(!matches("a{2,3}", "aaaa"));
    }

    #[test]
    fn test_integration_property() {
        assert!(matches(r"\p{Nd}+", "042"));
        assert!(matches(r"\p{Nd}+", "\u{0667}")); // ARABIC-INDIC DIGIT SEVEN
        assert!(!matches(r"\p{Nd}+", "x1"));
    }

    #[test]
    fn test_integration_keyword_vs_identifier() {
        // the boolean algebra can carve keywords out of identifiers
        assert!(!matches("[a-z]+&!(if|else)", "if"));
        assert!(!matches("[a-z]+&!(if|else)", "else"));
        assert!(matches("[a-z]+&!(if|else)", "iffy"));
        assert!(matches("[a-z]+&!(if|else)", "x"));
    }

    #[test]
    fn test_lower_reports_unresolved_reference() {
        let mut pool = ExprPool::new();
        let err = compile(&mut pool, "{missing}", &UnicodeTables).unwrap_err();
        assert!(matches!(err, ScanError::UndefinedReference(name) if name == "missing"));
    }
}
