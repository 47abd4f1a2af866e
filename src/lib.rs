//! # scangen
//!
//! A scanner generator built on Brzozowski derivatives.
//!
//! scangen reads a declarative token spec (INI sections of
//! `name = regex` entries) and compiles it into a minimal table-driven
//! DFA that tokenises input with maximal munch. The automaton can be
//! emitted as Rust source, rendered with Graphviz, dumped as JSON, or
//! executed directly.
//!
//! ## Key features
//!
//! - **Derivative construction**: states are residual expressions, no
//!   NFA or subset construction in between
//! - **Boolean-closed patterns**: token definitions may use
//!   intersection (`&`) and complement (`!`)
//! - **Unicode-first**: character classes are interval sets over the
//!   full codespace; `\p{...}` resolves through a pluggable provider
//! - **Priority-correct**: ties between tokens go to the one declared
//!   first
//!
//! ## Quick start
//!
//! ```rust
//! use scangen::regex::{ExprPool, UnicodeTables};
//! use scangen::spec::parse_spec;
//!
//! let spec = "[lexer]\nkw = if\nid = [a-z]+\nws = \\h+\n";
//! let sections = parse_spec(spec, &UnicodeTables).unwrap();
//!
//! let mut pool = ExprPool::new();
//! let resolved = sections[0].resolve(&mut pool).unwrap();
//! let dfa = scangen::dfa::build(&mut pool, &resolved).unwrap();
//!
//! let tokens: Vec<_> = dfa.scan("if ifx".chars()).collect::<Result<_, _>>().unwrap();
//! assert_eq!(dfa.token_name(tokens[0].0), Some("kw"));
//! assert_eq!(dfa.token_name(tokens[2].0), Some("id"));
//! ```

pub mod codeset;
pub mod dfa;
pub mod emit;
pub mod error;
pub mod regex;
pub mod spec;

// Re-exports for convenience
pub use codeset::CodePointSet;
pub use dfa::{Dfa, Scanner, StateId};
pub use error::{Result, ScanError};
pub use regex::{ExprId, ExprPool, TokenId};
pub use spec::{ResolvedTokens, TokenSpec};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::UnicodeTables;

    fn build(spec_text: &str) -> Dfa {
        let sections = spec::parse_spec(spec_text, &UnicodeTables).unwrap();
        let mut pool = ExprPool::new();
        let resolved = sections[0].resolve(&mut pool).unwrap();
        dfa::build(&mut pool, &resolved).unwrap()
    }

    fn scan(dfa: &Dfa, input: &str) -> Vec<(String, String)> {
        dfa.scan(input.chars())
            .map(|item| {
                let (token, lexeme) = item.unwrap();
                (dfa.tokens()[token].clone(), lexeme)
            })
            .collect()
    }

    #[test]
    fn test_small_language_pipeline() {
        let dfa = build(
            "[toy]\n\
             _letter = [_A-Za-z]\n\
             _digit = [0-9]\n\
             kw = if|else|while|return\n\
             id = {_letter}({_letter}|{_digit})*\n\
             num = {_digit}+(\\.{_digit}+)?\n\
             op = [-+*/=<>]|==|<=|>=\n\
             punct = [(){};,]\n\
             ws = (\\h|\\v)+\n",
        );
        let tokens = scan(&dfa, "if (x1 <= 42) { return y; }");
        let kinds: Vec<&str> = tokens.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "kw", "ws", "punct", "id", "ws", "op", "ws", "num", "punct", "ws", "punct",
                "ws", "kw", "ws", "id", "punct", "ws", "punct"
            ]
        );
        let lexemes: Vec<&str> = tokens.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(lexemes.concat(), "if (x1 <= 42) { return y; }");
    }

    #[test]
    fn test_keywords_shadow_identifiers_only_on_exact_match() {
        let dfa = build("[s]\nkw = while\nid = [a-z]+\n");
        assert_eq!(scan(&dfa, "while"), vec![("kw".to_string(), "while".to_string())]);
        assert_eq!(scan(&dfa, "whiled"), vec![("id".to_string(), "whiled".to_string())]);
    }

    #[test]
    fn test_boolean_algebra_in_token_definitions() {
        // identifiers that are not keywords, without a separate kw token
        let dfa = build("[s]\nid = [a-z]+&!(if|else)\nkw = if|else\nws = \\h+\n");
        let tokens = scan(&dfa, "if iffy else x");
        let kinds: Vec<&str> = tokens.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(kinds, vec!["kw", "ws", "id", "ws", "kw", "ws", "id"]);
    }

    #[test]
    fn test_pool_drops_before_scanning() {
        // the automaton is self-contained once built
        let dfa = {
            let sections =
                spec::parse_spec("[s]\nword = \\w+\nsp = \\h+\n", &UnicodeTables).unwrap();
            let mut pool = ExprPool::new();
            let resolved = sections[0].resolve(&mut pool).unwrap();
            dfa::build(&mut pool, &resolved).unwrap()
        };
        let tokens = scan(&dfa, "one two");
        assert_eq!(tokens.len(), 3);
    }
}
