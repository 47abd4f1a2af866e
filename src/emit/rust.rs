//! Rust source rendering of a DFA.
//!
//! Emits one self-contained `pub mod` per automaton: static interval
//! tables plus a table-driven `next_state`/`scan` pair with the same
//! maximal-munch behaviour as the reference scanner. The generated code
//! has no dependencies, not even on this crate.

use std::io;

use crate::dfa::Dfa;
use crate::emit::Target;
use crate::error::Result;

pub struct RustTarget;

impl Target for RustTarget {
    fn emit_header(&mut self, out: &mut dyn io::Write) -> Result<()> {
        writeln!(out, "// Generated by scangen; do not edit.")?;
        Ok(())
    }

    fn emit_automaton(&mut self, out: &mut dyn io::Write, name: &str, dfa: &Dfa) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "pub mod {} {{", identifier(name))?;
        writeln!(out, "    pub const SINK: usize = {};", dfa.sink())?;
        writeln!(out)?;

        write!(out, "    pub static TOKENS: &[&str] = &[")?;
        for (i, token) in dfa.tokens().iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            write!(out, "{:?}", token)?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        write!(out, "    pub static ACCEPT: &[Option<usize>] = &[")?;
        for (i, state) in dfa.states().iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            match state.accept {
                Some(t) => write!(out, "Some({})", t)?,
                None => write!(out, "None")?,
            }
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        writeln!(
            out,
            "    static TRANSITIONS: &[&[(u32, u32, usize)]] = &["
        )?;
        for state in dfa.states() {
            write!(out, "        &[")?;
            let mut first = true;
            for (set, target) in &state.transitions {
                for (lo, hi) in set.iter_ranges() {
                    if !first {
                        write!(out, ", ")?;
                    }
                    first = false;
                    write!(out, "({:#x}, {:#x}, {})", lo, hi, target)?;
                }
            }
            writeln!(out, "],")?;
        }
        writeln!(out, "    ];")?;
        writeln!(out)?;

        writeln!(
            out,
            "{}",
            r#"    pub fn next_state(state: usize, cp: u32) -> usize {
        for &(lo, hi, target) in TRANSITIONS[state] {
            if lo <= cp && cp < hi {
                return target;
            }
        }
        SINK
    }

    /// Scan the whole input with maximal munch. On success returns
    /// `(token, lexeme)` pairs; on failure the char offset and the
    /// offending character.
    pub fn scan(input: &str) -> std::result::Result<Vec<(usize, &str)>, (usize, char)> {
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut state = 0;
            let mut accept: Option<(usize, usize)> = None;
            let mut offset = start;
            while offset < chars.len() && state != SINK {
                state = next_state(state, chars[offset].1 as u32);
                offset += 1;
                if state != SINK {
                    if let Some(token) = ACCEPT[state] {
                        accept = Some((token, offset));
                    }
                }
            }
            match accept {
                Some((token, end)) => {
                    let lo = chars[start].0;
                    let hi = chars.get(end).map_or(input.len(), |&(i, _)| i);
                    out.push((token, &input[lo..hi]));
                    start = end;
                }
                None => return Err((start, chars[start].1)),
            }
        }
        Ok(out)
    }"#
        )?;
        writeln!(out, "}}")?;
        Ok(())
    }
}

/// Turn a section name into a Rust module identifier.
fn identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::{render, sample_dfa};

    #[test]
    fn test_rust_output_shape() {
        let dfa = sample_dfa();
        let text = render(&mut RustTarget, "lexer", &dfa);
        assert!(text.contains("pub mod lexer {"));
        assert!(text.contains(&format!("pub const SINK: usize = {};", dfa.sink())));
        assert!(text.contains(r#"pub static TOKENS: &[&str] = &["kw", "id"];"#));
        assert!(text.contains("pub fn next_state"));
        assert!(text.contains("pub fn scan"));
        // every state emits one table row
        assert_eq!(text.matches("\n        &[").count(), dfa.states().len());
    }

    #[test]
    fn test_identifier_sanitisation() {
        assert_eq!(identifier("lexer"), "lexer");
        assert_eq!(identifier("my-scanner"), "my_scanner");
        assert_eq!(identifier("1st"), "_1st");
        assert_eq!(identifier(""), "_");
    }
}
