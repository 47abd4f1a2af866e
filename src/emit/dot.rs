//! Graphviz rendering of a DFA.
//!
//! One `digraph` per automaton. The sink and every edge into it are
//! left out of the drawing; with the transition rows partitioning the
//! codespace they would only add noise.

use std::io;

use crate::dfa::Dfa;
use crate::emit::Target;
use crate::error::Result;

pub struct DotTarget;

impl Target for DotTarget {
    fn emit_automaton(&mut self, out: &mut dyn io::Write, name: &str, dfa: &Dfa) -> Result<()> {
        writeln!(out, "digraph {} {{", quote(name))?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(out, "    start [shape=point];")?;
        writeln!(out, "    start -> 0;")?;
        for (id, state) in dfa.states().iter().enumerate() {
            if id == dfa.sink() {
                continue;
            }
            match state.accept.and_then(|t| dfa.token_name(t)) {
                Some(token) => writeln!(
                    out,
                    "    {} [shape=doublecircle, label={}];",
                    id,
                    quote(&format!("{}:{}", id, token))
                )?,
                None => writeln!(out, "    {} [shape=circle];", id)?,
            }
            for (set, target) in &state.transitions {
                if *target == dfa.sink() {
                    continue;
                }
                writeln!(
                    out,
                    "    {} -> {} [label={}];",
                    id,
                    target,
                    quote(&set.to_string())
                )?;
            }
        }
        writeln!(out, "}}")?;
        Ok(())
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
