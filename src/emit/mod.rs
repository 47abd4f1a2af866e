//! Back-ends that serialise a compiled [`Dfa`].
//!
//! Every back-end implements [`Target`]: a header, one call per
//! automaton, and a trailer, all writing to a caller-supplied sink.
//! The CLI drives a target over every section of a spec file.

mod dot;
mod rust;

pub use dot::DotTarget;
pub use rust::RustTarget;

use std::io;

use serde_json::json;

use crate::dfa::Dfa;
use crate::error::{Result, ScanError};

pub trait Target {
    fn emit_header(&mut self, _out: &mut dyn io::Write) -> Result<()> {
        Ok(())
    }

    fn emit_automaton(&mut self, out: &mut dyn io::Write, name: &str, dfa: &Dfa) -> Result<()>;

    fn emit_trailer(&mut self, _out: &mut dyn io::Write) -> Result<()> {
        Ok(())
    }
}

/// Dumps the public DFA shape as one JSON array of automata.
#[derive(Default)]
pub struct JsonTarget {
    docs: Vec<serde_json::Value>,
}

impl JsonTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Target for JsonTarget {
    fn emit_automaton(&mut self, _out: &mut dyn io::Write, name: &str, dfa: &Dfa) -> Result<()> {
        let doc = serde_json::to_value(dfa)
            .map_err(|e| ScanError::Config(format!("encode dfa: {}", e)))?;
        self.docs.push(json!({ "name": name, "automaton": doc }));
        Ok(())
    }

    fn emit_trailer(&mut self, out: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.docs)
            .map_err(|e| ScanError::Config(format!("encode dfa: {}", e)))?;
        writeln!(out)?;
        Ok(())
    }
}
