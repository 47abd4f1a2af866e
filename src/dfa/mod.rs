//! DFA construction by derivative exploration, plus the reference
//! scanner and binary persistence.
//!
//! The builder walks the space of residual expressions: each state is
//! keyed by an interned [`ExprId`], so two residuals that canonicalise
//! to the same normal form are the same state, which is what bounds the
//! worklist. Per state, the alphabet partition from
//! [`ExprPool::classes`] supplies one representative code point per
//! class; transitions are recorded against the whole class.
//!
//! After exploration every state that cannot reach an accepting state
//! collapses into a single sink, which keeps the emitted tables small
//! and gives the scanner a cheap stuck test.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::iter::Fuse;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codeset::CodePointSet;
use crate::error::{Result, ScanError};
use crate::regex::{ExprId, ExprPool, TokenId};
use crate::spec::ResolvedTokens;

pub type StateId = usize;

/// One DFA state: a transition row partitioning the codespace, and the
/// accepting token if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub transitions: Vec<(CodePointSet, StateId)>,
    pub accept: Option<TokenId>,
}

/// A self-contained deterministic automaton. State 0 is initial; the
/// sink is the unique dead state (never accepting, loops on Σ). The
/// expression pool it was built from can be dropped once this exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dfa {
    states: Vec<State>,
    sink: StateId,
    tokens: Vec<String>,
}

/// Explore the derivative space of a resolved token spec.
pub fn build(pool: &mut ExprPool, resolved: &ResolvedTokens) -> Result<Dfa> {
    let mut index: HashMap<ExprId, StateId> = HashMap::new();
    let mut exprs: Vec<ExprId> = Vec::new();
    let mut rows: Vec<Vec<(CodePointSet, StateId)>> = Vec::new();
    let mut work: Vec<ExprId> = Vec::new();

    index.insert(resolved.root, 0);
    exprs.push(resolved.root);
    rows.push(Vec::new());
    work.push(resolved.root);

    while let Some(e) = work.pop() {
        let state = index[&e];
        let classes = pool.classes(e);
        let mut row = Vec::with_capacity(classes.len());
        for class in classes.iter() {
            let Some(rep) = class.first() else { continue };
            let succ = pool.deriv(e, rep)?;
            let target = match index.get(&succ) {
                Some(&t) => t,
                None => {
                    let t = exprs.len();
                    index.insert(succ, t);
                    exprs.push(succ);
                    rows.push(Vec::new());
                    work.push(succ);
                    t
                }
            };
            row.push((class.clone(), target));
        }
        rows[state] = row;
    }

    let accepts: Vec<Option<TokenId>> = exprs.iter().map(|&e| pool.accept(e)).collect();
    let dfa = collapse_dead_states(rows, accepts, resolved.names.clone());
    info!(
        states = dfa.states.len(),
        tokens = dfa.tokens.len(),
        "dfa built"
    );
    Ok(dfa)
}

/// Replace every state from which no accepting state is reachable with
/// one sink, renumbering the live states densely in discovery order.
fn collapse_dead_states(
    rows: Vec<Vec<(CodePointSet, StateId)>>,
    accepts: Vec<Option<TokenId>>,
    tokens: Vec<String>,
) -> Dfa {
    let n = rows.len();

    let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for (s, row) in rows.iter().enumerate() {
        for &(_, t) in row {
            reverse[t].push(s);
        }
    }

    let mut live = vec![false; n];
    let mut queue: Vec<StateId> = Vec::new();
    for (s, accept) in accepts.iter().enumerate() {
        if accept.is_some() {
            live[s] = true;
            queue.push(s);
        }
    }
    while let Some(s) = queue.pop() {
        for &p in &reverse[s] {
            if !live[p] {
                live[p] = true;
                queue.push(p);
            }
        }
    }

    let mut remap = vec![0; n];
    let mut next = 0;
    for (s, &alive) in live.iter().enumerate() {
        if alive {
            remap[s] = next;
            next += 1;
        }
    }
    let sink = next;
    for (s, &alive) in live.iter().enumerate() {
        if !alive {
            remap[s] = sink;
        }
    }

    let dead = n - next;
    if dead > 0 {
        debug!(dead, "collapsed dead states");
    }

    let mut states: Vec<State> = Vec::with_capacity(next + 1);
    for (s, row) in rows.into_iter().enumerate() {
        if !live[s] {
            continue;
        }
        // merge classes that now share a target
        let mut merged: BTreeMap<StateId, CodePointSet> = BTreeMap::new();
        for (set, t) in row {
            let target = remap[t];
            match merged.get_mut(&target) {
                Some(acc) => *acc = acc.union(&set),
                None => {
                    merged.insert(target, set);
                }
            }
        }
        let mut transitions: Vec<(CodePointSet, StateId)> =
            merged.into_iter().map(|(t, set)| (set, t)).collect();
        transitions.sort();
        states.push(State {
            transitions,
            accept: accepts[s],
        });
    }
    states.push(State {
        transitions: vec![(CodePointSet::full(), sink)],
        accept: None,
    });

    Dfa {
        states,
        sink,
        tokens,
    }
}

impl Dfa {
    pub fn initial(&self) -> StateId {
        0
    }

    pub fn sink(&self) -> StateId {
        self.sink
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Token names, indexed by [`TokenId`].
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn token_name(&self, token: TokenId) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn accept(&self, state: StateId) -> Option<TokenId> {
        self.states[state].accept
    }

    /// Total transition function. The rows partition the codespace, so
    /// the sink fallback is unreachable in practice.
    pub fn step(&self, state: StateId, cp: u32) -> StateId {
        for (set, target) in &self.states[state].transitions {
            if set.contains(cp) {
                return *target;
            }
        }
        self.sink
    }

    /// Lazily scan a character stream into `(token, lexeme)` pairs with
    /// maximal munch. Finite input yields a finite stream; input no
    /// token matches yields an `UnmatchedInput` error and ends the
    /// stream.
    pub fn scan<I>(&self, input: I) -> Scanner<'_, I::IntoIter>
    where
        I: IntoIterator<Item = char>,
    {
        Scanner {
            dfa: self,
            input: input.into_iter().fuse(),
            buffer: Vec::new(),
            consumed: 0,
            done: false,
        }
    }

    /// Write the automaton to disk. Writes a temporary file first and
    /// renames it into place so interrupted writes cannot corrupt an
    /// existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "saving dfa");
        let bytes = bincode::serialize(self)
            .map_err(|e| ScanError::Config(format!("encode dfa: {}", e)))?;
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        debug!(bytes = bytes.len(), "dfa saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let dfa = bincode::deserialize(&bytes)
            .map_err(|e| ScanError::Config(format!("decode dfa: {}", e)))?;
        Ok(dfa)
    }
}

/// Maximal-munch scanner over a character iterator.
///
/// The scanner remembers the most recent accepting position; when the
/// automaton goes dead (or input ends) it rewinds there, emits the
/// token, and restarts on the remainder. Zero-length matches are never
/// emitted: a token whose expression is nullable cannot produce empty
/// lexemes, it only accepts from one character up.
pub struct Scanner<'d, I: Iterator<Item = char>> {
    dfa: &'d Dfa,
    input: Fuse<I>,
    buffer: Vec<char>,
    consumed: usize,
    done: bool,
}

impl<I: Iterator<Item = char>> Iterator for Scanner<'_, I> {
    type Item = Result<(TokenId, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut state = self.dfa.initial();
        let mut accept: Option<(TokenId, usize)> = None;
        let mut offset = 0;
        loop {
            if offset > 0 {
                if let Some(token) = self.dfa.accept(state) {
                    accept = Some((token, offset));
                }
            }

            let atom = if offset < self.buffer.len() {
                Some(self.buffer[offset])
            } else {
                let next = self.input.next();
                if let Some(c) = next {
                    self.buffer.push(c);
                }
                next
            };

            match atom {
                Some(c) => {
                    state = self.dfa.step(state, c as u32);
                    offset += 1;
                }
                None => state = self.dfa.sink(),
            }

            if state == self.dfa.sink() {
                return match accept {
                    Some((token, len)) => {
                        let lexeme: String = self.buffer[..len].iter().collect();
                        self.buffer.drain(..len);
                        self.consumed += len;
                        Some(Ok((token, lexeme)))
                    }
                    None if self.buffer.is_empty() => {
                        self.done = true;
                        None
                    }
                    None => {
                        self.done = true;
                        Some(Err(ScanError::UnmatchedInput {
                            position: self.consumed,
                            codepoint: self.buffer[0],
                        }))
                    }
                };
            }
        }
    }
}
