//! Hash-consed regular expression algebra.
//!
//! Every expression lives in an [`ExprPool`] and is referred to by a
//! small-integer [`ExprId`]. The pool's smart constructors apply a fixed
//! set of canonicalisation laws bottom-up, so structurally equivalent
//! expressions always intern to the same id: equality is identity, and
//! the stable order on ids doubles as the canonical child order inside
//! n-ary nodes. That identity property is what makes the DFA worklist
//! finite, since distinct residuals with the same normal form collapse
//! to one state key.
//!
//! The algebra includes intersection and complement, so it denotes the
//! boolean closure of the regular languages. Derivatives follow
//! Brzozowski: `deriv(e, c)` accepts exactly the strings `w` with `cw`
//! accepted by `e`. `classes(e)` partitions the codespace into sets of
//! code points that all produce the same derivative, which is what keeps
//! state exploration bounded on a 0x110000-symbol alphabet.

use std::collections::HashMap;
use std::rc::Rc;

use crate::codeset::CodePointSet;
use crate::error::{Result, ScanError};

/// Index of a token within its spec; doubles as the priority rank
/// (smaller = declared earlier = wins ties).
pub type TokenId = usize;

/// Interned expression handle. Equality and ordering are identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u32);

impl ExprId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the expression DAG. Children are already-interned ids,
/// so structural equality of nodes is shallow.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprNode {
    /// The empty language.
    Empty,
    /// The empty string.
    Epsilon,
    /// One-symbol strings over a non-empty set.
    Chars(CodePointSet),
    Concat(ExprId, ExprId),
    /// Union; children sorted by id, deduplicated, at least two.
    Alt(Box<[ExprId]>),
    /// Intersection; same shape invariants as `Alt`.
    And(Box<[ExprId]>),
    Not(ExprId),
    Star(ExprId),
    /// Accept label riding on a token's expression.
    Tag(TokenId, ExprId),
}

/// Arena and interning table for [`ExprNode`]s.
///
/// The pool is the only mutable state of a compilation. It owns every
/// expression built for one token spec and can be dropped as soon as the
/// DFA has been extracted.
pub struct ExprPool {
    nodes: Vec<ExprNode>,
    nullable: Vec<bool>,
    table: HashMap<ExprNode, ExprId>,
    classes_memo: HashMap<ExprId, Rc<Vec<CodePointSet>>>,
    deriv_memo: HashMap<(ExprId, u32), ExprId>,
    empty: ExprId,
    epsilon: ExprId,
    top: ExprId,
}

impl Default for ExprPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprPool {
    pub fn new() -> Self {
        let mut pool = ExprPool {
            nodes: Vec::new(),
            nullable: Vec::new(),
            table: HashMap::new(),
            classes_memo: HashMap::new(),
            deriv_memo: HashMap::new(),
            empty: ExprId(0),
            epsilon: ExprId(0),
            top: ExprId(0),
        };
        pool.empty = pool.insert(ExprNode::Empty);
        pool.epsilon = pool.insert(ExprNode::Epsilon);
        let empty = pool.empty;
        pool.top = pool.insert(ExprNode::Not(empty));
        pool
    }

    /// ∅
    pub fn empty(&self) -> ExprId {
        self.empty
    }

    /// ε
    pub fn epsilon(&self) -> ExprId {
        self.epsilon
    }

    /// Σ*, kept as `Not(Empty)`.
    pub fn top(&self) -> ExprId {
        self.top
    }

    pub fn node(&self, e: ExprId) -> &ExprNode {
        &self.nodes[e.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True iff ε is in the language of `e`. Memoised at intern time.
    pub fn nullable(&self, e: ExprId) -> bool {
        self.nullable[e.index()]
    }

    fn node_nullable(&self, node: &ExprNode) -> bool {
        match node {
            ExprNode::Empty | ExprNode::Chars(_) => false,
            ExprNode::Epsilon | ExprNode::Star(_) => true,
            ExprNode::Concat(a, b) => self.nullable(*a) && self.nullable(*b),
            ExprNode::Alt(xs) => xs.iter().any(|&x| self.nullable(x)),
            ExprNode::And(xs) => xs.iter().all(|&x| self.nullable(x)),
            ExprNode::Not(a) => !self.nullable(*a),
            ExprNode::Tag(_, a) => self.nullable(*a),
        }
    }

    fn insert(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        let nullable = self.node_nullable(&node);
        self.table.insert(node.clone(), id);
        self.nodes.push(node);
        self.nullable.push(nullable);
        id
    }

    fn intern(&mut self, node: ExprNode) -> Result<ExprId> {
        if let Some(&id) = self.table.get(&node) {
            return Ok(id);
        }
        if self.nodes.len() >= u32::MAX as usize {
            return Err(ScanError::Overflow);
        }
        Ok(self.insert(node))
    }

    /// One-symbol class. `Chars(∅)` collapses to `Empty`.
    pub fn chars(&mut self, set: CodePointSet) -> Result<ExprId> {
        if set.is_empty() {
            Ok(self.empty)
        } else {
            self.intern(ExprNode::Chars(set))
        }
    }

    /// Concatenation. `Empty` annihilates, `Epsilon` is the identity and
    /// chains are kept right-associated.
    pub fn concat(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        if let ExprNode::Concat(x, y) = *self.node(a) {
            let tail = self.concat(y, b)?;
            return self.concat(x, tail);
        }
        if a == self.empty || b == self.empty {
            return Ok(self.empty);
        }
        if a == self.epsilon {
            return Ok(b);
        }
        if b == self.epsilon {
            return Ok(a);
        }
        self.intern(ExprNode::Concat(a, b))
    }

    /// Union. Nested alternations flatten, `Empty` members vanish, all
    /// character classes fold into a single set union, and the remaining
    /// children are sorted and deduplicated.
    pub fn alt<I>(&mut self, xs: I) -> Result<ExprId>
    where
        I: IntoIterator<Item = ExprId>,
    {
        let mut stack: Vec<ExprId> = xs.into_iter().collect();
        stack.reverse();
        let mut chars: Option<CodePointSet> = None;
        let mut terms: Vec<ExprId> = Vec::new();
        while let Some(e) = stack.pop() {
            match self.node(e) {
                ExprNode::Alt(children) => stack.extend(children.iter().rev().copied()),
                ExprNode::Empty => {}
                ExprNode::Chars(s) => {
                    chars = Some(match chars {
                        Some(acc) => acc.union(s),
                        None => s.clone(),
                    });
                }
                _ => terms.push(e),
            }
        }
        if let Some(set) = chars {
            terms.push(self.chars(set)?);
        }
        terms.sort_unstable();
        terms.dedup();
        match terms.len() {
            0 => Ok(self.empty),
            1 => Ok(terms[0]),
            _ => self.intern(ExprNode::Alt(terms.into_boxed_slice())),
        }
    }

    /// Intersection. Flattens, folds character classes by set
    /// intersection, drops Σ* members, and annihilates on `Empty`. An
    /// empty intersection is Σ*.
    pub fn and<I>(&mut self, xs: I) -> Result<ExprId>
    where
        I: IntoIterator<Item = ExprId>,
    {
        let mut stack: Vec<ExprId> = xs.into_iter().collect();
        stack.reverse();
        let mut chars: Option<CodePointSet> = None;
        let mut terms: Vec<ExprId> = Vec::new();
        while let Some(e) = stack.pop() {
            if e == self.top {
                continue;
            }
            match self.node(e) {
                ExprNode::And(children) => stack.extend(children.iter().rev().copied()),
                ExprNode::Empty => return Ok(self.empty),
                ExprNode::Chars(s) => {
                    chars = Some(match chars {
                        Some(acc) => acc.intersect(s),
                        None => s.clone(),
                    });
                }
                _ => terms.push(e),
            }
        }
        if let Some(set) = chars {
            if set.is_empty() {
                return Ok(self.empty);
            }
            terms.push(self.chars(set)?);
        }
        terms.sort_unstable();
        terms.dedup();
        match terms.len() {
            0 => Ok(self.top),
            1 => Ok(terms[0]),
            _ => self.intern(ExprNode::And(terms.into_boxed_slice())),
        }
    }

    /// Complement over Σ*. Double complements cancel; `Not(Empty)` is
    /// kept as the explicit Σ* node.
    pub fn not(&mut self, a: ExprId) -> Result<ExprId> {
        if let ExprNode::Not(inner) = *self.node(a) {
            return Ok(inner);
        }
        self.intern(ExprNode::Not(a))
    }

    /// Kleene closure. `∅* = ε* = ε` and stars are idempotent.
    pub fn star(&mut self, a: ExprId) -> Result<ExprId> {
        if a == self.empty || a == self.epsilon {
            return Ok(self.epsilon);
        }
        if matches!(self.node(a), ExprNode::Star(_)) {
            return Ok(a);
        }
        self.intern(ExprNode::Star(a))
    }

    /// Accept label. Never simplified so the DFA builder can see it.
    pub fn tag(&mut self, token: TokenId, a: ExprId) -> Result<ExprId> {
        self.intern(ExprNode::Tag(token, a))
    }

    /// Brzozowski derivative of `e` with respect to code point `c`.
    pub fn deriv(&mut self, e: ExprId, c: u32) -> Result<ExprId> {
        if let Some(&d) = self.deriv_memo.get(&(e, c)) {
            return Ok(d);
        }
        let node = self.node(e).clone();
        let d = match node {
            ExprNode::Empty | ExprNode::Epsilon => self.empty,
            ExprNode::Chars(s) => {
                if s.contains(c) {
                    self.epsilon
                } else {
                    self.empty
                }
            }
            ExprNode::Concat(a, b) => {
                let da = self.deriv(a, c)?;
                let head = self.concat(da, b)?;
                if self.nullable(a) {
                    let db = self.deriv(b, c)?;
                    self.alt([head, db])?
                } else {
                    head
                }
            }
            ExprNode::Alt(xs) => {
                let mut ds = Vec::with_capacity(xs.len());
                for &x in xs.iter() {
                    ds.push(self.deriv(x, c)?);
                }
                self.alt(ds)?
            }
            ExprNode::And(xs) => {
                let mut ds = Vec::with_capacity(xs.len());
                for &x in xs.iter() {
                    ds.push(self.deriv(x, c)?);
                }
                self.and(ds)?
            }
            ExprNode::Not(a) => {
                let da = self.deriv(a, c)?;
                self.not(da)?
            }
            ExprNode::Star(a) => {
                let da = self.deriv(a, c)?;
                self.concat(da, e)?
            }
            ExprNode::Tag(t, a) => {
                let da = self.deriv(a, c)?;
                self.tag(t, da)?
            }
        };
        self.deriv_memo.insert((e, c), d);
        Ok(d)
    }

    /// Partition of the codespace into derivative classes of `e`: all
    /// code points in one class yield the same derivative. Returned
    /// sorted so DFA construction is deterministic; memoised per node.
    pub fn classes(&mut self, e: ExprId) -> Rc<Vec<CodePointSet>> {
        if let Some(p) = self.classes_memo.get(&e) {
            return Rc::clone(p);
        }
        let node = self.node(e).clone();
        let mut result = match node {
            ExprNode::Empty | ExprNode::Epsilon => vec![CodePointSet::full()],
            ExprNode::Chars(s) => {
                let rest = s.complement();
                let mut parts = vec![s];
                if !rest.is_empty() {
                    parts.push(rest);
                }
                parts
            }
            ExprNode::Concat(a, b) => {
                if self.nullable(a) {
                    let ca = self.classes(a);
                    let cb = self.classes(b);
                    refine(&ca, &cb)
                } else {
                    self.classes(a).as_ref().clone()
                }
            }
            ExprNode::Alt(xs) | ExprNode::And(xs) => {
                let mut acc = vec![CodePointSet::full()];
                for &x in xs.iter() {
                    let cx = self.classes(x);
                    acc = refine(&acc, &cx);
                }
                acc
            }
            ExprNode::Not(a) | ExprNode::Star(a) | ExprNode::Tag(_, a) => {
                self.classes(a).as_ref().clone()
            }
        };
        result.sort_unstable();
        let rc = Rc::new(result);
        self.classes_memo.insert(e, Rc::clone(&rc));
        rc
    }

    /// Accepting token of a state expression: the smallest-id `Tag`
    /// whose body is nullable, looking through the boolean structure.
    /// Smaller ids are earlier declarations, so `min` is the priority
    /// tie-break.
    pub fn accept(&self, e: ExprId) -> Option<TokenId> {
        match self.node(e) {
            ExprNode::Tag(t, a) => {
                if self.nullable(*a) {
                    Some(*t)
                } else {
                    None
                }
            }
            ExprNode::Alt(xs) => xs.iter().filter_map(|&x| self.accept(x)).min(),
            ExprNode::And(xs) => {
                if xs.iter().all(|&x| self.nullable(x)) {
                    xs.iter().filter_map(|&x| self.accept(x)).min()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Match a whole string by iterated derivatives. This is the
    /// denotational reference the DFA is tested against.
    pub fn matches(&mut self, e: ExprId, input: &str) -> Result<bool> {
        let mut cur = e;
        for c in input.chars() {
            cur = self.deriv(cur, c as u32)?;
        }
        Ok(self.nullable(cur))
    }
}

/// Non-empty pairwise intersections of two partitions.
fn refine(p1: &[CodePointSet], p2: &[CodePointSet]) -> Vec<CodePointSet> {
    let mut out = Vec::new();
    for a in p1 {
        for b in p2 {
            let i = a.intersect(b);
            if !i.is_empty() {
                out.push(i);
            }
        }
    }
    out
}
