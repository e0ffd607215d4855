//! Session-scoped interning of terms, predicates and literals.
//!
//! The [`Arena`] plays the role of a unique table: every structurally distinct object is
//! stored exactly once in a flat vector, and handles ([`TermId`], [`PredId`], [`LitId`])
//! are plain indices into it. Structural equality therefore reduces to handle equality.
//!
//! Interning a literal interns its whole symmetry orbit at the same time: the negation,
//! the flip (reversed arguments) and the mirror (the two canonical variables `x` and `y`
//! exchanged). Partner links are stored as indices, so they are O(1) and never form
//! reference cycles. After construction of the vocabulary the arena is only read, which
//! lets the parallel phases share it as `&Arena`.
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::types::{LitId, PredId, TermId};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl Term {
    pub fn name(&self) -> &str {
        match self {
            Term::Variable(name) | Term::Constant(name) => name,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Predicate {
    pub name: String,
    pub arity: usize,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Literal {
    pub predicate: PredId,
    pub args: Vec<TermId>,
    pub negated: bool,
}

#[derive(Debug, Copy, Clone)]
struct Partners {
    negation: LitId,
    mirror: LitId,
    flip: LitId,
}

#[derive(Debug)]
pub struct Arena {
    terms: Vec<Term>,
    term_index: HashMap<Term, TermId>,
    predicates: Vec<Predicate>,
    predicate_index: HashMap<Predicate, PredId>,
    literals: Vec<Literal>,
    literal_index: HashMap<Literal, LitId>,
    partners: Vec<Partners>,
    rendered: Vec<String>,
    x: TermId,
    y: TermId,
    fresh: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Arena::new()
    }
}

impl Arena {
    /// Creates an empty arena with the two canonical variables `x` and `y`.
    pub fn new() -> Self {
        let mut arena = Self {
            terms: Vec::new(),
            term_index: HashMap::new(),
            predicates: Vec::new(),
            predicate_index: HashMap::new(),
            literals: Vec::new(),
            literal_index: HashMap::new(),
            partners: Vec::new(),
            rendered: Vec::new(),
            x: TermId::new(0),
            y: TermId::new(0),
            fresh: 0,
        };
        arena.x = arena.variable("x");
        arena.y = arena.variable("y");
        arena
    }

    /// The first canonical variable.
    pub fn x(&self) -> TermId {
        self.x
    }
    /// The second canonical variable.
    pub fn y(&self) -> TermId {
        self.y
    }

    fn intern_term(&mut self, term: Term) -> TermId {
        if let Some(&id) = self.term_index.get(&term) {
            return id;
        }
        let id = TermId::new(self.terms.len());
        self.terms.push(term.clone());
        self.term_index.insert(term, id);
        id
    }

    pub fn variable(&mut self, name: &str) -> TermId {
        self.intern_term(Term::Variable(name.to_string()))
    }

    pub fn constant(&mut self, name: &str) -> TermId {
        self.intern_term(Term::Constant(name.to_string()))
    }

    /// Creates a variable that has not been used before (`_0`, `_1`, ...).
    pub fn fresh_variable(&mut self) -> TermId {
        loop {
            let name = format!("_{}", self.fresh);
            self.fresh += 1;
            let term = Term::Variable(name);
            if !self.term_index.contains_key(&term) {
                return self.intern_term(term);
            }
        }
    }

    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    pub fn is_variable(&self, id: TermId) -> bool {
        self.term(id).is_variable()
    }

    pub fn predicate(&mut self, name: &str, arity: usize) -> PredId {
        let key = Predicate {
            name: name.to_string(),
            arity,
        };
        if let Some(&id) = self.predicate_index.get(&key) {
            return id;
        }
        let id = PredId::new(self.predicates.len());
        self.predicates.push(key.clone());
        self.predicate_index.insert(key, id);
        id
    }

    pub fn find_predicate(&self, name: &str, arity: usize) -> Option<PredId> {
        self.predicate_index
            .get(&Predicate {
                name: name.to_string(),
                arity,
            })
            .copied()
    }

    pub fn pred(&self, id: PredId) -> &Predicate {
        &self.predicates[id.index()]
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    /// Interns a literal together with its symmetry orbit.
    ///
    /// # Panics
    ///
    /// Panics if the number of arguments does not match the predicate arity.
    pub fn literal(&mut self, predicate: PredId, args: Vec<TermId>, negated: bool) -> LitId {
        assert_eq!(
            self.pred(predicate).arity,
            args.len(),
            "Arity mismatch for predicate {}",
            self.pred(predicate).name
        );
        let key = Literal {
            predicate,
            args,
            negated,
        };
        if let Some(&id) = self.literal_index.get(&key) {
            return id;
        }

        // Negation, mirror and flip are commuting involutions, so the orbit has at most
        // eight members, and either all of them are interned or none is.
        let mut orbit = vec![key];
        let mut i = 0;
        while i < orbit.len() {
            let lit = orbit[i].clone();
            for next in [self.negated(&lit), self.mirrored(&lit), flipped(&lit)] {
                if !orbit.contains(&next) {
                    orbit.push(next);
                }
            }
            i += 1;
        }

        let first = self.literals.len();
        for lit in &orbit {
            let id = LitId::new(self.literals.len());
            let text = self.render(lit);
            self.literals.push(lit.clone());
            self.rendered.push(text);
            self.literal_index.insert(lit.clone(), id);
        }
        for index in first..self.literals.len() {
            let lit = self.literals[index].clone();
            let partners = Partners {
                negation: self.literal_index[&self.negated(&lit)],
                mirror: self.literal_index[&self.mirrored(&lit)],
                flip: self.literal_index[&flipped(&lit)],
            };
            self.partners.push(partners);
        }

        LitId::new(first)
    }

    /// Looks up an already interned literal without creating it.
    pub fn find_literal(&self, predicate: PredId, args: &[TermId], negated: bool) -> Option<LitId> {
        self.literal_index
            .get(&Literal {
                predicate,
                args: args.to_vec(),
                negated,
            })
            .copied()
    }

    pub fn lit(&self, id: LitId) -> &Literal {
        &self.literals[id.index()]
    }

    pub fn negation(&self, id: LitId) -> LitId {
        self.partners[id.index()].negation
    }
    pub fn mirror(&self, id: LitId) -> LitId {
        self.partners[id.index()].mirror
    }
    pub fn flip(&self, id: LitId) -> LitId {
        self.partners[id.index()].flip
    }

    /// Rendering of a literal, e.g. `~B0(x, y)`.
    pub fn display(&self, id: LitId) -> &str {
        &self.rendered[id.index()]
    }

    /// Distinct variables of a literal, in order of first occurrence.
    pub fn variables(&self, id: LitId) -> Vec<TermId> {
        let mut vars = Vec::with_capacity(2);
        for &t in &self.lit(id).args {
            if self.is_variable(t) && !vars.contains(&t) {
                vars.push(t);
            }
        }
        vars
    }

    /// Distinct terms of a literal, in order of first occurrence.
    pub fn terms(&self, id: LitId) -> Vec<TermId> {
        let mut terms = Vec::with_capacity(2);
        for &t in &self.lit(id).args {
            if !terms.contains(&t) {
                terms.push(t);
            }
        }
        terms
    }

    /// Applies a term substitution, returning the literal if it is interned.
    pub fn substitute(&self, id: LitId, map: impl Fn(TermId) -> TermId) -> Option<LitId> {
        let lit = self.lit(id);
        let args: Vec<TermId> = lit.args.iter().map(|&t| map(t)).collect();
        self.find_literal(lit.predicate, &args, lit.negated)
    }

    /// Renders the literal for the Prover9 input syntax (`-` for negation).
    pub fn prover9(&self, id: LitId) -> String {
        let text = self.display(id);
        match text.strip_prefix('~') {
            Some(rest) => format!("-{}", rest),
            None => text.to_string(),
        }
    }

    fn negated(&self, lit: &Literal) -> Literal {
        Literal {
            negated: !lit.negated,
            ..lit.clone()
        }
    }

    fn mirrored(&self, lit: &Literal) -> Literal {
        let args = lit
            .args
            .iter()
            .map(|&t| {
                if t == self.x {
                    self.y
                } else if t == self.y {
                    self.x
                } else {
                    t
                }
            })
            .collect();
        Literal {
            args,
            ..lit.clone()
        }
    }

    fn render(&self, lit: &Literal) -> String {
        let mut s = String::new();
        if lit.negated {
            s.push('~');
        }
        s.push_str(&self.pred(lit.predicate).name);
        if !lit.args.is_empty() {
            s.push('(');
            for (i, &t) in lit.args.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                let _ = write!(s, "{}", self.term(t).name());
            }
            s.push(')');
        }
        s
    }
}

fn flipped(lit: &Literal) -> Literal {
    let mut args = lit.args.clone();
    args.reverse();
    Literal {
        args,
        ..lit.clone()
    }
}
