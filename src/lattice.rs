//! The universe of quantifier prefixes and the relations between them.
//!
//! A clause is refined by adding one literal at a time. When the new literal brings a
//! second variable in, the prefix has to grow as well: the *successor* relation lists the
//! prefixes a clause may move to (`∀ → ∀∀`, `∃=k → ∃=k ∀`, ...). The *mirror* relation
//! pairs prefixes that denote the same sentence once the two variables are renamed, which
//! matters for decomposable clauses.
use std::collections::HashMap;

use log::debug;

use crate::arena::Arena;
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::types::TermId;

#[derive(Debug, Clone)]
pub struct QuantifierLattice {
    all: Vec<Quantifier>,
    successors: HashMap<Quantifier, Vec<Quantifier>>,
    mirrors: HashMap<Quantifier, Quantifier>,
    max_k: u32,
}

impl QuantifierLattice {
    /// Builds the lattice over the canonical variables of `arena`.
    ///
    /// * `exists` - allow existential quantifiers at all; otherwise only `∀` and `∀∀`
    /// * `max_k` - largest cardinality bound
    /// * `counting` - generate counting quantifiers `∃=k`
    /// * `double_counting` - also generate `∃=k ∃=j`
    pub fn new(arena: &Arena, exists: bool, max_k: u32, counting: bool, double_counting: bool) -> Self {
        let (x, y) = (arena.x(), arena.y());
        let mut lattice = Self {
            all: Vec::new(),
            successors: HashMap::new(),
            mirrors: HashMap::new(),
            max_k,
        };

        let q1 = |kind, card| Quantifier::single(kind, x, card);
        let q2 = |kind, first, second| Quantifier::new(kind, [x, y], first, second);

        use QuantifierKind::*;
        let forall = q1(Forall, None);
        let forall_forall = q2(ForallForall, None, None);

        if !exists {
            lattice.push(forall);
            lattice.push(forall_forall);
            lattice.successor(forall, forall_forall);
            return lattice;
        }

        let exists_q = q1(Exists, None);
        let forall_exists = q2(ForallExists, None, None);
        let exists_forall = q2(ExistsForall, None, None);
        let exists_exists = q2(ExistsExists, None, None);
        for q in [forall, exists_q, forall_forall, forall_exists, exists_forall, exists_exists] {
            lattice.push(q);
        }
        lattice.successor(forall, forall_forall);
        lattice.successor(forall, forall_exists);
        lattice.successor(exists_q, exists_forall);
        lattice.successor(exists_q, exists_exists);
        lattice.mirror_pair(forall_exists, exists_forall);

        if counting {
            let mut counting_exists: HashMap<u32, Quantifier> = HashMap::new();
            let mut flip: HashMap<u32, Quantifier> = HashMap::new();

            let mut plan = vec![(Exists, 0), (ExistsForall, 0), (ForallExists, 1)];
            if double_counting {
                plan.push((ExistsExists, 0));
                plan.push((ExistsExists, 1));
            }

            for (kind, position) in plan {
                for k in 1..=max_k {
                    let q = if kind.arity() == 1 {
                        q1(kind, Some(k))
                    } else if position == 0 {
                        q2(kind, Some(k), None)
                    } else {
                        q2(kind, None, Some(k))
                    };
                    lattice.push(q);

                    let predecessor = if position == 0 {
                        if kind == Exists {
                            counting_exists.insert(k, q);
                            None
                        } else {
                            counting_exists.get(&k).copied()
                        }
                    } else if kind.starts_with_forall() {
                        Some(forall)
                    } else {
                        Some(exists_q)
                    };
                    if let Some(p) = predecessor {
                        lattice.successor(p, q);
                    }

                    if kind.arity() == 2 {
                        if position == 0 {
                            flip.insert(k, q);
                        } else if let Some(&other) = flip.get(&k) {
                            lattice.mirror_pair(other, q);
                        }
                    }
                }
            }

            if double_counting {
                for k in 1..=max_k {
                    for j in 1..=max_k {
                        let q = q2(ExistsExists, Some(k), Some(j));
                        lattice.push(q);
                        if let Some(&p) = counting_exists.get(&k) {
                            lattice.successor(p, q);
                        }
                        if k < j {
                            lattice.mirror_pair(q, q2(ExistsExists, Some(j), Some(k)));
                        }
                    }
                }
            }
        }

        debug!(
            "Quantifier lattice: {} quantifiers, {} with successors, {} mirrored",
            lattice.all.len(),
            lattice.successors.len(),
            lattice.mirrors.len()
        );
        lattice
    }

    fn push(&mut self, q: Quantifier) {
        if !self.all.contains(&q) {
            self.all.push(q);
        }
    }

    fn successor(&mut self, from: Quantifier, to: Quantifier) {
        let list = self.successors.entry(from).or_default();
        if !list.contains(&to) {
            list.push(to);
        }
    }

    fn mirror_pair(&mut self, a: Quantifier, b: Quantifier) {
        self.mirrors.insert(a, b);
        self.mirrors.insert(b, a);
    }

    /// All quantifiers, in generation order.
    pub fn all(&self) -> &[Quantifier] {
        &self.all
    }

    pub fn successors(&self, q: &Quantifier) -> &[Quantifier] {
        self.successors.get(q).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mirror(&self, q: &Quantifier) -> Option<Quantifier> {
        self.mirrors.get(q).copied()
    }

    pub fn max_k(&self) -> u32 {
        self.max_k
    }

    /// Single-variable prefixes implied by the given one, used when projecting a
    /// decomposable clause onto one of its variables.
    ///
    /// A plain `∃` is also implied by `∀` and by `∃=1`.
    pub fn weaker_or_equal(&self, var: TermId, kind: QuantifierKind, card: Option<u32>) -> Vec<Quantifier> {
        let mut out = vec![Quantifier::single(kind, var, card)];
        if kind == QuantifierKind::Exists && card.is_none() {
            out.push(Quantifier::single(QuantifierKind::Forall, var, None));
            if self.max_k >= 1 {
                out.push(Quantifier::single(QuantifierKind::Exists, var, Some(1)));
            }
        }
        out
    }
}
