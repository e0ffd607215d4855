//! Clauses: a set of literals under an optional quantifier prefix.
//!
//! All derived data (variables, predicates, components, canonical string) is computed once
//! in [`Clause::new`]; a clause is immutable afterwards.
use std::collections::HashSet;

use crate::arena::Arena;
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::types::{LitId, PredId, TermId};
use crate::utils::is_sorted_subset;

#[derive(Debug, Clone)]
pub struct Clause {
    literals: Vec<LitId>,
    mirrored: Vec<LitId>,
    quantifier: Option<Quantifier>,
    variables: Vec<TermId>,
    predicates: Vec<PredId>,
    decomposable: bool,
    cliffhanger: bool,
    canonical: String,
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        self.quantifier == other.quantifier && self.literals == other.literals
    }
}

impl Eq for Clause {}

impl Clause {
    pub fn new(arena: &Arena, literals: impl IntoIterator<Item = LitId>, quantifier: Option<Quantifier>) -> Self {
        let mut literals: Vec<LitId> = literals.into_iter().collect();
        literals.sort_unstable();
        literals.dedup();

        let mut mirrored: Vec<LitId> = literals.iter().map(|&l| arena.mirror(l)).collect();
        mirrored.sort_unstable();

        let mut variables: Vec<TermId> = literals.iter().flat_map(|&l| arena.variables(l)).collect();
        variables.sort_unstable();
        variables.dedup();

        let mut predicates: Vec<PredId> = literals.iter().map(|&l| arena.lit(l).predicate).collect();
        predicates.sort_unstable();
        predicates.dedup();

        let decomposable = components(arena, &literals, true).len() > 1;

        let cliffhanger = literals.len() == 1
            && quantifier.is_some_and(|q| {
                let lit = literals[0];
                !q.is_counting()
                    && match q.kind() {
                        QuantifierKind::Forall => arena.pred(arena.lit(lit).predicate).arity == 1,
                        QuantifierKind::ForallForall => arena.variables(lit).len() == 2,
                        _ => false,
                    }
            });

        let mut clause = Self {
            literals,
            mirrored,
            quantifier,
            variables,
            predicates,
            decomposable,
            cliffhanger,
            canonical: String::new(),
        };
        clause.canonical = clause.compute_canonical(arena);
        clause
    }

    /// Literals, sorted by handle.
    pub fn literals(&self) -> &[LitId] {
        &self.literals
    }

    /// Literals with `x` and `y` exchanged, sorted by handle.
    pub fn mirrored_literals(&self) -> &[LitId] {
        &self.mirrored
    }

    pub fn quantifier(&self) -> Option<&Quantifier> {
        self.quantifier.as_ref()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn contains(&self, lit: LitId) -> bool {
        self.literals.binary_search(&lit).is_ok()
    }

    /// Variables occurring in the literals, sorted by handle.
    pub fn variables(&self) -> &[TermId] {
        &self.variables
    }

    /// Predicate symbols (name and arity), sorted by handle.
    pub fn predicates(&self) -> &[PredId] {
        &self.predicates
    }

    pub fn is_counting(&self) -> bool {
        self.quantifier.is_some_and(|q| q.is_counting())
    }

    pub fn used_variables(&self) -> usize {
        self.quantifier.map_or(0, |q| q.used_variables())
    }

    /// More than one variable-connected component.
    pub fn is_decomposable(&self) -> bool {
        self.decomposable
    }

    /// A single universally quantified literal that carries no real constraint shape:
    /// `∀x U(x)` for unary `U`, or `∀x∀y B(x, y)` over two distinct variables.
    pub fn is_cliffhanger(&self) -> bool {
        self.cliffhanger
    }

    /// Is `self` a literal subset of `other`?
    pub fn is_subset_of(&self, other: &Clause) -> bool {
        is_sorted_subset(&self.literals, &other.literals)
    }

    /// Canonical key: invariant under literal order and, where the prefix allows it,
    /// under exchanging `x` and `y`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Maximal groups of literals connected through shared terms.
    ///
    /// With `variables_only`, only variables connect literals; a literal without any
    /// connecting term forms its own group.
    pub fn components(&self, arena: &Arena, variables_only: bool) -> Vec<Vec<LitId>> {
        components(arena, &self.literals, variables_only)
    }

    fn sorted_rendering<'a>(arena: &'a Arena, literals: &[LitId]) -> Vec<&'a str> {
        let mut texts: Vec<&str> = literals.iter().map(|&l| arena.display(l)).collect();
        texts.sort_unstable();
        texts
    }

    fn compute_canonical(&self, arena: &Arena) -> String {
        let Some(q) = self.quantifier else {
            return self.to_fol(arena);
        };
        let as_is = format!(
            "({} {})",
            q.prefix(arena),
            Self::sorted_rendering(arena, &self.literals).join(" | ")
        );
        let swap = match q.kind() {
            QuantifierKind::ForallForall => true,
            QuantifierKind::ForallExists | QuantifierKind::ExistsForall => self.decomposable,
            QuantifierKind::ExistsExists => self.decomposable || !q.is_counting(),
            QuantifierKind::Forall | QuantifierKind::Exists => false,
        };
        if !swap {
            return as_is;
        }
        let swapped = format!(
            "({} {})",
            q.mirror().prefix(arena),
            Self::sorted_rendering(arena, &self.mirrored).join(" | ")
        );
        as_is.min(swapped)
    }

    /// First-order rendering, e.g. `V x V y B0(x, y) | ~U0(x)`.
    pub fn to_fol(&self, arena: &Arena) -> String {
        let lits = Self::sorted_rendering(arena, &self.literals).join(" | ");
        match self.quantifier {
            Some(q) => format!("{} {}", q.prefix(arena), lits),
            None => lits,
        }
    }

    /// Prover9 rendering, e.g. `all x exists y (-U0(x) | B0(x, y)).`
    ///
    /// Returns `None` for counting clauses, which Prover9 cannot express.
    pub fn to_prover9(&self, arena: &Arena) -> Option<String> {
        if self.is_counting() {
            return None;
        }
        let mut lits: Vec<String> = self.literals.iter().map(|&l| arena.prover9(l)).collect();
        lits.sort_unstable();
        let body = format!("({}).", lits.join(" | "));
        let Some(q) = self.quantifier else {
            return Some(body);
        };
        let name = |v: TermId| arena.term(v).name().to_string();
        let mut s = String::new();
        s.push_str(if q.kind().is_existential(0) { "exists " } else { "all " });
        s.push_str(&name(q.first_variable()));
        s.push(' ');
        if let Some(y) = q.second_variable() {
            s.push_str(if q.kind().is_existential(1) { "exists " } else { "all " });
            s.push_str(&name(y));
            s.push(' ');
        }
        s.push_str(&body);
        Some(s)
    }

    /// The same quantifier over the mirrored literals.
    pub fn swap(&self, arena: &Arena) -> Clause {
        Clause::new(arena, self.mirrored.iter().copied(), self.quantifier)
    }

    /// The clause read with its two positions exchanged.
    ///
    /// Single-variable clauses are their own mirror.
    pub fn mirror(&self, arena: &Arena) -> Clause {
        match self.quantifier {
            Some(q) if q.used_variables() == 2 => Clause::new(arena, self.mirrored.iter().copied(), Some(q.mirror())),
            _ => self.clone(),
        }
    }

    /// The clause under `map`, applied literal by literal, with the same quantifier.
    pub fn map_literals(&self, arena: &Arena, map: impl Fn(LitId) -> LitId) -> Clause {
        Clause::new(arena, self.literals.iter().map(|&l| map(l)), self.quantifier)
    }
}

/// Connected components of `literals` by frontier expansion over shared terms.
pub fn components(arena: &Arena, literals: &[LitId], variables_only: bool) -> Vec<Vec<LitId>> {
    let keys = |l: LitId| {
        if variables_only {
            arena.variables(l)
        } else {
            arena.terms(l)
        }
    };

    let mut remaining: Vec<LitId> = literals.to_vec();
    let mut groups = Vec::new();
    while let Some(seed) = remaining.pop() {
        let mut closed: HashSet<TermId> = keys(seed).into_iter().collect();
        let mut group = vec![seed];
        if !closed.is_empty() {
            loop {
                let (joined, rest): (Vec<LitId>, Vec<LitId>) = remaining
                    .iter()
                    .partition(|&&l| keys(l).iter().any(|t| closed.contains(t)));
                if joined.is_empty() {
                    break;
                }
                for l in joined {
                    closed.extend(keys(l));
                    group.push(l);
                }
                remaining = rest;
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}
