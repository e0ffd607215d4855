//! One-literal refinement of clauses and level-wise clause generation.
use std::collections::HashSet;

use log::{debug, info};
use rayon::prelude::*;

use crate::arena::Arena;
use crate::clause::Clause;
use crate::error::Result;
use crate::lattice::QuantifierLattice;
use crate::quantifier::Quantifier;
use crate::types::{LitId, TermId};
use crate::vocabulary::Vocabulary;

pub struct Refiner<'a> {
    arena: &'a Arena,
    lattice: &'a QuantifierLattice,
    vocabulary: &'a Vocabulary,
}

impl<'a> Refiner<'a> {
    pub fn new(arena: &'a Arena, lattice: &'a QuantifierLattice, vocabulary: &'a Vocabulary) -> Self {
        Self {
            arena,
            lattice,
            vocabulary,
        }
    }

    /// All clauses obtained by adding one vocabulary literal under a legal quantifier.
    ///
    /// A quantifier is legal if it binds exactly the variables of the extended literal set.
    pub fn refinements(&self, clause: &Clause) -> Vec<Clause> {
        let arena = self.arena;
        let mut out = Vec::new();

        for &lit in self.vocabulary.literals() {
            if clause.contains(lit) {
                continue;
            }
            let lit_vars = arena.variables(lit);

            // (quantifier, mirror the existing literals)
            let mut candidates: Vec<(Quantifier, bool)> = Vec::new();
            match clause.quantifier() {
                None => candidates.extend(self.lattice.all().iter().map(|&q| (q, false))),
                Some(&q) => {
                    candidates.push((q, false));
                    let successors = self.lattice.successors(&q);
                    candidates.extend(successors.iter().map(|&s| (s, false)));
                    if clause.is_decomposable() && q.used_variables() == 2 && lit_vars.len() > 1 {
                        if let Some(m) = self.lattice.mirror(&q) {
                            debug_assert!(successors.is_empty(), "Quantifier with both successors and a mirror");
                            candidates.push((m, true));
                        }
                    }
                }
            }

            let mut target: Vec<TermId> = clause.variables().iter().copied().chain(lit_vars).collect();
            target.sort_unstable();
            target.dedup();

            for (q, mirrored) in candidates {
                let mut bound = q.variables().to_vec();
                bound.sort_unstable();
                if bound != target {
                    continue;
                }
                let mut literals: Vec<LitId> = clause.literals().to_vec();
                literals.push(lit);
                if mirrored {
                    literals = literals.into_iter().map(|l| arena.mirror(l)).collect();
                }
                out.push(Clause::new(arena, literals, Some(q)));
            }
        }
        out
    }

    /// Generates clauses level by level up to `max_literals` literals.
    ///
    /// Candidates are deduplicated by canonical string (the first one in generation order
    /// wins) and only candidates accepted by `accept` are refined further.
    pub fn generate<F>(&self, max_literals: usize, accept: F) -> Result<Vec<Clause>>
    where
        F: Fn(&Clause) -> Result<bool> + Sync,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut all = Vec::new();
        let mut layer = vec![Clause::new(self.arena, [], None)];

        for level in 1..=max_literals {
            let candidates: Vec<Clause> = layer.par_iter().flat_map_iter(|c| self.refinements(c)).collect();
            let total = candidates.len();
            let fresh: Vec<Clause> = candidates
                .into_iter()
                .filter(|c| seen.insert(c.canonical().to_string()))
                .collect();
            let unique = fresh.len();
            let verdicts: Vec<bool> = fresh.par_iter().map(&accept).collect::<Result<_>>()?;
            layer = fresh
                .into_iter()
                .zip(verdicts)
                .filter_map(|(c, ok)| ok.then_some(c))
                .collect();
            debug!(
                "Level {}: {} refinements, {} unique, {} accepted",
                level,
                total,
                unique,
                layer.len()
            );
            all.extend(layer.iter().cloned());
        }

        info!("Generated {} clauses with up to {} literals", all.len(), max_literals);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::parser::parse_quantified;
    use crate::quantifier::QuantifierKind;

    fn setup(counting: bool) -> (Arena, QuantifierLattice, Vocabulary) {
        let mut arena = Arena::new();
        let vocabulary = Vocabulary::new(&mut arena, 1, 1);
        let lattice = QuantifierLattice::new(&arena, true, 1, counting, false);
        (arena, lattice, vocabulary)
    }

    #[test]
    fn test_refine_empty() {
        let (arena, lattice, vocabulary) = setup(false);
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let out = refiner.refinements(&Clause::new(&arena, [], None));
        let canon: HashSet<&str> = out.iter().map(|c| c.canonical()).collect();
        assert!(canon.contains("(V x U0(x))"));
        assert!(canon.contains("(E x ~U0(x))"));
        assert!(canon.contains("(V x E y B0(x, y))"));
        assert!(canon.contains("(E x B0(x, x))"));
        // literals over y alone admit no quantifier
        assert!(out.iter().all(|c| c.variables().contains(&arena.x())));
    }

    #[test]
    fn test_refine_uses_successors() {
        let (mut arena, lattice, vocabulary) = setup(false);
        let clause = parse_quantified(&mut arena, "V x U0(x)").unwrap();
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let out = refiner.refinements(&clause);
        let fol: HashSet<String> = out.iter().map(|c| c.to_fol(&arena)).collect();
        assert!(fol.contains("V x ~B0(x, x) | U0(x)") || fol.contains("V x U0(x) | ~B0(x, x)"));
        assert!(fol.contains("V x V y B0(x, y) | U0(x)"));
        assert!(fol.contains("V x E y B0(x, y) | U0(x)"));
        assert!(!fol.iter().any(|s| s.starts_with("E")));
    }

    #[test]
    fn test_refine_mirror() {
        let (mut arena, lattice, vocabulary) = setup(false);
        let clause = parse_quantified(&mut arena, "V x E y U0(x) | U0(y)").unwrap();
        let extended = parse_quantified(&mut arena, "E x V y U0(x) | U0(y) | B0(y, x)").unwrap();
        assert!(clause.is_decomposable());
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let out = refiner.refinements(&clause);
        let mirrored: Vec<&Clause> = out
            .iter()
            .filter(|c| c.quantifier().map(|q| q.kind()) == Some(QuantifierKind::ExistsForall))
            .collect();
        assert!(!mirrored.is_empty());
        assert!(mirrored.iter().all(|c| c.len() == 3));
        // the added literal is mirrored together with the existing ones
        assert!(mirrored.iter().any(|c| **c == extended));
    }

    #[test]
    fn test_generate_dedups() {
        let (arena, lattice, vocabulary) = setup(true);
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let clauses = refiner.generate(2, |_| Ok(true)).unwrap();
        let canon: HashSet<&str> = clauses.iter().map(|c| c.canonical()).collect();
        assert_eq!(canon.len(), clauses.len());
        assert!(canon.contains("(E=1 x U0(x))"));
        assert!(clauses.iter().all(|c| c.len() <= 2));
        for (i, a) in clauses.iter().enumerate() {
            for b in &clauses[i + 1..] {
                assert!(a != b);
            }
        }
    }

    #[test]
    fn test_generate_respects_filter() {
        let (arena, lattice, vocabulary) = setup(false);
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let clauses = refiner.generate(3, |c| Ok(c.len() < 2)).unwrap();
        assert!(clauses.iter().all(|c| c.len() == 1));
    }
}
