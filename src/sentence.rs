//! Sentences: conjunctions of pooled clauses, and their ultra-canonical form.
use std::fmt;

use crate::arena::Arena;
use crate::clause::Clause;
use crate::error::{Error, Result};
use crate::parser::parse_sentence;
use crate::pool::ClausePool;
use crate::types::{ClauseId, LitId, PredId};
use crate::utils::injections;
use crate::vocabulary::Vocabulary;

/// A conjunction of clauses, referenced by their id in the [`ClausePool`].
///
/// Clause order is the order in which the sentence was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sentence {
    clauses: Vec<ClauseId>,
}

impl Sentence {
    pub fn new(clauses: Vec<ClauseId>) -> Self {
        Self { clauses }
    }

    pub fn single(clause: ClauseId) -> Self {
        Self { clauses: vec![clause] }
    }

    /// Parses `(c1) & (c2) & ...`, requiring every clause to be in `pool`.
    pub fn parse(arena: &mut Arena, pool: &ClausePool, text: &str) -> Result<Self> {
        let clauses = parse_sentence(arena, text)?
            .iter()
            .map(|c| {
                pool.find(c.canonical())
                    .ok_or_else(|| Error::parse(text, format!("clause `{}` is not in the pool", c.canonical())))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[ClauseId] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// A new sentence with `clause` appended.
    pub fn extend(&self, clause: ClauseId) -> Self {
        let mut clauses = Vec::with_capacity(self.clauses.len() + 1);
        clauses.extend_from_slice(&self.clauses);
        clauses.push(clause);
        Self { clauses }
    }

    pub fn resolve<'p>(&'p self, pool: &'p ClausePool) -> impl Iterator<Item = &'p Clause> + 'p {
        self.clauses.iter().map(move |&id| &pool[id])
    }

    pub fn literal_count(&self, pool: &ClausePool) -> usize {
        self.resolve(pool).map(Clause::len).sum()
    }

    pub fn counting_clauses(&self, pool: &ClausePool) -> usize {
        self.resolve(pool).filter(|c| c.is_counting()).count()
    }

    /// Sorted, distinct predicates used anywhere in the sentence.
    pub fn predicates(&self, pool: &ClausePool) -> Vec<PredId> {
        let mut preds: Vec<PredId> = self.resolve(pool).flat_map(|c| c.predicates().iter().copied()).collect();
        preds.sort_unstable();
        preds.dedup();
        preds
    }

    /// `(c1) & (c2)`, in assembly order.
    pub fn to_fol(&self, arena: &Arena, pool: &ClausePool) -> String {
        self.resolve(pool)
            .map(|c| format!("({})", c.to_fol(arena)))
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// Sorted clause canonicals joined by ` & `.
    pub fn canonical(&self, pool: &ClausePool) -> String {
        let mut parts: Vec<&str> = self.resolve(pool).map(Clause::canonical).collect();
        parts.sort_unstable();
        parts.join(" & ")
    }

    pub fn display<'a>(&'a self, arena: &'a Arena, pool: &'a ClausePool) -> impl fmt::Display + 'a {
        DisplaySentence {
            sentence: self,
            arena,
            pool,
        }
    }
}

struct DisplaySentence<'a> {
    sentence: &'a Sentence,
    arena: &'a Arena,
    pool: &'a ClausePool,
}

impl fmt::Display for DisplaySentence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sentence.to_fol(self.arena, self.pool))
    }
}

/// Which renamings count as "the same sentence".
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SymmetryFlags {
    /// Predicates of equal arity may be renamed onto each other.
    pub predicates: bool,
    /// A predicate may be replaced by its complement.
    pub negations: bool,
    /// A binary predicate may be replaced by its transpose.
    pub arguments: bool,
}

/// Symmetries of the vocabulary used to compute ultra-canonical forms.
///
/// Only predicates that occur in a sentence are ever moved, so each group element is
/// an injective renaming of the used predicates into the vocabulary, combined with
/// complement and transpose choices for each used predicate.
#[derive(Debug, Clone)]
pub struct Symmetries {
    flags: SymmetryFlags,
    unary: Vec<PredId>,
    binary: Vec<PredId>,
}

impl Symmetries {
    pub fn new(vocabulary: &Vocabulary, flags: SymmetryFlags) -> Self {
        Self {
            flags,
            unary: vocabulary.unary().to_vec(),
            binary: vocabulary.binary().to_vec(),
        }
    }

    pub fn flags(&self) -> SymmetryFlags {
        self.flags
    }

    /// Smallest sentence canonical over the whole symmetry orbit of `sentence`.
    ///
    /// Predicates outside the vocabulary stay fixed.
    pub fn ultra_canonical(&self, arena: &Arena, pool: &ClausePool, sentence: &Sentence) -> String {
        let used = sentence.predicates(pool);
        let used_unary: Vec<PredId> = used.iter().copied().filter(|p| self.unary.contains(p)).collect();
        let used_binary: Vec<PredId> = used.iter().copied().filter(|p| self.binary.contains(p)).collect();

        let images = |domain: &[PredId], range: &[PredId]| -> Vec<Vec<PredId>> {
            if self.flags.predicates {
                injections(domain.len(), range.len())
                    .into_iter()
                    .map(|image| image.into_iter().map(|i| range[i]).collect())
                    .collect()
            } else {
                vec![domain.to_vec()]
            }
        };
        let unary_images = images(&used_unary, &self.unary);
        let binary_images = images(&used_binary, &self.binary);

        let moved: Vec<PredId> = used_unary.iter().chain(&used_binary).copied().collect();
        let negation_masks: u32 = if self.flags.negations { 1 << moved.len() } else { 1 };
        let flip_masks: u32 = if self.flags.arguments { 1 << used_binary.len() } else { 1 };

        let clauses: Vec<&Clause> = sentence.resolve(pool).collect();
        let mut best: Option<String> = None;

        for ui in &unary_images {
            for bi in &binary_images {
                let targets: Vec<PredId> = ui.iter().chain(bi).copied().collect();
                for negations in 0..negation_masks {
                    for flips in 0..flip_masks {
                        let map = |l: LitId| -> LitId {
                            let lit = arena.lit(l);
                            let Some(i) = moved.iter().position(|&p| p == lit.predicate) else {
                                return l;
                            };
                            let mut args = lit.args.clone();
                            if i >= used_unary.len() && flips & (1 << (i - used_unary.len())) != 0 {
                                args.reverse();
                            }
                            let negated = lit.negated ^ (negations & (1 << i) != 0);
                            arena.find_literal(targets[i], &args, negated).unwrap_or(l)
                        };
                        let mut parts: Vec<String> = clauses
                            .iter()
                            .map(|c| c.map_literals(arena, map).canonical().to_string())
                            .collect();
                        parts.sort_unstable();
                        let candidate = parts.join(" & ");
                        if best.as_ref().map_or(true, |b| candidate < *b) {
                            best = Some(candidate);
                        }
                    }
                }
            }
        }
        best.unwrap_or_default()
    }
}
