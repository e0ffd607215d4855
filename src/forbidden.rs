//! Precomputed table of redundant clause pairs and decomposition triples.
//!
//! Ids are packed into a single `u64`, each occupying [`bits_for`] of the pool size. The
//! table is filled once, in parallel, before any sentence is assembled; afterwards every
//! lookup is a single set-membership test.
use std::collections::HashSet;

use log::info;
use rayon::prelude::*;

use crate::arena::Arena;
use crate::clause::Clause;
use crate::error::{Error, Result};
use crate::lattice::QuantifierLattice;
use crate::pool::ClausePool;
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::redundancy::is_redundant;
use crate::types::{ClauseId, LitId};
use crate::utils::{bits_for, non_empty_subsets, pack2, pack3};

#[derive(Debug, Default)]
pub struct ForbiddenTable {
    bits: u32,
    pairs: HashSet<u64>,
    triples: HashSet<u64>,
}

impl ForbiddenTable {
    /// Bits per id for a pool of `count` clauses.
    ///
    /// Fails if three ids would not fit into a `u64`.
    pub fn id_bits(count: usize) -> Result<u32> {
        let bits = bits_for(count);
        if 3 * bits > u64::BITS {
            return Err(Error::Config(format!(
                "clause pool of {} clauses needs {} bits per id, at most {} fit",
                count,
                bits,
                u64::BITS / 3
            )));
        }
        Ok(bits)
    }

    /// Computes all redundant pairs of `pool`, and, with `triples`, the decomposition triples.
    pub fn precompute(arena: &Arena, lattice: &QuantifierLattice, pool: &ClausePool, triples: bool) -> Result<Self> {
        let bits = Self::id_bits(pool.len())?;
        let n = pool.len();

        let pairs: HashSet<u64> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let a = &pool[ClauseId::new(i)];
                (i + 1..n).filter_map(move |j| {
                    is_redundant(arena, a, &pool[ClauseId::new(j)]).then(|| pack2(i as u64, j as u64, bits))
                })
            })
            .collect();

        let triples: HashSet<u64> = if triples {
            (0..n)
                .into_par_iter()
                .flat_map_iter(|i| {
                    let id = ClauseId::new(i);
                    decomposition_triples(arena, lattice, pool, id, &pool[id], bits)
                })
                .collect()
        } else {
            HashSet::new()
        };

        info!(
            "Forbidden table: {} clauses, {} bits per id, {} pairs, {} triples",
            n,
            bits,
            pairs.len(),
            triples.len()
        );
        Ok(Self { bits, pairs, triples })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn num_triples(&self) -> usize {
        self.triples.len()
    }

    pub fn is_forbidden_pair(&self, a: ClauseId, b: ClauseId) -> bool {
        self.pairs.contains(&pack2(a.packed(), b.packed(), self.bits))
    }

    pub fn is_forbidden_triple(&self, a: ClauseId, b: ClauseId, c: ClauseId) -> bool {
        self.triples
            .contains(&pack3([a.packed(), b.packed(), c.packed()], self.bits))
    }
}

/// Triples `(φ', ρ', clause)` where `φ'` and `ρ'` are projections of a two-variable
/// clause onto its first and second variable.
///
/// Only single-variable literals are projected; literals over both variables are left out
/// of either side.
///
/// Projections that are not in the pool never occur in a sentence and are skipped.
fn decomposition_triples(
    arena: &Arena,
    lattice: &QuantifierLattice,
    pool: &ClausePool,
    id: ClauseId,
    clause: &Clause,
    bits: u32,
) -> Vec<u64> {
    let Some(&q) = clause.quantifier() else {
        return Vec::new();
    };
    let Some(y) = q.second_variable() else {
        return Vec::new();
    };
    if clause.len() < 2 {
        return Vec::new();
    }
    let x = q.first_variable();

    let mut phi: Vec<LitId> = Vec::new();
    let mut rho: Vec<LitId> = Vec::new();
    for &l in clause.literals() {
        match arena.variables(l).as_slice() {
            [v] if *v == x => phi.push(l),
            [v] if *v == y => rho.push(arena.mirror(l)),
            _ => continue,
        }
    }
    if phi.is_empty() || rho.is_empty() {
        return Vec::new();
    }

    let phi_kind = if q.starts_with_forall() {
        QuantifierKind::Forall
    } else {
        QuantifierKind::Exists
    };
    let rho_kind = if matches!(q.kind(), QuantifierKind::ForallForall | QuantifierKind::ExistsForall) {
        QuantifierKind::Forall
    } else {
        QuantifierKind::Exists
    };
    let phi_quantifiers = lattice.weaker_or_equal(x, phi_kind, q.first());
    let rho_quantifiers = lattice.weaker_or_equal(x, rho_kind, q.second());

    let lookup = |lits: &[LitId], quantifier: Quantifier| {
        let part = Clause::new(arena, lits.iter().copied(), Some(quantifier));
        pool.find(part.canonical())
    };

    let mut out = Vec::new();
    for phi_sub in non_empty_subsets(&phi) {
        for &qp in &phi_quantifiers {
            let Some(p) = lookup(&phi_sub, qp) else { continue };
            for rho_sub in non_empty_subsets(&rho) {
                for &qr in &rho_quantifiers {
                    let Some(r) = lookup(&rho_sub, qr) else { continue };
                    out.push(pack3([id.packed(), p.packed(), r.packed()], bits));
                }
            }
        }
    }
    out
}
