//! Pairwise redundancy of quantified clauses.
//!
//! `is_redundant(α, β)` answers: if a sentence already contains `α`, does adding `β` (or
//! the converse) contribute nothing, because one clause entails the other or because
//! their conjunction is trivially contradictory? The decision is syntactic and encodes a
//! fixed table of entailments between quantifier prefixes. Configurations the table does
//! not cover are reported as not redundant.
use log::trace;

use crate::arena::Arena;
use crate::clause::Clause;
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::utils::is_sorted_subset;

use QuantifierKind::*;

fn subset<T: Ord>(a: &[T], b: &[T]) -> bool {
    is_sorted_subset(a, b)
}

fn either_subset<T: Ord>(a: &[T], b: &[T]) -> bool {
    subset(a, b) || subset(b, a)
}

fn quantifier(c: &Clause) -> Quantifier {
    *c.quantifier()
        .unwrap_or_else(|| panic!("Redundancy check on an unquantified clause: {:?}", c.literals()))
}

/// Is the pair `(alpha, beta)` redundant?
///
/// # Panics
///
/// Panics if either clause is unquantified.
pub fn is_redundant(arena: &Arena, alpha: &Clause, beta: &Clause) -> bool {
    let (qa, qb) = (quantifier(alpha), quantifier(beta));

    if !either_subset(alpha.predicates(), beta.predicates()) {
        return false;
    }

    if qa == qb {
        return either_subset(alpha.literals(), beta.literals())
            || (qa.is_swappable() && either_subset(alpha.literals(), beta.mirrored_literals()));
    }

    if qa.used_variables() == 2
        && qb.used_variables() == 2
        && qb.mirror() == qa
        && (alpha.is_decomposable() || beta.is_decomposable())
        && either_subset(alpha.literals(), beta.mirrored_literals())
    {
        return true;
    }

    match (qa.is_counting(), qb.is_counting()) {
        (true, true) => decide_c2_c2(alpha, beta),
        (true, false) => decide_fo2_c2(arena, beta, alpha),
        (false, true) => decide_fo2_c2(arena, alpha, beta),
        (false, false) => decide_fo2_fo2(alpha, beta),
    }
}

/// Both clauses carry cardinality bounds.
fn decide_c2_c2(alpha: &Clause, beta: &Clause) -> bool {
    let (qa, qb) = (quantifier(alpha), quantifier(beta));
    let same_literals = alpha.literals() == beta.literals();

    match (qa.used_variables(), qb.used_variables()) {
        // `∃=k x φ ∧ ∃=j x φ` with k ≠ j has no model.
        (1, 1) => qa.first() != qb.first() && same_literals,
        (2, 2) => {
            alpha.len() == 1
                && beta.len() == 1
                && same_literals
                && ((qa.kind() == ForallExists && qb.kind() == ForallExists && qa.second() != qb.second())
                    || (qa.kind() == ExistsForall && qb.kind() == ExistsForall && qa.first() != qb.first()))
        }
        _ => false,
    }
}

/// `fo` is a plain clause, `c2` a counting one.
fn decide_fo2_c2(arena: &Arena, fo: &Clause, c2: &Clause) -> bool {
    let (qf, qc) = (quantifier(fo), quantifier(c2));
    let eq = fo.literals() == c2.literals();
    let single_pair = fo.len() == 1 && c2.len() == 1;
    let fo_negation = fo.literals().first().map(|&l| arena.negation(l));

    match (qf.used_variables(), qc.used_variables()) {
        (1, 1) => {
            if qf.kind() == Forall {
                if eq {
                    return true;
                }
                // `∀x φ ∧ ∃=k x ¬φ` has no model.
                if single_pair && fo_negation.is_some_and(|n| c2.contains(n)) {
                    return true;
                }
            }
            qf.kind() == Exists && eq
        }
        (2, 2) => {
            let mirror_eq = fo.mirrored_literals() == c2.literals();
            let c2_kind = qc.kind();
            let c2_has_exists = matches!(c2_kind, ForallExists | ExistsForall | ExistsExists);
            match qf.kind() {
                ForallForall if c2_has_exists => {
                    if eq || mirror_eq {
                        return true;
                    }
                    single_pair && fo_negation.is_some_and(|n| c2.contains(n) || c2.contains(arena.mirror(n)))
                }
                ForallExists => {
                    (eq && c2_kind == ForallExists)
                        || (mirror_eq && c2_kind == ExistsForall && fo.is_decomposable() && c2.is_decomposable())
                }
                ExistsForall => eq && matches!(c2_kind, ForallExists | ExistsForall),
                ExistsExists => c2_kind == ExistsExists && (eq || mirror_eq),
                _ => {
                    trace!("Uncovered plain/counting configuration: {:?} with {:?}", qf, qc);
                    false
                }
            }
        }
        (1, 2) if qf.kind() == Forall => {
            let fo_subsumes = subset(fo.literals(), c2.literals());
            (qc.kind() == ExistsExists && qc.first().is_none() && fo_subsumes) || (qc.kind() == ForallExists && fo_subsumes)
        }
        _ => {
            trace!("Uncovered plain/counting configuration: {:?} with {:?}", qf, qc);
            false
        }
    }
}

/// Neither clause carries cardinality bounds.
fn decide_fo2_fo2(alpha: &Clause, beta: &Clause) -> bool {
    let (ka, kb) = (quantifier(alpha).kind(), quantifier(beta).kind());
    let (a, b) = (alpha.literals(), beta.literals());
    let mirror_a = alpha.mirrored_literals();

    let alpha_subsumes_beta = subset(a, b);
    let beta_subsumes_alpha = subset(b, a);
    let mirror_equals = mirror_a == b;
    let beta_subsumes_mirror_alpha = subset(b, mirror_a);
    let alpha_subsumes_mirror_beta = subset(mirror_a, b);

    let pair = |x: QuantifierKind, y: QuantifierKind| (ka == x && kb == y) || (ka == y && kb == x);

    // ∀x φ entails ∃x φ' for φ ⊆ φ'.
    if pair(Forall, Exists) && ((ka == Forall && alpha_subsumes_beta) || (kb == Forall && beta_subsumes_alpha)) {
        return true;
    }

    for strong in [Forall, ForallForall] {
        if (ka == strong && (alpha_subsumes_beta || alpha_subsumes_mirror_beta))
            || (kb == strong && (beta_subsumes_alpha || beta_subsumes_mirror_alpha))
        {
            return true;
        }
    }

    for mixed in [ForallExists, ExistsForall] {
        if pair(mixed, ExistsExists)
            && ((ka == mixed && (alpha_subsumes_beta || alpha_subsumes_mirror_beta))
                || (kb == mixed && (beta_subsumes_alpha || beta_subsumes_mirror_alpha)))
        {
            return true;
        }
    }

    if mirror_equals && pair(ExistsForall, ForallExists) {
        return true;
    }

    if pair(ExistsExists, ExistsExists) {
        trace!("Uncovered double-existential configuration left as non-redundant");
    }
    false
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::arena::Arena;
    use crate::parser::parse_quantified;
    use crate::vocabulary::Vocabulary;

    fn check(a: &str, b: &str) -> bool {
        let mut arena = Arena::new();
        Vocabulary::new(&mut arena, 2, 2);
        let a = parse_quantified(&mut arena, a).unwrap();
        let b = parse_quantified(&mut arena, b).unwrap();
        is_redundant(&arena, &a, &b)
    }

    #[test]
    fn test_same_quantifier_subset() {
        assert!(check("V x V y B0(x, y) | ~B0(y, x)", "V x V y B0(x, y)"));
        assert!(check("V x V y B0(x, y)", "V x V y B0(x, y) | ~B0(y, x)"));
        assert!(!check("V x V y B0(x, y) | U0(x)", "V x V y B0(x, y) | U1(x)"));
    }

    #[test]
    fn test_same_quantifier_swap() {
        assert!(check("V x V y B0(x, y) | U0(x)", "V x V y B0(y, x)"));
        assert!(!check("V x E y B0(x, y) | U0(x)", "V x E y B0(y, x)"));
    }

    #[test]
    fn test_disjoint_predicates() {
        assert!(!check("V x U0(x)", "V x V y B0(x, y)"));
        assert!(!check("V x U0(x) | U1(x)", "V x U1(x) | B0(x, x)"));
    }

    #[test]
    fn test_mirror_pair() {
        assert!(check("V x E y U0(x) | U1(y)", "E x V y U1(x) | U0(y)"));
    }

    #[test]
    fn test_plain_entailments() {
        assert!(check("V x U0(x)", "E x U0(x) | U1(x)"));
        assert!(!check("E x U0(x)", "V x U0(x) | U1(x)"));
        assert!(check("V x V y B0(x, y)", "E x E y B0(x, y) | B0(y, x)"));
        assert!(check("V x V y B0(x, y)", "V x E y B0(y, x) | U0(x)"));
        assert!(check("V x E y B0(x, y)", "E x E y B0(x, y)"));
        assert!(check("E x E y B0(x, y)", "E x E y B0(x, y) | U0(x)"));
        assert!(check("E x V y B0(x, y)", "V x E y B0(y, x)"));
    }

    #[test]
    fn test_counting_single() {
        assert!(check("E=1 x U0(x)", "E=2 x U0(x)"));
        assert!(!check("E=1 x U0(x)", "E=2 x U1(x)"));
        assert!(check("V x U0(x)", "E=1 x U0(x)"));
        assert!(check("V x U0(x)", "E=2 x ~U0(x)"));
        assert!(check("E x U0(x)", "E=2 x U0(x)"));
        assert!(!check("E x U0(x)", "E=2 x ~U0(x)"));
    }

    #[test]
    fn test_counting_double() {
        assert!(check("V x E=1 y B0(x, y)", "V x E=2 y B0(x, y)"));
        assert!(!check("V x E=1 y B0(x, y)", "V x E=2 y B0(x, y) | U0(x)"));
        assert!(check("V x V y B0(x, y)", "V x E=1 y B0(x, y)"));
        assert!(check("V x V y B0(x, y)", "V x E=1 y ~B0(y, x)"));
        assert!(check("V x E y B0(x, y)", "V x E=1 y B0(x, y)"));
        assert!(check("V x U0(x)", "V x E=1 y U0(x) | B0(x, y)"));
    }

    #[test]
    #[should_panic]
    fn test_unquantified_panics() {
        let mut arena = Arena::new();
        let a = crate::parser::parse_clause(&mut arena, "p(X)", ',').unwrap();
        is_redundant(&arena, &a, &a);
    }
}
