//! Skolemization of single clauses for weighted first-order model counting.
use crate::arena::Arena;
use crate::clause::Clause;
use crate::quantifier::{Quantifier, QuantifierKind};
use crate::types::{LitId, PredId, TermId};

/// Hands out fresh Skolem predicates `S0`, `S1`, ...
///
/// Nullary and unary Skolem predicates are counted separately.
#[derive(Debug, Default)]
pub struct SkolemFactory {
    nullary: usize,
    unary: usize,
}

impl SkolemFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullary(&mut self, arena: &mut Arena) -> PredId {
        let name = format!("S{}", self.nullary);
        self.nullary += 1;
        arena.predicate(&name, 0)
    }

    pub fn unary(&mut self, arena: &mut Arena) -> PredId {
        let name = format!("S{}", self.unary);
        self.unary += 1;
        arena.predicate(&name, 1)
    }
}

/// Universal closure over whatever variables the literals use.
fn universal(arena: &Arena, literals: Vec<LitId>) -> Clause {
    let mut vars: Vec<TermId> = literals.iter().flat_map(|&l| arena.variables(l)).collect();
    vars.sort_unstable();
    vars.dedup();
    let quantifier = match vars.as_slice() {
        [] => None,
        [v] => Some(Quantifier::single(QuantifierKind::Forall, *v, None)),
        [a, b] => Some(Quantifier::new(QuantifierKind::ForallForall, [*a, *b], None, None)),
        _ => panic!("Skolemized clause uses more than two variables"),
    };
    Clause::new(arena, literals, quantifier)
}

/// Rewrites a quantified clause into an existential-free clause set.
///
/// | prefix                    | result                                      |
/// |---------------------------|---------------------------------------------|
/// | `∀`, `∀∀`, `∀∃` (y unused) | the clause itself                           |
/// | `∀∃` (y used)             | `¬l ∨ S(x)` for every literal `l`           |
/// | only x used               | `¬l ∨ S` for every literal `l`              |
/// | `∃∀` (both used)          | `¬S ∨ T(x)` and `T(x) ∨ clause`             |
/// | `∃∃` (both used)          | `¬l ∨ S` for every literal `l`              |
///
/// # Panics
///
/// Panics if the clause is unquantified or does not use its first variable.
pub fn skolemize(arena: &mut Arena, clause: &Clause, factory: &mut SkolemFactory) -> Vec<Clause> {
    let q = *clause
        .quantifier()
        .unwrap_or_else(|| panic!("Skolemization of an unquantified clause: {}", clause.to_fol(arena)));
    let x = q.first_variable();
    assert!(
        clause.variables().contains(&x),
        "Skolemization of a clause that does not use its first variable: {}",
        clause.to_fol(arena)
    );
    let y_used = q.second_variable().is_some_and(|y| clause.variables().contains(&y));

    match q.kind() {
        QuantifierKind::Forall | QuantifierKind::ForallForall => vec![clause.clone()],
        QuantifierKind::ForallExists if !y_used => vec![clause.clone()],
        QuantifierKind::ForallExists => {
            let s = factory.unary(arena);
            let sx = arena.literal(s, vec![x], false);
            clause
                .literals()
                .iter()
                .map(|&l| universal(arena, vec![arena.negation(l), sx]))
                .collect()
        }
        _ if !y_used => {
            let s = factory.nullary(arena);
            let s0 = arena.literal(s, vec![], false);
            clause
                .literals()
                .iter()
                .map(|&l| universal(arena, vec![arena.negation(l), s0]))
                .collect()
        }
        QuantifierKind::ExistsForall => {
            let s = factory.nullary(arena);
            let not_s0 = arena.literal(s, vec![], true);
            let t = factory.unary(arena);
            let tx = arena.literal(t, vec![x], false);
            let mut with_t = clause.literals().to_vec();
            with_t.push(tx);
            vec![universal(arena, vec![not_s0, tx]), universal(arena, with_t)]
        }
        QuantifierKind::ExistsExists => {
            let s = factory.nullary(arena);
            let s0 = arena.literal(s, vec![], false);
            clause
                .literals()
                .iter()
                .map(|&l| universal(arena, vec![arena.negation(l), s0]))
                .collect()
        }
        QuantifierKind::Exists => unreachable!("single-variable prefix always uses only x"),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::parser::parse_quantified;

    fn run(text: &str) -> Vec<String> {
        let mut arena = Arena::new();
        let clause = parse_quantified(&mut arena, text).unwrap();
        let mut factory = SkolemFactory::new();
        let mut out: Vec<String> = skolemize(&mut arena, &clause, &mut factory)
            .iter()
            .map(|c| c.to_fol(&arena))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_universal_unchanged() {
        assert_eq!(run("V x V y B0(x, y) | U0(x)"), vec!["V x V y B0(x, y) | U0(x)"]);
        assert_eq!(run("V x E y U0(x)"), vec!["V x E y U0(x)"]);
        assert_eq!(run("V x U0(x)"), vec!["V x U0(x)"]);
    }

    #[test]
    fn test_forall_exists() {
        assert_eq!(
            run("V x E y B0(x, y) | U0(y)"),
            vec!["V x V y S0(x) | ~B0(x, y)", "V x V y S0(x) | ~U0(y)"]
        );
    }

    #[test]
    fn test_only_first_used() {
        assert_eq!(run("E x U0(x) | U1(x)"), vec!["V x S0 | ~U0(x)", "V x S0 | ~U1(x)"]);
        assert_eq!(run("E x V y U0(x)"), vec!["V x S0 | ~U0(x)"]);
    }

    #[test]
    fn test_exists_forall() {
        assert_eq!(
            run("E x V y B0(x, y)"),
            vec!["V x S0(x) | ~S0", "V x V y B0(x, y) | S0(x)"]
        );
    }

    #[test]
    fn test_exists_exists() {
        assert_eq!(run("E x E y B0(x, y)"), vec!["V x V y S0 | ~B0(x, y)"]);
    }

    #[test]
    #[should_panic]
    fn test_unquantified_panics() {
        let mut arena = Arena::new();
        let clause = crate::parser::parse_clause(&mut arena, "p(X)", ',').unwrap();
        skolemize(&mut arena, &clause, &mut SkolemFactory::new());
    }
}
