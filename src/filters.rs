//! Filters applied while generating clauses and assembling sentences.
//!
//! There are three families:
//!
//! - **clause filters** decide whether a generated clause enters the pool,
//! - **joining filters** decide whether a clause `β` may be appended to a sentence `α`,
//! - **sentence filters** inspect a finished sentence; the reflexive-atoms filter only
//!   hides a sentence from the output and keeps it available for extension.
use log::trace;

use crate::arena::Arena;
use crate::clause::Clause;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::forbidden::ForbiddenTable;
use crate::oracle::Oracle;
use crate::pool::ClausePool;
use crate::quantifier::QuantifierKind;
use crate::sentence::Sentence;
use crate::types::{ClauseId, LitId, PredId, TermId};
use crate::utils::is_sorted_subset;
use crate::vocabulary::Vocabulary;

// ---- clause filters ------------------------------------------------------------------

/// Does the clause contain a literal together with its negation?
///
/// Counting clauses are never tautologies in this sense.
pub fn is_naive_tautology(arena: &Arena, clause: &Clause) -> bool {
    !clause.is_counting() && clause.literals().iter().any(|&l| clause.contains(arena.negation(l)))
}

/// Asks the oracle whether the negation of `clause` is contradictory.
pub fn is_tautology(arena: &Arena, clause: &Clause, oracle: &dyn Oracle) -> Result<bool> {
    let Some(text) = clause.to_prover9(arena) else {
        return Ok(false);
    };
    let body = text.strip_suffix('.').unwrap_or(&text);
    oracle.is_provable(&format!("-({}).", body))
}

/// Filters deciding which generated clauses enter the pool.
pub struct ClauseFilters<'a> {
    arena: &'a Arena,
    config: &'a SearchConfig,
    oracle: Option<&'a dyn Oracle>,
}

impl<'a> ClauseFilters<'a> {
    pub fn new(arena: &'a Arena, config: &'a SearchConfig, oracle: Option<&'a dyn Oracle>) -> Self {
        Self { arena, config, oracle }
    }

    pub fn accept(&self, clause: &Clause) -> Result<bool> {
        if clause.len() > self.config.max_literals_per_clause {
            return Ok(false);
        }
        if clause.is_counting() && clause.len() > self.config.max_literals_per_counting_clause {
            return Ok(false);
        }
        if self.config.naive_tautology && is_naive_tautology(self.arena, clause) {
            trace!("NaiveTautology: {}", clause.canonical());
            return Ok(false);
        }
        if self.config.tautology_filter {
            if let Some(oracle) = self.oracle {
                if is_tautology(self.arena, clause, oracle)? {
                    trace!("Tautology: {}", clause.canonical());
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

// ---- θ-subsumption -------------------------------------------------------------------

/// All substitutions `{x, y} -> {x, y}`, optionally keeping `x` fixed.
fn substitutions(x: TermId, y: TermId, x_fixed: bool) -> Vec<[TermId; 2]> {
    let mut out = Vec::with_capacity(4);
    for tx in [x, y] {
        if x_fixed && tx != x {
            continue;
        }
        for ty in [x, y] {
            out.push([tx, ty]);
        }
    }
    out
}

fn apply(arena: &Arena, lit: LitId, x: TermId, y: TermId, image: [TermId; 2]) -> Option<LitId> {
    arena.substitute(lit, |t| {
        if t == x {
            image[0]
        } else if t == y {
            image[1]
        } else {
            t
        }
    })
}

/// Is there a literal whose removal leaves a clause that the whole clause θ-subsumes?
fn is_reducible_disjunction(arena: &Arena, clause: &Clause, x: TermId, y: TermId, x_fixed: bool) -> bool {
    let literals = clause.literals();
    literals.iter().any(|&dropped| {
        let shorter: Vec<LitId> = literals.iter().copied().filter(|&l| l != dropped).collect();
        substitutions(x, y, x_fixed).into_iter().any(|image| {
            let mut mapped = Vec::with_capacity(literals.len());
            for &l in literals {
                match apply(arena, l, x, y, image) {
                    Some(m) => mapped.push(m),
                    None => return false,
                }
            }
            mapped.sort_unstable();
            mapped.dedup();
            is_sorted_subset(&mapped, &shorter)
        })
    })
}

/// Is there a pair of same-sign literals over one predicate where one subsumes the other?
fn is_reducible_conjunction(arena: &Arena, clause: &Clause, x: TermId, y: TermId, x_fixed: bool) -> bool {
    let literals = clause.literals();
    let subsumes = |a: LitId, b: LitId| {
        substitutions(x, y, false)
            .into_iter()
            .any(|image| apply(arena, a, x, y, image) == Some(b))
    };
    let y_to_x = |l: LitId| apply(arena, l, x, y, [x, x]);

    for (i, &a) in literals.iter().enumerate() {
        for &b in &literals[i + 1..] {
            let (la, lb) = (arena.lit(a), arena.lit(b));
            if la.predicate != lb.predicate || la.negated != lb.negated {
                continue;
            }
            let reducible = if x_fixed {
                a == b || y_to_x(a) == Some(b) || y_to_x(b) == Some(a)
            } else {
                subsumes(a, b) || subsumes(b, a)
            };
            if reducible {
                return true;
            }
        }
    }
    false
}

/// Can the clause be shortened without changing its meaning, judged by θ-subsumption?
///
/// Counting and single-variable clauses are never reducible.
pub fn is_theta_reducible(arena: &Arena, clause: &Clause) -> bool {
    let Some(&q) = clause.quantifier() else {
        return false;
    };
    if q.is_counting() || q.used_variables() == 1 {
        return false;
    }
    let Some(y) = q.second_variable() else {
        return false;
    };
    let x = q.first_variable();
    let disjunction = |x_fixed| is_reducible_disjunction(arena, clause, x, y, x_fixed);
    let conjunction = |x_fixed| is_reducible_conjunction(arena, clause, x, y, x_fixed);

    match q.kind() {
        QuantifierKind::ForallForall => disjunction(false),
        QuantifierKind::ForallExists if clause.is_decomposable() => conjunction(true) || disjunction(true),
        QuantifierKind::ForallExists => conjunction(true),
        QuantifierKind::ExistsForall if clause.is_decomposable() => conjunction(true) || disjunction(true),
        QuantifierKind::ExistsForall => disjunction(true),
        QuantifierKind::ExistsExists => conjunction(false),
        QuantifierKind::Forall | QuantifierKind::Exists => false,
    }
}

// ---- sentence filters ----------------------------------------------------------------

/// Asks the oracle whether the non-counting part of the sentence is contradictory.
pub fn is_contradiction(arena: &Arena, pool: &ClausePool, sentence: &Sentence, oracle: &dyn Oracle) -> Result<bool> {
    let lines: Vec<String> = sentence.resolve(pool).filter_map(|c| c.to_prover9(arena)).collect();
    if lines.is_empty() {
        return Ok(false);
    }
    oracle.is_provable(&lines.join("\n"))
}

/// Does some binary predicate occur only with both arguments equal?
///
/// Such a sentence is equivalent to one over a unary predicate, so it is hidden from the
/// output. Sentences with fewer than two literals are never hidden.
pub fn has_reflexive_only_atoms(arena: &Arena, pool: &ClausePool, sentence: &Sentence) -> bool {
    if sentence.literal_count(pool) < 2 {
        return false;
    }
    let literals: Vec<LitId> = sentence
        .resolve(pool)
        .flat_map(|c| c.literals().iter().copied())
        .collect();
    let binary: Vec<PredId> = sentence
        .predicates(pool)
        .into_iter()
        .filter(|&p| arena.pred(p).arity == 2)
        .collect();
    binary.iter().any(|&p| {
        !literals.iter().any(|&l| {
            let lit = arena.lit(l);
            lit.predicate == p && lit.args[0] != lit.args[1]
        })
    })
}

// ---- joining filters -----------------------------------------------------------------

/// Filters deciding whether a pooled clause may extend a sentence.
pub struct JoinFilters<'a> {
    pool: &'a ClausePool,
    vocabulary: &'a Vocabulary,
    forbidden: &'a ForbiddenTable,
    config: &'a SearchConfig,
}

impl<'a> JoinFilters<'a> {
    pub fn new(
        pool: &'a ClausePool,
        vocabulary: &'a Vocabulary,
        forbidden: &'a ForbiddenTable,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            pool,
            vocabulary,
            forbidden,
            config,
        }
    }

    /// Runs every enabled joining filter, in order, on `alpha ∧ beta`.
    pub fn accept(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        let verdicts: [(&str, &dyn Fn() -> bool); 9] = [
            ("DisjunctiveClauses", &|| self.disjunctive(alpha, beta)),
            ("LanguageBias", &|| !self.config.language_bias || self.language_bias(alpha, beta)),
            ("MaxClauses", &|| alpha.len() < self.config.max_clauses),
            ("MaxOverallLiterals", &|| {
                alpha.literal_count(self.pool) + self.pool[beta].len() <= self.config.max_overall_literals()
            }),
            ("MaxCountingClauses", &|| {
                alpha.counting_clauses(self.pool) + usize::from(self.pool[beta].is_counting())
                    <= self.config.max_counting_clauses
            }),
            ("ConnectedComponents", &|| {
                !self.config.decomposable_components || self.connected(alpha, beta)
            }),
            ("TrivialConstraints", &|| {
                !self.config.trivial_constraints || self.non_trivial(alpha, beta)
            }),
            ("QuantifiersReducibility", &|| {
                !self.config.quantifiers_reducibility || self.two_formulae(alpha, beta)
            }),
            ("QuantifiersReducibilityNTuple", &|| {
                !self.config.quantifiers_reducibility || self.config.max_clauses <= 2 || self.decomposable(alpha, beta)
            }),
        ];
        for (name, check) in verdicts {
            if !check() {
                trace!("{}: {:?} + {}", name, alpha.clauses(), beta);
                return false;
            }
        }
        true
    }

    fn disjunctive(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        let b = &self.pool[beta];
        alpha.clauses().iter().all(|&a| {
            if a == beta {
                return false;
            }
            let a = &self.pool[a];
            let same_swappable = match (a.quantifier(), b.quantifier()) {
                (Some(qa), Some(qb)) => qa == qb && qa.is_swappable(),
                _ => false,
            };
            !(same_swappable && a.literals() == b.mirrored_literals())
        })
    }

    fn language_bias(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        let present = alpha.predicates(self.pool);
        let incoming = self.pool[beta].predicates();
        incoming.iter().all(|&p| self.can_follow(p, &present, incoming))
    }

    fn can_follow(&self, p: PredId, present: &[PredId], incoming: &[PredId]) -> bool {
        if present.contains(&p) {
            return true;
        }
        match self.vocabulary.predecessor(p) {
            None => true,
            Some(q) if present.contains(&q) => true,
            Some(q) => incoming.contains(&q) && self.can_follow(q, present, incoming),
        }
    }

    fn connected(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        if alpha.is_empty() {
            return true;
        }
        let present = alpha.predicates(self.pool);
        self.pool[beta].predicates().iter().any(|p| present.contains(p))
    }

    fn non_trivial(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        !self.pool[beta].is_cliffhanger() && !alpha.resolve(self.pool).any(Clause::is_cliffhanger)
    }

    fn two_formulae(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        !alpha.clauses().iter().any(|&a| self.forbidden.is_forbidden_pair(a, beta))
    }

    /// Rejects `beta` when it completes a decomposition triple with two clauses of `alpha`.
    fn decomposable(&self, alpha: &Sentence, beta: ClauseId) -> bool {
        let length = self.pool[beta].len();
        if length < 2 {
            return true;
        }
        let shorter: Vec<ClauseId> = alpha
            .clauses()
            .iter()
            .copied()
            .filter(|&c| self.pool[c].len() < length)
            .collect();
        let longer: Vec<ClauseId> = alpha
            .clauses()
            .iter()
            .copied()
            .filter(|&c| self.pool[c].len() > length)
            .collect();

        for (i, &c1) in shorter.iter().enumerate() {
            for &c2 in &shorter[i + 1..] {
                if self.pool[c1].len() + self.pool[c2].len() <= length
                    && self.forbidden.is_forbidden_triple(c1, c2, beta)
                {
                    return false;
                }
            }
        }

        for &whole in &longer {
            let budget = self.pool[whole].len() - length;
            for &c in alpha.clauses() {
                if self.pool[c].len() <= budget && self.forbidden.is_forbidden_triple(c, beta, whole) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use test_log::test;

    use super::*;
    use crate::lattice::QuantifierLattice;
    use crate::parser::parse_quantified;

    struct Recording {
        answer: bool,
        inputs: Mutex<Vec<String>>,
    }

    impl Oracle for Recording {
        fn is_provable(&self, formulas: &str) -> Result<bool> {
            self.inputs.lock().unwrap().push(formulas.to_string());
            Ok(self.answer)
        }
    }

    fn recording(answer: bool) -> Recording {
        Recording {
            answer,
            inputs: Mutex::new(Vec::new()),
        }
    }

    fn clause(arena: &mut Arena, text: &str) -> Clause {
        parse_quantified(arena, text).unwrap()
    }

    fn arena() -> Arena {
        let mut arena = Arena::new();
        Vocabulary::new(&mut arena, 2, 2);
        arena
    }

    #[test]
    fn test_naive_tautology() {
        let mut arena = arena();
        let c = clause(&mut arena, "V x U0(x) | ~U0(x)");
        assert!(is_naive_tautology(&arena, &c));
        let c = clause(&mut arena, "V x V y B0(x, y) | ~B0(y, x)");
        assert!(!is_naive_tautology(&arena, &c));
    }

    #[test]
    fn test_prover_tautology_input() {
        let mut arena = arena();
        let c = clause(&mut arena, "V x U0(x) | U1(x)");
        let oracle = recording(true);
        assert!(is_tautology(&arena, &c, &oracle).unwrap());
        assert_eq!(oracle.inputs.lock().unwrap()[0], "-(all x (U0(x) | U1(x))).");

        let counting = clause(&mut arena, "E=1 x U0(x)");
        assert!(!is_tautology(&arena, &counting, &oracle).unwrap());
        assert_eq!(oracle.inputs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_clause_filters() {
        let mut arena = arena();
        let config = SearchConfig {
            max_literals_per_clause: 2,
            ..Default::default()
        };
        let ok = clause(&mut arena, "V x U0(x) | U1(x)");
        let long = clause(&mut arena, "V x U0(x) | U1(x) | B0(x, x)");
        let counting = clause(&mut arena, "E=1 x U0(x) | U1(x)");
        let taut = clause(&mut arena, "E x U0(x) | ~U0(x)");
        let filters = ClauseFilters::new(&arena, &config, None);
        assert!(filters.accept(&ok).unwrap());
        assert!(!filters.accept(&long).unwrap());
        assert!(!filters.accept(&counting).unwrap());
        assert!(!filters.accept(&taut).unwrap());

        let oracle = recording(true);
        let filters = ClauseFilters::new(&arena, &config, Some(&oracle));
        assert!(!filters.accept(&ok).unwrap());
    }

    #[test]
    fn test_theta_forall_forall() {
        let mut arena = arena();
        // B0(x, x) is an instance of B0(x, y)
        let c = clause(&mut arena, "V x V y B0(x, y) | B0(x, x)");
        assert!(is_theta_reducible(&arena, &c));
        let c = clause(&mut arena, "V x V y B0(x, y) | ~B0(y, x)");
        assert!(!is_theta_reducible(&arena, &c));
        let c = clause(&mut arena, "V x V y U0(x) | U0(y)");
        assert!(is_theta_reducible(&arena, &c));
    }

    #[test]
    fn test_theta_forall_exists() {
        let mut arena = arena();
        // ∀x∃y (B0(x, y) | B0(x, x)): the second literal is the first with y := x
        let c = clause(&mut arena, "V x E y B0(x, y) | B0(x, x)");
        assert!(is_theta_reducible(&arena, &c));
        let c = clause(&mut arena, "V x E y B0(x, y) | ~B0(y, x)");
        assert!(!is_theta_reducible(&arena, &c));
    }

    #[test]
    fn test_theta_exists_exists() {
        let mut arena = arena();
        let c = clause(&mut arena, "E x E y B0(x, y) | B0(y, x)");
        assert!(is_theta_reducible(&arena, &c));
        let c = clause(&mut arena, "E x E y B0(x, y) | ~B0(y, x)");
        assert!(!is_theta_reducible(&arena, &c));
    }

    #[test]
    fn test_theta_skips_counting_and_single() {
        let mut arena = arena();
        let c = clause(&mut arena, "V x E=1 y B0(x, y) | B0(x, x)");
        assert!(!is_theta_reducible(&arena, &c));
        let c = clause(&mut arena, "V x U0(x) | B0(x, x)");
        assert!(!is_theta_reducible(&arena, &c));
    }

    fn setup(texts: &[&str]) -> (Arena, Vocabulary, ClausePool) {
        let mut arena = Arena::new();
        let vocabulary = Vocabulary::new(&mut arena, 2, 2);
        let clauses: Vec<Clause> = texts.iter().map(|t| parse_quantified(&mut arena, t).unwrap()).collect();
        (arena, vocabulary, ClausePool::new(clauses))
    }

    #[test]
    fn test_contradiction() {
        let (arena, _, pool) = setup(&["V x U0(x)", "E x ~U0(x)", "E=1 x U1(x)"]);
        let ids: Vec<ClauseId> = pool.ids().collect();
        let oracle = recording(true);
        assert!(is_contradiction(&arena, &pool, &Sentence::new(ids), &oracle).unwrap());
        let input = oracle.inputs.lock().unwrap()[0].clone();
        assert_eq!(input.lines().count(), 2);

        let counting_only = Sentence::single(pool.find("(E=1 x U1(x))").unwrap());
        assert!(!is_contradiction(&arena, &pool, &counting_only, &oracle).unwrap());
    }

    #[test]
    fn test_reflexive_atoms() {
        let (arena, _, pool) = setup(&["V x B0(x, x) | U0(x)", "V x V y B0(x, y)", "V x B0(x, x)"]);
        let reflexive = Sentence::single(pool.find("(V x B0(x, x) | U0(x))").unwrap());
        assert!(has_reflexive_only_atoms(&arena, &pool, &reflexive));
        let single = Sentence::single(pool.find("(V x B0(x, x))").unwrap());
        assert!(!has_reflexive_only_atoms(&arena, &pool, &single));
        let mixed = reflexive.extend(pool.find("(V x V y B0(x, y))").unwrap());
        assert!(!has_reflexive_only_atoms(&arena, &pool, &mixed));
    }

    fn join_setup(texts: &[&str], config: &SearchConfig) -> (Arena, Vocabulary, ClausePool, ForbiddenTable) {
        let (arena, vocabulary, pool) = setup(texts);
        let lattice = QuantifierLattice::new(&arena, true, 1, true, false);
        let forbidden = ForbiddenTable::precompute(&arena, &lattice, &pool, config.triples()).unwrap();
        (arena, vocabulary, pool, forbidden)
    }

    #[test]
    fn test_join_basic_limits() {
        let config = SearchConfig {
            max_clauses: 2,
            ..Default::default()
        };
        let (_, vocabulary, pool, forbidden) =
            join_setup(&["V x U0(x) | U1(x)", "E x U0(x) | B0(x, x)", "E x ~U0(x)"], &config);
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        let a = pool.find("(V x U0(x) | U1(x))").unwrap();
        let b = pool.find("(E x B0(x, x) | U0(x))").unwrap();
        let c = pool.find("(E x ~U0(x))").unwrap();
        let alpha = Sentence::single(a);
        assert!(!filters.accept(&alpha, a));
        assert!(filters.accept(&alpha, b));
        assert!(!filters.accept(&alpha.extend(b), c));
    }

    #[test]
    fn test_join_language_bias() {
        let config = SearchConfig::default();
        let (_, vocabulary, pool, forbidden) = join_setup(&["E x U0(x) | U1(x)", "E x U1(x) | ~U0(x)", "V x U1(x) | B0(x, x)"], &config);
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        let u01 = pool.find("(E x U0(x) | U1(x))").unwrap();
        let u1b = pool.find("(V x B0(x, x) | U1(x))").unwrap();
        // U1 needs U0, which `beta` itself does not bring
        assert!(!filters.accept(&Sentence::default(), u1b));
        assert!(filters.accept(&Sentence::single(u01), u1b));
    }

    #[test]
    fn test_join_connected_and_trivial() {
        let config = SearchConfig::default();
        let (_, vocabulary, pool, forbidden) =
            join_setup(&["E x U0(x) | B0(x, x)", "E x V y B0(x, y)", "V x V y B0(x, y)", "E x U1(x)"], &config);
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        let ub = Sentence::single(pool.find("(E x B0(x, x) | U0(x))").unwrap());
        let b = pool.find("(E x V y B0(x, y))").unwrap();
        let cliff = pool.find("(V x V y B0(x, y))").unwrap();
        let apart = pool.find("(E x U1(x))").unwrap();
        assert!(!filters.accept(&Sentence::single(b), apart));
        assert!(filters.accept(&ub, b));
        assert!(!filters.accept(&ub, cliff));

        let config = SearchConfig {
            trivial_constraints: false,
            ..Default::default()
        };
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        assert!(filters.accept(&ub, cliff));
    }

    #[test]
    fn test_join_forbidden_pair() {
        let config = SearchConfig {
            trivial_constraints: false,
            ..Default::default()
        };
        let (_, vocabulary, pool, forbidden) = join_setup(&["V x V y B0(x, y) | ~B0(y, x)", "V x V y B0(x, y)"], &config);
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        let a = pool.find("(V x V y B0(x, y))").unwrap();
        let b = pool.ids().find(|&id| id != a).unwrap();
        assert!(!filters.accept(&Sentence::single(a), b));

        let config = SearchConfig {
            trivial_constraints: false,
            quantifiers_reducibility: false,
            ..Default::default()
        };
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        assert!(filters.accept(&Sentence::single(a), b));
    }

    #[test]
    fn test_join_forbidden_triple() {
        let config = SearchConfig {
            trivial_constraints: false,
            ..Default::default()
        };
        let (_, vocabulary, pool, forbidden) =
            join_setup(&["V x V y U0(x) | U1(y)", "V x U0(x)", "V x U1(x)"], &config);
        let filters = JoinFilters::new(&pool, &vocabulary, &forbidden, &config);
        let whole = pool.find("(V x V y U0(x) | U1(y))").unwrap();
        let u0 = pool.find("(V x U0(x))").unwrap();
        let u1 = pool.find("(V x U1(x))").unwrap();
        let pair = Sentence::new(vec![u0, u1]);
        assert!(!filters.accept(&pair, whole));
        // the pair table alone already rejects `whole` next to `u0`, so probe the triple check directly
        assert!(!filters.decomposable(&pair, whole));
        assert!(filters.decomposable(&Sentence::single(u0), whole));
    }
}
