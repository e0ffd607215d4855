//! The fixed predicate vocabulary and the literals over the canonical variables.
use crate::arena::Arena;
use crate::types::{LitId, PredId, TermId};
use crate::utils::cartesian;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    unary: Vec<PredId>,
    binary: Vec<PredId>,
    literals: Vec<LitId>,
}

impl Vocabulary {
    /// Creates `U0..` unary and `B0..` binary predicates and interns every literal over
    /// `{x, y}` with both signs.
    pub fn new(arena: &mut Arena, unary: usize, binary: usize) -> Self {
        let unary: Vec<PredId> = (0..unary).map(|i| arena.predicate(&format!("U{}", i), 1)).collect();
        let binary: Vec<PredId> = (0..binary).map(|i| arena.predicate(&format!("B{}", i), 2)).collect();
        let vars: Vec<TermId> = vec![arena.x(), arena.y()];

        let mut literals = Vec::new();
        for &p in unary.iter().chain(&binary) {
            let arity = arena.pred(p).arity;
            let tuples = cartesian(&vec![vars.clone(); arity]);
            for args in tuples {
                for negated in [false, true] {
                    literals.push(arena.literal(p, args.clone(), negated));
                }
            }
        }
        literals.sort_by(|&a, &b| arena.display(a).cmp(arena.display(b)));

        Self {
            unary,
            binary,
            literals,
        }
    }

    pub fn unary(&self) -> &[PredId] {
        &self.unary
    }

    pub fn binary(&self) -> &[PredId] {
        &self.binary
    }

    /// Predicates of the given arity (1 or 2).
    pub fn predicates(&self, arity: usize) -> &[PredId] {
        match arity {
            1 => &self.unary,
            2 => &self.binary,
            _ => &[],
        }
    }

    /// All literals, sorted by rendering.
    pub fn literals(&self) -> &[LitId] {
        &self.literals
    }

    /// The predicate that must already be present before `p` may be introduced:
    /// `U1` needs `U0`, `B2` needs `B1`, and so on.
    pub fn predecessor(&self, p: PredId) -> Option<PredId> {
        [&self.unary, &self.binary].into_iter().find_map(|list| {
            let i = list.iter().position(|&q| q == p)?;
            i.checked_sub(1).map(|j| list[j])
        })
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_literals() {
        let mut arena = Arena::new();
        let vocab = Vocabulary::new(&mut arena, 1, 1);
        // U0: 2 tuples, B0: 4 tuples, both signs
        assert_eq!(vocab.literals().len(), 12);
        let shown: Vec<&str> = vocab.literals().iter().map(|&l| arena.display(l)).collect();
        assert_eq!(shown[0], "B0(x, x)");
        assert_eq!(shown[11], "~U0(y)");
        let mut sorted = shown.clone();
        sorted.sort();
        assert_eq!(shown, sorted);
    }

    #[test]
    fn test_predecessor() {
        let mut arena = Arena::new();
        let vocab = Vocabulary::new(&mut arena, 2, 2);
        let (u0, u1) = (vocab.unary()[0], vocab.unary()[1]);
        let (b0, b1) = (vocab.binary()[0], vocab.binary()[1]);
        assert_eq!(vocab.predecessor(u0), None);
        assert_eq!(vocab.predecessor(u1), Some(u0));
        assert_eq!(vocab.predecessor(b1), Some(b0));
        assert_eq!(vocab.predecessor(b0), None);
        assert_eq!(vocab.predicates(2), &[b0, b1]);
    }
}
