//! Quantifier prefixes of the two-variable fragment, optionally with counting.
use std::fmt;

use crate::arena::Arena;
use crate::types::TermId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum QuantifierKind {
    Forall,
    Exists,
    ForallForall,
    ForallExists,
    ExistsForall,
    ExistsExists,
}

impl QuantifierKind {
    pub const ALL: [QuantifierKind; 6] = [
        QuantifierKind::Forall,
        QuantifierKind::Exists,
        QuantifierKind::ForallForall,
        QuantifierKind::ForallExists,
        QuantifierKind::ExistsForall,
        QuantifierKind::ExistsExists,
    ];

    /// Number of variables bound by this kind (1 or 2).
    pub fn arity(self) -> usize {
        match self {
            QuantifierKind::Forall | QuantifierKind::Exists => 1,
            _ => 2,
        }
    }

    /// Is the variable at `position` existentially bound?
    pub fn is_existential(self, position: usize) -> bool {
        use QuantifierKind::*;
        match (self, position) {
            (Exists, 0) | (ExistsForall, 0) | (ExistsExists, 0) => true,
            (ForallExists, 1) | (ExistsExists, 1) => true,
            _ => false,
        }
    }

    pub fn starts_with_forall(self) -> bool {
        matches!(
            self,
            QuantifierKind::Forall | QuantifierKind::ForallForall | QuantifierKind::ForallExists
        )
    }

    /// Kind with the two positions exchanged.
    pub fn mirror(self) -> Self {
        match self {
            QuantifierKind::ForallExists => QuantifierKind::ExistsForall,
            QuantifierKind::ExistsForall => QuantifierKind::ForallExists,
            other => other,
        }
    }

    /// Parses the two-letter form built from `V` / `E` tokens.
    pub fn from_tokens(tokens: &[bool]) -> Option<Self> {
        // `true` stands for a universal token.
        match tokens {
            [true] => Some(QuantifierKind::Forall),
            [false] => Some(QuantifierKind::Exists),
            [true, true] => Some(QuantifierKind::ForallForall),
            [true, false] => Some(QuantifierKind::ForallExists),
            [false, true] => Some(QuantifierKind::ExistsForall),
            [false, false] => Some(QuantifierKind::ExistsExists),
            _ => None,
        }
    }
}

/// A quantifier prefix: kind, bound variables, and optional cardinality bounds.
///
/// # Invariants
///
/// - A cardinality bound is only set on an existential position.
/// - Single-variable kinds store their variable twice and never carry a second bound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Quantifier {
    kind: QuantifierKind,
    vars: [TermId; 2],
    first: Option<u32>,
    second: Option<u32>,
}

impl Quantifier {
    /// Checks the cardinality invariant for a kind.
    pub fn is_valid(kind: QuantifierKind, first: Option<u32>, second: Option<u32>) -> bool {
        (first.is_none() || kind.is_existential(0))
            && (second.is_none() || (kind.arity() == 2 && kind.is_existential(1)))
    }

    /// # Panics
    ///
    /// Panics if a bound sits on a universal position, or the variables coincide for a
    /// two-variable kind.
    pub fn new(kind: QuantifierKind, vars: [TermId; 2], first: Option<u32>, second: Option<u32>) -> Self {
        assert!(
            Self::is_valid(kind, first, second),
            "Cardinality bound on a universal position: {:?} {:?} {:?}",
            kind,
            first,
            second
        );
        let vars = if kind.arity() == 1 {
            [vars[0], vars[0]]
        } else {
            assert_ne!(vars[0], vars[1], "Two-variable quantifier needs distinct variables");
            vars
        };
        Self {
            kind,
            vars,
            first,
            second,
        }
    }

    pub fn single(kind: QuantifierKind, var: TermId, card: Option<u32>) -> Self {
        Self::new(kind, [var, var], card, None)
    }

    pub fn kind(&self) -> QuantifierKind {
        self.kind
    }
    pub fn first(&self) -> Option<u32> {
        self.first
    }
    pub fn second(&self) -> Option<u32> {
        self.second
    }

    pub fn is_counting(&self) -> bool {
        self.first.is_some() || self.second.is_some()
    }

    pub fn used_variables(&self) -> usize {
        self.kind.arity()
    }

    /// Bound variables, in prefix order.
    pub fn variables(&self) -> &[TermId] {
        &self.vars[..self.kind.arity()]
    }

    pub fn first_variable(&self) -> TermId {
        self.vars[0]
    }

    pub fn second_variable(&self) -> Option<TermId> {
        (self.kind.arity() == 2).then_some(self.vars[1])
    }

    pub fn starts_with_forall(&self) -> bool {
        self.kind.starts_with_forall()
    }

    /// The same prefix read with the two positions exchanged.
    ///
    /// Variables keep their order, only the kinds and the bounds swap places.
    ///
    /// # Panics
    ///
    /// Panics for single-variable kinds.
    pub fn mirror(&self) -> Self {
        assert_eq!(self.kind.arity(), 2, "Mirror of a single-variable quantifier");
        Self {
            kind: self.kind.mirror(),
            vars: self.vars,
            first: self.second,
            second: self.first,
        }
    }

    /// `∀∀` or `∃∃` with equal bounds.
    pub fn is_swappable(&self) -> bool {
        matches!(self.kind, QuantifierKind::ForallForall | QuantifierKind::ExistsExists)
            && self.first == self.second
    }

    /// Renders the prefix, e.g. `V x E=1 y`.
    pub fn prefix(&self, arena: &Arena) -> String {
        let part = |existential: bool, card: Option<u32>, var: TermId| {
            let name = arena.term(var).name();
            match (existential, card) {
                (false, _) => format!("V {}", name),
                (true, None) => format!("E {}", name),
                (true, Some(k)) => format!("E={} {}", k, name),
            }
        };
        let mut s = part(self.kind.is_existential(0), self.first, self.vars[0]);
        if self.kind.arity() == 2 {
            s.push(' ');
            s.push_str(&part(self.kind.is_existential(1), self.second, self.vars[1]));
        }
        s
    }

    /// Short identifier used in reports, e.g. `Forallexists1`.
    pub fn name(&self) -> String {
        let word = |existential: bool, card: Option<u32>| match (existential, card) {
            (false, _) => "forall".to_string(),
            (true, None) => "exists".to_string(),
            (true, Some(k)) => format!("exists{}", k),
        };
        let mut s = word(self.kind.is_existential(0), self.first);
        if self.kind.arity() == 2 {
            s.push_str(&word(self.kind.is_existential(1), self.second));
        }
        let mut chars = s.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => s,
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
