//! The candidate clause pool, indexed by dense ids.
use std::collections::HashMap;
use std::ops::Index;

use crate::clause::Clause;
use crate::types::ClauseId;

#[derive(Debug, Default)]
pub struct ClausePool {
    clauses: Vec<Clause>,
    index: HashMap<String, ClauseId>,
}

impl ClausePool {
    /// Builds the pool, ordering clauses by canonical string.
    ///
    /// Clauses sharing a canonical string are kept once.
    pub fn new(clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut clauses: Vec<Clause> = clauses.into_iter().collect();
        clauses.sort_by(|a, b| a.canonical().cmp(b.canonical()));
        clauses.dedup_by(|a, b| a.canonical() == b.canonical());
        let index = clauses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.canonical().to_string(), ClauseId::new(i)))
            .collect();
        Self { clauses, index }
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn get(&self, id: ClauseId) -> &Clause {
        &self.clauses[id.index()]
    }

    /// Looks a clause up by its canonical string.
    pub fn find(&self, canonical: &str) -> Option<ClauseId> {
        self.index.get(canonical).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        (0..self.clauses.len()).map(ClauseId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &Clause)> + '_ {
        self.clauses.iter().enumerate().map(|(i, c)| (ClauseId::new(i), c))
    }
}

impl Index<ClauseId> for ClausePool {
    type Output = Clause;

    fn index(&self, id: ClauseId) -> &Clause {
        self.get(id)
    }
}
