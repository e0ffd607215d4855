//! Search configuration.
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sentence::SymmetryFlags;

/// How sentences with isomorphic cell graphs are detected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CellGraphStrategy {
    /// Compare canonical cell-graph strings.
    #[default]
    Canonical,
    /// Keep one representative per class and test structural isomorphism.
    Isomorphic,
}

/// Configuration for [`Search`][crate::search::Search].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Literal budget per sentence (default: `max_clauses * max_literals_per_clause`)
    pub max_overall_literals: Option<usize>,
    /// Maximal number of clauses per sentence (default: 3)
    pub max_clauses: usize,
    /// Maximal number of literals per clause (default: 3)
    pub max_literals_per_clause: usize,
    /// Number of unary predicates (default: 1)
    pub unary: usize,
    /// Number of binary predicates (default: 1)
    pub binary: usize,
    /// Whether existential quantifiers are allowed (default: true)
    pub quantifiers: bool,
    /// Largest cardinality of a counting quantifier (default: 1)
    pub max_k: u32,
    /// Maximal number of counting clauses per sentence (default: 1)
    pub max_counting_clauses: usize,
    /// Maximal number of literals per counting clause (default: 1)
    pub max_literals_per_counting_clause: usize,
    /// Whether `∃=k x ∃=j y` prefixes are generated (default: false)
    pub double_counting_exists: bool,
    /// Require every new clause to share a predicate with the sentence (default: true)
    pub decomposable_components: bool,
    /// Identify sentences up to predicate renaming (default: true)
    pub isomorphic_sentences: bool,
    /// Identify sentences up to predicate complement (default: true)
    pub negations: bool,
    /// Identify sentences up to transposing binary predicates (default: true)
    pub permuting_arguments: bool,
    /// Drop clauses reducible by θ-subsumption (default: true)
    pub subsumption: bool,
    /// Reject sentences containing trivial single-literal constraints (default: true)
    pub trivial_constraints: bool,
    /// Reject redundant pairs and decomposition triples (default: true)
    pub quantifiers_reducibility: bool,
    /// Introduce predicates in vocabulary order only (default: true)
    pub language_bias: bool,
    /// Drop clauses containing a literal and its negation (default: true)
    pub naive_tautology: bool,
    /// Drop clauses the prover shows to be tautologies (default: true)
    pub tautology_filter: bool,
    /// Drop sentences the prover shows to be contradictory (default: true)
    pub contradiction_filter: bool,
    /// Hide sentences using a binary predicate only reflexively (default: true)
    pub reflexive_atoms: bool,
    /// Path of the Prover9 binary (default: "prover9")
    pub prover9: PathBuf,
    /// Prover9 time limit in seconds (default: 30)
    pub prover9_seconds: u32,
    /// Julia script computing cell graphs; cell-graph deduplication is off without it (default: none)
    pub cell_graph_script: Option<PathBuf>,
    /// Cell-graph deduplication strategy (default: canonical)
    pub cell_graph_strategy: CellGraphStrategy,
    /// Threads passed to Julia (default: 1)
    pub julia_threads: usize,
    /// Per-batch cell-graph time limit in seconds (default: 3600)
    pub cell_time_limit: u64,
    /// Wall-clock limit for the whole search, checked between levels (default: none)
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_overall_literals: None,
            max_clauses: 3,
            max_literals_per_clause: 3,
            unary: 1,
            binary: 1,
            quantifiers: true,
            max_k: 1,
            max_counting_clauses: 1,
            max_literals_per_counting_clause: 1,
            double_counting_exists: false,
            decomposable_components: true,
            isomorphic_sentences: true,
            negations: true,
            permuting_arguments: true,
            subsumption: true,
            trivial_constraints: true,
            quantifiers_reducibility: true,
            language_bias: true,
            naive_tautology: true,
            tautology_filter: true,
            contradiction_filter: true,
            reflexive_atoms: true,
            prover9: PathBuf::from("prover9"),
            prover9_seconds: 30,
            cell_graph_script: None,
            cell_graph_strategy: CellGraphStrategy::Canonical,
            julia_threads: 1,
            cell_time_limit: 3600,
            time_limit: None,
        }
    }
}

impl SearchConfig {
    pub fn max_overall_literals(&self) -> usize {
        self.max_overall_literals
            .unwrap_or(self.max_clauses * self.max_literals_per_clause)
    }

    /// Counting quantifiers need a positive cardinality and room for counting clauses.
    pub fn counting(&self) -> bool {
        self.max_k > 0 && self.max_counting_clauses > 0 && self.max_literals_per_counting_clause > 0
    }

    /// Decomposition triples only matter for sentences of three clauses with long clauses.
    pub fn triples(&self) -> bool {
        self.max_clauses > 2 && self.max_literals_per_clause > 1
    }

    /// Does any filter need the theorem prover?
    pub fn needs_prover(&self) -> bool {
        self.tautology_filter || self.contradiction_filter
    }

    pub fn symmetry_flags(&self) -> SymmetryFlags {
        SymmetryFlags {
            predicates: self.isomorphic_sentences,
            negations: self.negations,
            arguments: self.permuting_arguments,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_clauses == 0 {
            return Err(Error::Config("max_clauses must be positive".to_string()));
        }
        if self.max_literals_per_clause == 0 {
            return Err(Error::Config("max_literals_per_clause must be positive".to_string()));
        }
        if self.max_overall_literals == Some(0) {
            return Err(Error::Config("max_overall_literals must be positive".to_string()));
        }
        if self.unary + self.binary == 0 {
            return Err(Error::Config("the vocabulary has no predicates".to_string()));
        }
        if self.unary > 26 || self.binary > 26 {
            return Err(Error::Config(format!(
                "vocabulary of {} unary and {} binary predicates is too large",
                self.unary, self.binary
            )));
        }
        if self.cell_graph_script.is_some() && self.julia_threads == 0 {
            return Err(Error::Config("julia_threads must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_overall_literals(), 9);
        assert!(config.counting());
        assert!(config.triples());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_counting_requires_all_three() {
        let config = SearchConfig {
            max_literals_per_counting_clause: 0,
            ..Default::default()
        };
        assert!(!config.counting());
        let config = SearchConfig {
            max_k: 0,
            ..Default::default()
        };
        assert!(!config.counting());
    }

    #[test]
    fn test_validate() {
        let config = SearchConfig {
            max_clauses: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = SearchConfig {
            unary: 0,
            binary: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = SearchConfig {
            max_overall_literals: Some(4),
            ..Default::default()
        };
        assert_eq!(config.max_overall_literals(), 4);
    }
}
