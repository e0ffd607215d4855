//! Level-wise sentence search.
//!
//! Level `L` holds the sentences with exactly `L` literals. It is built by appending a
//! pooled clause of `L - s` literals to every sentence of level `s`, plus the
//! single-clause sentences of `L` literals. Every candidate then goes through
//!
//! 1. the joining filters (while appending),
//! 2. the contradiction filter (drops the sentence),
//! 3. deduplication by ultra-canonical form,
//! 4. the hiding filters: reflexive atoms and cell-graph equivalence.
//!
//! Hidden sentences are not reported but stay available for extension.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::arena::Arena;
use crate::config::{CellGraphStrategy, SearchConfig};
use crate::dedup::{CanonicalFilter, CellGraphFilter, CellGraphResolver, IsomorphicFilter};
use crate::error::Result;
use crate::filters::{has_reflexive_only_atoms, is_contradiction, is_theta_reducible, ClauseFilters, JoinFilters};
use crate::forbidden::ForbiddenTable;
use crate::lattice::QuantifierLattice;
use crate::oracle::{Oracle, Prover9};
use crate::pool::ClausePool;
use crate::refinement::Refiner;
use crate::sentence::{Sentence, Symmetries};
use crate::source::JuliaCellGraphs;
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::ClauseId;
use crate::vocabulary::Vocabulary;

/// Reported sentences of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub literals: usize,
    /// Ultra-canonical forms of the visible sentences, sorted.
    pub sentences: Vec<String>,
    /// Sentences kept for extension, hidden ones included.
    pub kept: usize,
}

/// Everything a finished search reports.
#[derive(Debug, Clone, Default)]
pub struct SearchOutput {
    pub clauses: usize,
    pub levels: Vec<Level>,
    /// Did the time limit stop the search early?
    pub timed_out: bool,
}

impl SearchOutput {
    pub fn sentences(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().flat_map(|l| l.sentences.iter().map(String::as_str))
    }
}

pub struct Search {
    config: SearchConfig,
    oracle: Option<Box<dyn Oracle>>,
    cell_graphs: Option<Box<dyn CellGraphFilter>>,
}

struct Candidate {
    sentence: Sentence,
    key: String,
}

impl Search {
    /// A search without external tools; add them with [`Search::with_oracle`] and
    /// [`Search::with_cell_graphs`].
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle: None,
            cell_graphs: None,
        })
    }

    /// A search wired to Prover9 and, if a script is configured, to Julia cell graphs
    /// cached in `store`.
    pub fn from_config(config: SearchConfig, store: Option<Arc<dyn KeyValueStore>>) -> Result<Self> {
        let oracle: Option<Box<dyn Oracle>> = config
            .needs_prover()
            .then(|| Box::new(Prover9::new(&config.prover9, config.prover9_seconds)) as Box<dyn Oracle>);
        let cell_graphs = config.cell_graph_script.as_ref().map(|script| {
            let source = JuliaCellGraphs::new(script, config.julia_threads, config.cell_time_limit);
            let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
            let resolver = CellGraphResolver::new(Box::new(source), store);
            match config.cell_graph_strategy {
                CellGraphStrategy::Canonical => Box::new(CanonicalFilter::new(resolver)) as Box<dyn CellGraphFilter>,
                CellGraphStrategy::Isomorphic => Box::new(IsomorphicFilter::new(resolver)),
            }
        });
        let mut search = Self::new(config)?;
        search.oracle = oracle;
        search.cell_graphs = cell_graphs;
        Ok(search)
    }

    pub fn with_oracle(mut self, oracle: Box<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_cell_graphs(mut self, filter: Box<dyn CellGraphFilter>) -> Self {
        self.cell_graphs = Some(filter);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn run(&mut self) -> Result<SearchOutput> {
        let start = Instant::now();
        let Self {
            config,
            oracle,
            cell_graphs,
        } = self;
        let config: &SearchConfig = config;
        let oracle = oracle.as_deref();

        let mut arena = Arena::new();
        let vocabulary = Vocabulary::new(&mut arena, config.unary, config.binary);
        let lattice = QuantifierLattice::new(
            &arena,
            config.quantifiers,
            config.max_k,
            config.counting(),
            config.double_counting_exists,
        );

        let clause_filters = ClauseFilters::new(&arena, config, oracle);
        let refiner = Refiner::new(&arena, &lattice, &vocabulary);
        let mut clauses = refiner.generate(config.max_literals_per_clause, |c| clause_filters.accept(c))?;
        if config.subsumption {
            let before = clauses.len();
            clauses.retain(|c| !is_theta_reducible(&arena, c));
            debug!("Subsumption removed {} clauses", before - clauses.len());
        }
        let pool = ClausePool::new(clauses);
        let forbidden = ForbiddenTable::precompute(&arena, &lattice, &pool, config.triples())?;
        info!(
            "Pool of {} clauses, {} forbidden pairs, {} forbidden triples",
            pool.len(),
            forbidden.num_pairs(),
            forbidden.num_triples()
        );

        let joins = JoinFilters::new(&pool, &vocabulary, &forbidden, config);
        let symmetries = Symmetries::new(&vocabulary, config.symmetry_flags());
        let max_literals = config.max_overall_literals();

        let mut by_length: Vec<Vec<ClauseId>> = vec![Vec::new(); config.max_literals_per_clause + 1];
        for (id, clause) in pool.iter() {
            by_length[clause.len()].push(id);
        }

        let mut output = SearchOutput {
            clauses: pool.len(),
            ..Default::default()
        };
        let mut layers: Vec<Vec<Sentence>> = vec![Vec::new(); max_literals + 1];
        let mut seen: HashSet<String> = HashSet::new();

        for level in 1..=max_literals {
            if let Some(limit) = config.time_limit {
                if start.elapsed() >= limit {
                    info!("Time limit reached before level {}", level);
                    output.timed_out = true;
                    break;
                }
            }

            let mut joined: Vec<Sentence> = (1..level)
                .filter(|&s| level - s < by_length.len())
                .flat_map(|s| {
                    let betas = &by_length[level - s];
                    let joins = &joins;
                    layers[s]
                        .par_iter()
                        .flat_map_iter(move |alpha| {
                            betas
                                .iter()
                                .filter(move |&&beta| joins.accept(alpha, beta))
                                .map(move |&beta| alpha.extend(beta))
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
            if let Some(singles) = by_length.get(level) {
                joined.extend(singles.iter().map(|&id| Sentence::single(id)));
            }
            let generated = joined.len();

            if config.contradiction_filter {
                if let Some(oracle) = oracle {
                    let verdicts: Vec<bool> = joined
                        .par_iter()
                        .map(|s| is_contradiction(&arena, &pool, s, oracle))
                        .collect::<Result<_>>()?;
                    joined = joined
                        .into_iter()
                        .zip(verdicts)
                        .filter_map(|(s, contradictory)| (!contradictory).then_some(s))
                        .collect();
                }
            }

            let keys: Vec<String> = joined
                .par_iter()
                .map(|s| symmetries.ultra_canonical(&arena, &pool, s))
                .collect();
            let candidates: Vec<Candidate> = joined
                .into_iter()
                .zip(keys)
                .filter(|(_, key)| seen.insert(key.clone()))
                .map(|(sentence, key)| Candidate { sentence, key })
                .collect();

            let hidden = hide(config, cell_graphs.as_mut(), &arena, &pool, &candidates)?;
            let mut sentences: Vec<String> = candidates
                .iter()
                .zip(&hidden)
                .filter(|(_, &h)| !h)
                .map(|(c, _)| c.key.clone())
                .collect();
            sentences.sort_unstable();
            info!(
                "Level {}: {} joined, {} unique, {} reported",
                level,
                generated,
                candidates.len(),
                sentences.len()
            );

            layers[level] = candidates.into_iter().map(|c| c.sentence).collect();
            output.levels.push(Level {
                literals: level,
                sentences,
                kept: layers[level].len(),
            });

            // Layers too short to reach the next level with one more clause.
            let lowest = (level + 1).saturating_sub(config.max_literals_per_clause);
            for layer in layers.iter_mut().take(lowest) {
                layer.clear();
            }
        }

        Ok(output)
    }
}

/// Which candidates are hidden from the output.
fn hide(
    config: &SearchConfig,
    cell_graphs: Option<&mut Box<dyn CellGraphFilter>>,
    arena: &Arena,
    pool: &ClausePool,
    candidates: &[Candidate],
) -> Result<Vec<bool>> {
    let mut hidden: Vec<bool> = if config.reflexive_atoms {
        candidates
            .par_iter()
            .map(|c| has_reflexive_only_atoms(arena, pool, &c.sentence))
            .collect()
    } else {
        vec![false; candidates.len()]
    };

    let Some(filter) = cell_graphs else {
        return Ok(hidden);
    };
    let keys: Vec<String> = candidates.iter().map(|c| c.key.clone()).collect();
    let already: Vec<String> = keys
        .iter()
        .zip(&hidden)
        .filter(|(_, &h)| h)
        .map(|(k, _)| k.clone())
        .collect();
    filter.add_hidden(&already)?;

    let grouping = filter.add(&keys, &hidden)?;
    for i in grouping.repeated {
        hidden[i] = true;
    }
    for mut group in grouping.groups.into_iter().filter(|g| g.len() > 1) {
        group.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        for &i in &group[1..] {
            debug!("CellGraph-Intra {} ~ {}", keys[i], keys[group[0]]);
            hidden[i] = true;
        }
    }
    Ok(hidden)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;

    use super::*;
    use crate::error::Error;

    fn small() -> SearchConfig {
        SearchConfig {
            max_clauses: 2,
            max_literals_per_clause: 2,
            unary: 1,
            binary: 1,
            max_k: 0,
            tautology_filter: false,
            contradiction_filter: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = SearchConfig {
            max_clauses: 0,
            ..Default::default()
        };
        assert!(matches!(Search::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_levels_are_sorted_and_unique() {
        let output = Search::new(small()).unwrap().run().unwrap();
        assert!(output.clauses > 0);
        assert_eq!(output.levels.len(), 4);
        assert!(!output.timed_out);
        let mut all = HashSet::new();
        for level in &output.levels {
            let mut sorted = level.sentences.clone();
            sorted.sort();
            assert_eq!(sorted, level.sentences);
            assert!(level.sentences.len() <= level.kept);
            for s in &level.sentences {
                assert!(all.insert(s.clone()), "{} reported twice", s);
            }
        }
        assert!(output.levels[0].sentences.contains(&"(V x U0(x))".to_string()));
    }

    #[test]
    fn test_symmetries_collapse_output() {
        let output = Search::new(small()).unwrap().run().unwrap();
        let first = &output.levels[0].sentences;
        assert!(!first.contains(&"(V x ~U0(x))".to_string()));
        assert!(!first.contains(&"(E x ~U0(x))".to_string()));

        let config = SearchConfig {
            negations: false,
            ..small()
        };
        let output = Search::new(config).unwrap().run().unwrap();
        assert!(output.levels[0].sentences.contains(&"(V x ~U0(x))".to_string()));
    }

    #[test]
    fn test_reflexive_atoms_are_hidden_but_kept() {
        let output = Search::new(small()).unwrap().run().unwrap();
        let reflexive_only = |s: &String| s.contains("B0(") && !s.contains("B0(x, y)") && !s.contains("B0(y, x)");
        // a single literal is never hidden
        assert!(output.levels[0].sentences.iter().any(reflexive_only));
        let second = &output.levels[1];
        assert!(!second.sentences.iter().any(reflexive_only));
        assert!(second.kept > second.sentences.len());
    }

    #[test]
    fn test_time_limit() {
        let config = SearchConfig {
            time_limit: Some(Duration::ZERO),
            ..small()
        };
        let output = Search::new(config).unwrap().run().unwrap();
        assert!(output.timed_out);
        assert!(output.levels.is_empty());
    }

    struct SameCells;

    impl crate::source::CellGraphSource for SameCells {
        fn compute(&self, sentences: &[String]) -> Result<Vec<crate::cellgraph::CellGraph>> {
            sentences
                .iter()
                .map(|_| crate::cellgraph::CellGraph::parse("[W(1), L(n1,1,1)]"))
                .collect()
        }
    }

    #[test]
    fn test_cell_graph_equivalence_hides() {
        let plain = Search::new(small()).unwrap().run().unwrap();
        let filter = CanonicalFilter::new(CellGraphResolver::new(
            Box::new(SameCells),
            Arc::new(MemoryStore::new()),
        ));
        let output = Search::new(small())
            .unwrap()
            .with_cell_graphs(Box::new(filter))
            .run()
            .unwrap();
        // one class: only the smallest sentence of the first level survives
        assert_eq!(output.levels[0].sentences, vec![plain.levels[0].sentences[0].clone()]);
        assert!(output.levels[1..].iter().all(|l| l.sentences.is_empty()));
        assert_eq!(output.levels[1].kept, plain.levels[1].kept);
    }

    struct Nothing;

    impl Oracle for Nothing {
        fn is_provable(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_oracle_that_proves_nothing_changes_nothing() {
        let plain = Search::new(small()).unwrap().run().unwrap();
        let config = SearchConfig {
            tautology_filter: true,
            contradiction_filter: true,
            ..small()
        };
        let with_oracle = Search::new(config)
            .unwrap()
            .with_oracle(Box::new(Nothing))
            .run()
            .unwrap();
        assert_eq!(plain.levels, with_oracle.levels);
    }
}
