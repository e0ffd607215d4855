//! # sfinder: level-wise search for FO2/C2 sentences
//!
//! **`sfinder`** enumerates first-order sentences over a small vocabulary of unary and
//! binary predicates, in the two-variable fragment with optional counting quantifiers
//! (`∃=k`). It is built to produce a *non-redundant* catalogue: sentences that are
//! equivalent up to renaming, complementing or transposing predicates are reported
//! once, and so are sentences whose weighted model counts are provably the same.
//!
//! ## How the search works
//!
//! 1. A [`Vocabulary`][crate::vocabulary::Vocabulary] fixes the predicates and every
//!    literal over the variables `x` and `y`.
//! 2. A [`Refiner`][crate::refinement::Refiner] grows quantified clauses literal by literal,
//!    driven by the [`QuantifierLattice`][crate::lattice::QuantifierLattice], and the
//!    surviving clauses form a [`ClausePool`][crate::pool::ClausePool].
//! 3. A [`ForbiddenTable`][crate::forbidden::ForbiddenTable] records the clause pairs
//!    (and decomposition triples) that are redundant together, so the search never builds
//!    them.
//! 4. The [`Search`][crate::search::Search] joins sentences with clauses level by level,
//!    keyed by their ultra-canonical form under the vocabulary symmetries.
//! 5. Optionally, the cell graph of every sentence is computed by an external tool and
//!    sentences with equivalent cell graphs are hidden, either by comparing canonical
//!    strings ([`CellGraph::canonical`][crate::cellgraph::CellGraph::canonical]) or by
//!    structural isomorphism ([`isomorphism`]).
//!
//! ## Basic usage
//!
//! ```rust
//! use sfinder::config::SearchConfig;
//! use sfinder::search::Search;
//!
//! let config = SearchConfig {
//!     max_clauses: 1,
//!     max_literals_per_clause: 1,
//!     max_k: 0,
//!     tautology_filter: false,
//!     contradiction_filter: false,
//!     ..Default::default()
//! };
//! let output = Search::new(config)?.run()?;
//! assert!(output.sentences().any(|s| s == "(V x U0(x))"));
//! # Ok::<(), sfinder::error::Error>(())
//! ```
//!
//! ## Core components
//!
//! - **[`arena`]**: session-scoped interning of terms, predicates and literals.
//! - **[`clause`]** and **[`quantifier`]**: the clause model and its canonical forms.
//! - **[`redundancy`]** and **[`forbidden`]**: the pairwise entailment rules.
//! - **[`cellgraph`]**: parsing and canonical labelling of cell graphs.
//! - **[`dedup`]**: cell-graph deduplication strategies.

pub mod arena;
pub mod cell;
pub mod cellgraph;
pub mod clause;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filters;
pub mod forbidden;
pub mod isomorphism;
pub mod lattice;
pub mod mapping;
pub mod oracle;
pub mod parser;
pub mod pool;
mod process;
pub mod quantifier;
pub mod redundancy;
pub mod refinement;
pub mod search;
pub mod sentence;
pub mod skolem;
pub mod source;
pub mod store;
pub mod types;
pub mod utils;
pub mod vocabulary;
pub mod weight;
