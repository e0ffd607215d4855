use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use sfinder::config::{CellGraphStrategy, SearchConfig};
use sfinder::search::Search;
use sfinder::store::{KeyValueStore, MemoryStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    Canonical,
    Isomorphic,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Maximal number of clauses per sentence.
    #[arg(long, value_name = "INT", default_value = "3")]
    clauses: usize,

    /// Maximal number of literals per clause.
    #[arg(long, value_name = "INT", default_value = "3")]
    literals: usize,

    /// Literal budget per sentence (default: clauses * literals).
    #[arg(long, value_name = "INT")]
    overall: Option<usize>,

    /// Number of unary predicates.
    #[arg(long, value_name = "INT", default_value = "1")]
    unary: usize,

    /// Number of binary predicates.
    #[arg(long, value_name = "INT", default_value = "1")]
    binary: usize,

    /// Largest counting quantifier (0 disables counting).
    #[arg(long, value_name = "INT", default_value = "1")]
    k: u32,

    /// Forbid existential quantifiers.
    #[clap(long)]
    universal_only: bool,

    /// Disable the Prover9 filters.
    #[clap(long)]
    no_prover: bool,

    /// Path of the Prover9 binary.
    #[clap(long, value_name = "PATH", default_value = "prover9")]
    prover9: PathBuf,

    /// Julia script computing cell graphs.
    #[clap(long, value_name = "PATH")]
    cells: Option<PathBuf>,

    /// Cell-graph deduplication strategy.
    #[clap(long, value_enum, default_value = "canonical")]
    strategy: Strategy,

    /// Threads passed to Julia.
    #[clap(long, value_name = "INT", default_value = "1")]
    julia_threads: usize,

    /// Stop before the next level after this many seconds.
    #[clap(long, value_name = "SECONDS")]
    time_limit: Option<u64>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let config = SearchConfig {
        max_overall_literals: args.overall,
        max_clauses: args.clauses,
        max_literals_per_clause: args.literals,
        unary: args.unary,
        binary: args.binary,
        quantifiers: !args.universal_only,
        max_k: args.k,
        tautology_filter: !args.no_prover,
        contradiction_filter: !args.no_prover,
        prover9: args.prover9,
        cell_graph_script: args.cells,
        cell_graph_strategy: match args.strategy {
            Strategy::Canonical => CellGraphStrategy::Canonical,
            Strategy::Isomorphic => CellGraphStrategy::Isomorphic,
        },
        julia_threads: args.julia_threads,
        time_limit: args.time_limit.map(Duration::from_secs),
        ..Default::default()
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut search = Search::from_config(config, Some(store))?;
    let output = search.run()?;

    println!("clauses in pool: {}", output.clauses);
    for level in &output.levels {
        println!(
            "level {}: {} sentences ({} kept for extension)",
            level.literals,
            level.sentences.len(),
            level.kept
        );
        for sentence in &level.sentences {
            println!("  {}", sentence);
        }
    }
    if output.timed_out {
        println!("time limit reached");
    }

    let total = output.levels.iter().map(|l| l.sentences.len()).sum::<usize>();
    println!("{} sentences in {:.3} s", total, time_total.elapsed().as_secs_f64());

    Ok(())
}
