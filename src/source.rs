//! Producers of cell graphs.
use std::path::PathBuf;

use log::{info, warn};

use crate::cellgraph::CellGraph;
use crate::error::Result;
use crate::process::{run, InputFile};

/// Computes the cell graphs of a batch of sentences.
pub trait CellGraphSource: Send + Sync {
    /// One cell graph per input sentence, in input order.
    fn compute(&self, sentences: &[String]) -> Result<Vec<CellGraph>>;
}

/// The Julia cell-graph script, run once per batch.
///
/// The script reads one sentence per line and prints one bracketed cell graph per
/// sentence; any other output line is a diagnostic.
#[derive(Debug, Clone)]
pub struct JuliaCellGraphs {
    julia: PathBuf,
    script: PathBuf,
    threads: usize,
    time_limit: u64,
}

impl JuliaCellGraphs {
    pub fn new(script: impl Into<PathBuf>, threads: usize, time_limit: u64) -> Self {
        Self {
            julia: PathBuf::from("julia"),
            script: script.into(),
            threads,
            time_limit,
        }
    }

    /// Uses a specific Julia binary instead of `julia` from `PATH`.
    pub fn with_julia(mut self, julia: impl Into<PathBuf>) -> Self {
        self.julia = julia.into();
        self
    }

    fn args(&self, input: &InputFile) -> Vec<String> {
        vec![
            "--threads".to_string(),
            self.threads.to_string(),
            self.script.display().to_string(),
            input.path().display().to_string(),
            self.time_limit.to_string(),
        ]
    }
}

/// Splits tool output into result lines and diagnostics.
pub(crate) fn result_lines(stdout: &[String]) -> (Vec<&str>, Vec<&str>) {
    stdout
        .iter()
        .map(String::as_str)
        .partition(|line| line.trim_start().starts_with('['))
}

impl CellGraphSource for JuliaCellGraphs {
    fn compute(&self, sentences: &[String]) -> Result<Vec<CellGraph>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let mut input = InputFile::create("cells", sentences.join("\n"))?;
        let args = self.args(&input);
        let finished = run(&self.julia, &args, &mut input)?;

        let (results, diagnostics) = result_lines(&finished.stdout);
        for line in diagnostics {
            info!("cell graphs: {}", line);
        }
        if !finished.stderr.trim().is_empty() {
            warn!("`{}` stderr: {}", finished.command, finished.stderr.trim());
        }
        if !finished.success {
            return Err(input.failure(&finished.command, &finished.stderr, format!("exited with {}", finished.status)));
        }
        if results.len() != sentences.len() {
            return Err(input.failure(
                &finished.command,
                &finished.stderr,
                format!("expected {} cell graphs, got {}", sentences.len(), results.len()),
            ));
        }
        let mut graphs = Vec::with_capacity(results.len());
        for line in results {
            match CellGraph::parse(line) {
                Ok(graph) => graphs.push(graph),
                Err(e) => return Err(input.failure(&finished.command, &finished.stderr, e.to_string())),
            }
        }
        Ok(graphs)
    }
}
