//! Theorem-prover oracle used by the tautology and contradiction filters.
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::Result;
use crate::process::{run, InputFile};

/// Decides provability of a set of first-order formulas.
pub trait Oracle: Sync {
    /// Is a contradiction derivable from `formulas` (one per line, Prover9 syntax)?
    fn is_provable(&self, formulas: &str) -> Result<bool>;
}

/// The Prover9 command-line prover.
#[derive(Debug, Clone)]
pub struct Prover9 {
    path: PathBuf,
    max_seconds: u32,
}

impl Prover9 {
    pub fn new(path: impl Into<PathBuf>, max_seconds: u32) -> Self {
        Self {
            path: path.into(),
            max_seconds,
        }
    }

    /// The complete Prover9 input for `formulas`.
    pub fn input(&self, formulas: &str) -> String {
        let mut sos = formulas.trim_end().to_string();
        sos.push('\n');
        format!(
            "set(quiet).\nassign(max_seconds, {}).\nassign(max_proofs, 0).\nformulas(sos).\n{}end_of_list.\n",
            self.max_seconds, sos
        )
    }
}

impl Oracle for Prover9 {
    fn is_provable(&self, formulas: &str) -> Result<bool> {
        let mut input = InputFile::create("prover9", self.input(formulas))?;
        let args = vec!["-f".to_string(), input.path().display().to_string()];
        let finished = run(&self.path, &args, &mut input)?;
        let proved = finished.stdout.iter().any(|line| line.contains("THEOREM PROVED"));
        if !proved && !finished.success {
            // Prover9 exits non-zero when the search is exhausted or times out.
            debug!("`{}` ended with {}", finished.command, finished.status);
        }
        if !finished.stderr.trim().is_empty() {
            warn!("`{}` stderr: {}", finished.command, finished.stderr.trim());
        }
        Ok(proved)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_input_template() {
        let prover = Prover9::new("prover9", 30);
        assert_eq!(
            prover.input("all x (U0(x)).\nexists x (-U0(x))."),
            "set(quiet).\nassign(max_seconds, 30).\nassign(max_proofs, 0).\nformulas(sos).\n\
             all x (U0(x)).\nexists x (-U0(x)).\nend_of_list.\n"
        );
    }
}
