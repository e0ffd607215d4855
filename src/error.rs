use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the search core.
///
/// Everything here is fatal for the operation that produced it: a failed parse aborts
/// the parse, a failed batch aborts the layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot parse `{text}`: {reason}")]
    Parse { text: String, reason: String },

    #[error("malformed cell graph `{text}`: {reason}")]
    CellGraph { text: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("external command `{command}` failed: {reason}\n--- input ({}) ---\n{contents}\n--- stderr ---\n{stderr}", .input.display())]
    External {
        command: String,
        input: PathBuf,
        contents: String,
        stderr: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            text: text.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn cell_graph(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CellGraph {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
