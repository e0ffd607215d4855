//! Running external tools over a temporary input file.
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use log::{debug, trace};

use crate::error::{Error, Result};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A temporary input file, removed on drop unless [`InputFile::keep`] was called.
#[derive(Debug)]
pub(crate) struct InputFile {
    path: PathBuf,
    contents: String,
    keep: bool,
}

impl InputFile {
    /// Writes `contents` to a fresh file in the system temporary directory.
    pub(crate) fn create(tag: &str, contents: String) -> Result<Self> {
        let name = format!(
            "sfinder-{}-{}-{}.in",
            tag,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let path = std::env::temp_dir().join(name);
        fs::write(&path, &contents)?;
        Ok(Self {
            path,
            contents,
            keep: false,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Leaves the file in place for inspection.
    pub(crate) fn keep(&mut self) {
        self.keep = true;
    }

    /// An [`Error::External`] describing a failed run over this input.
    pub(crate) fn failure(&mut self, command: &str, stderr: &str, reason: impl Into<String>) -> Error {
        self.keep();
        Error::External {
            command: command.to_string(),
            input: self.path.clone(),
            contents: self.contents.clone(),
            stderr: stderr.to_string(),
            reason: reason.into(),
        }
    }
}

impl Drop for InputFile {
    fn drop(&mut self) {
        if !self.keep {
            if let Err(e) = fs::remove_file(&self.path) {
                trace!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Captured output of a finished process.
#[derive(Debug)]
pub(crate) struct Finished {
    pub(crate) command: String,
    pub(crate) stdout: Vec<String>,
    pub(crate) stderr: String,
    pub(crate) success: bool,
    pub(crate) status: String,
}

/// Runs `program args...` to completion, draining stdout and stderr concurrently.
pub(crate) fn run(program: &Path, args: &[String], input: &mut InputFile) -> Result<Finished> {
    let command = std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    debug!("Running `{}`", command);

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return Err(input.failure(&command, "", format!("cannot start: {}", e))),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(input.failure(&command, "", "process pipes are not available"));
    };

    let (stdout, stderr) = thread::scope(|s| {
        let out = s.spawn(move || BufReader::new(stdout).lines().collect::<std::io::Result<Vec<String>>>());
        let err = s.spawn(move || {
            let mut text = String::new();
            BufReader::new(stderr).read_to_string(&mut text).map(|_| text)
        });
        (out.join(), err.join())
    });
    let stderr = match stderr {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(input.failure(&command, "", format!("reading stderr: {}", e))),
        Err(_) => return Err(input.failure(&command, "", "stderr reader panicked")),
    };
    let stdout = match stdout {
        Ok(Ok(lines)) => lines,
        Ok(Err(e)) => return Err(input.failure(&command, &stderr, format!("reading stdout: {}", e))),
        Err(_) => return Err(input.failure(&command, &stderr, "stdout reader panicked")),
    };

    let status = match child.wait() {
        Ok(status) => status,
        Err(e) => return Err(input.failure(&command, &stderr, format!("waiting for exit: {}", e))),
    };

    Ok(Finished {
        command,
        stdout,
        stderr,
        success: status.success(),
        status: status.to_string(),
    })
}
