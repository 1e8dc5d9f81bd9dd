//! Engine backed by an external executable.
//!
//! Each call writes the document to a fresh scratch file, runs
//!
//! ```text
//! <program> [args...] <input-file> <dataset-list-file>
//! ```
//!
//! and captures stdout. The scratch file is a `NamedTempFile`, so it is removed
//! when the call returns, on every path.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::Dataset;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::input::InputDocument;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How to run the engine executable.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
    /// Directory for scratch input files; the system temp dir when `None`.
    pub scratch_dir: Option<PathBuf>,
    /// Working directory of the engine process. Dataset list paths are
    /// relative to it.
    pub working_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            scratch_dir: None,
            working_dir: None,
        }
    }
}

pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn write_input(&self, document: &InputDocument) -> Result<tempfile::NamedTempFile, EngineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("hscan-").suffix(".xml");
        let mut file = match &self.config.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(scratch_error)?;
        file.write_all(document.as_str().as_bytes()).map_err(scratch_error)?;
        file.flush().map_err(scratch_error)?;
        Ok(file)
    }

    fn spawn(&self, input: &Path, dataset: Dataset) -> Result<Child, EngineError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg(input)
            .arg(dataset.list_file())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        command
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {e}", self.config.program.display())))
    }

    /// Run the child to completion (or the deadline) and return its stdout.
    fn collect(&self, mut child: Child) -> Result<Vec<u8>, EngineError> {
        let limit = self.config.max_output_bytes;
        let timeout = self.config.timeout;
        // `None` when the timeout is too large to represent as an instant.
        let deadline = Instant::now().checked_add(timeout);

        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child);
            return Err(EngineError::Io("engine stdout was not captured".to_string()));
        };

        // Reading at most `limit + 1` bytes is enough to tell "fits" from
        // "too large" without buffering an unbounded stream.
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("hscan-engine-stdout".to_string())
            .spawn(move || {
                let mut buf = Vec::new();
                let result = stdout.take(limit as u64 + 1).read_to_end(&mut buf).map(|_| buf);
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            terminate(&mut child);
            return Err(io_error(e));
        }

        let mut captured = None;
        let status = loop {
            if captured.is_none() {
                if let Ok(result) = rx.try_recv() {
                    match check_size(result, limit) {
                        Ok(bytes) => captured = Some(bytes),
                        Err(err) => {
                            terminate(&mut child);
                            return Err(err);
                        }
                    }
                }
            }

            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(io_error(e));
                }
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                terminate(&mut child);
                return Err(EngineError::Timeout {
                    seconds: timeout.as_secs_f64(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let bytes = match captured {
            Some(bytes) => bytes,
            None => {
                // The process is gone; a stray grandchild could still hold the
                // pipe open, so the wait is bounded by the same deadline.
                let received = match deadline {
                    Some(d) => {
                        let remaining = d.saturating_duration_since(Instant::now());
                        rx.recv_timeout(remaining.max(POLL_INTERVAL)).ok()
                    }
                    None => rx.recv().ok(),
                };
                match received {
                    Some(result) => check_size(result, limit)?,
                    None => {
                        return Err(EngineError::Timeout {
                            seconds: timeout.as_secs_f64(),
                        });
                    }
                }
            }
        };

        if !status.success() {
            return Err(EngineError::ExitStatus {
                status: status.to_string(),
            });
        }
        Ok(bytes)
    }
}

impl Engine for ProcessEngine {
    fn evaluate(&self, document: &InputDocument, dataset: Dataset) -> Result<String, EngineError> {
        let started = Instant::now();
        let input = self.write_input(document)?;
        let child = self.spawn(input.path(), dataset)?;
        let result = self.collect(child);
        drop(input);

        log::debug!(
            "engine run on {} finished in {:.2}s ({})",
            dataset.as_str(),
            started.elapsed().as_secs_f64(),
            if result.is_ok() { "ok" } else { "failed" }
        );

        String::from_utf8(result?).map_err(|_| EngineError::InvalidUtf8)
    }
}

fn check_size(result: io::Result<Vec<u8>>, limit: usize) -> Result<Vec<u8>, EngineError> {
    let bytes = result.map_err(io_error)?;
    if bytes.len() > limit {
        return Err(EngineError::OutputTooLarge { limit });
    }
    Ok(bytes)
}

/// Kill and reap the direct child.
///
/// Only that process is signalled. When the engine is a wrapper script, a
/// grandchild it started keeps running after a timeout and keeps the stdout
/// pipe open; the reader thread then stays blocked until that grandchild exits.
/// Callers never wait on that thread past the deadline.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn io_error(err: io::Error) -> EngineError {
    EngineError::Io(err.to_string())
}

/// Scratch-file errors from `tempfile` embed the random file name; only the
/// error kind is surfaced.
fn scratch_error(err: io::Error) -> EngineError {
    EngineError::Io(format!("could not write scratch input file: {}", err.kind()))
}
