//! Error types.
//!
//! - [`ScanError`] is what the library layers return. Its variants follow the
//!   failure taxonomy of the scan pipeline (bad input, document construction,
//!   engine invocation, whole-scan failure).
//! - [`EngineError`] describes why a single engine invocation produced no
//!   usable likelihood.
//! - [`AppError`] is the CLI-facing error: a message plus a process exit code.

use thiserror::Error;

/// Why one engine invocation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("failed to start engine: {0}")]
    Spawn(String),
    #[error("engine I/O failed: {0}")]
    Io(String),
    #[error("engine timed out after {seconds:.1}s")]
    Timeout { seconds: f64 },
    #[error("engine output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },
    #[error("engine exited with {status}")]
    ExitStatus { status: String },
    #[error("engine output is not valid UTF-8")]
    InvalidUtf8,
    #[error("engine output has no '-2log(likelihood) = <value>' line")]
    MissingLikelihood,
}

/// Errors surfaced by validation, serialization, evaluation and scans.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// Malformed, out-of-range, or unknown input. Always raised before any
    /// engine call or file write.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Document construction failed after validation passed.
    #[error("could not build engine input: {0}")]
    Serialization(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("all {points} scan points failed")]
    AllPointsFailed { points: usize },
    #[error("could not start scan workers: {0}")]
    WorkerPool(String),
}

impl ScanError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScanError::Validation(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        ScanError::Serialization(message.into())
    }

    /// Exit code used when this error reaches the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanError::Validation(_) | ScanError::Serialization(_) => 2,
            ScanError::AllPointsFailed { .. } => 3,
            ScanError::Engine(_) | ScanError::WorkerPool(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
