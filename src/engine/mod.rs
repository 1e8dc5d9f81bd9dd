//! Likelihood engine boundary.
//!
//! An [`Engine`] takes a rendered input document and a dataset and returns the
//! engine's raw text output. Everything about *how* the engine runs (process,
//! timeout, output cap, scratch files) stays behind this trait; the rest of the
//! crate only sees text, which [`parse`] turns into numbers.

pub mod cache;
pub mod parse;
pub mod process;

use crate::domain::Dataset;
use crate::error::EngineError;
use crate::input::InputDocument;

pub use cache::{CachedEngine, EvictionPolicy, ExpiredThenOldest, TtlCache};
pub use parse::{parse_likelihood, parse_ndof};
pub use process::{EngineConfig, ProcessEngine};

/// A likelihood engine. Implementations must be callable from several scan
/// workers at once.
pub trait Engine: Sync {
    fn evaluate(&self, document: &InputDocument, dataset: Dataset) -> Result<String, EngineError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn evaluate(&self, document: &InputDocument, dataset: Dataset) -> Result<String, EngineError> {
        (**self).evaluate(document, dataset)
    }
}

impl<E: Engine + ?Sized> Engine for &E {
    fn evaluate(&self, document: &InputDocument, dataset: Dataset) -> Result<String, EngineError> {
        (**self).evaluate(document, dataset)
    }
}
