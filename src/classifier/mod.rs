//! The sentiment classifier seam.
//!
//! Aggregation only ever sees [`Classifier`]; whether a label comes from the
//! offline lexicon, a remote inference endpoint or a test stub is invisible
//! to it.

mod lexicon;
mod remote;

pub use lexicon::LexiconClassifier;
pub use remote::{parse_classification, RemoteClassifier, RemoteConfig};

use thiserror::Error;

use crate::chunking::DEFAULT_MAX_CHUNK_CHARS;
use crate::model::Classification;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Input of {len} chars exceeds the {max} char ceiling")]
    InputTooLong { len: usize, max: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Text in, one label out. Inputs longer than [`Classifier::max_input_chars`]
/// must be chunked by the caller.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn max_input_chars(&self) -> usize {
        DEFAULT_MAX_CHUNK_CHARS
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifyError>;
}
