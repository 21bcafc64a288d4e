//! chatsent
//! --------
//! Offline sentiment pass over a chat-log export.
//!
//! Pipeline:
//!   export.json -> clean (normalize, dedup, filter) -> chunk -> classify
//!   -> majority vote per message -> SVG charts + HTML report
//!
//! Each stage takes its predecessor's output as a value and returns its own;
//! nothing is shared between stages except what is passed along.

pub mod aggregate;
pub mod chunking;
pub mod classifier;
pub mod clean;
pub mod model;
pub mod render;
pub mod sentiment;

pub use aggregate::{aggregate, aggregate_all, majority_vote};
pub use chunking::{chunk_messages, split, DEFAULT_MAX_CHUNK_CHARS};
pub use classifier::{Classifier, ClassifyError, LexiconClassifier, RemoteClassifier, RemoteConfig};
pub use clean::{clean_export, load_export, normalize_text, ChatExport, CleaningOutput};
pub use model::*;
pub use render::{render_all, RenderInput, RenderedOutputs};
pub use sentiment::{analyze, classify_all, AnalyzeOptions};
