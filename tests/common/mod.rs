#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use chatsent::classifier::{Classifier, ClassifyError};
use chatsent::model::{Classification, CleanedMessage, SentimentLabel};
use chatsent::sentiment::AnalyzeOptions;

/// Labels a chunk by its first character: `p` positive, `n` negative,
/// `x` fails, anything else neutral. Records the longest input it saw.
#[derive(Default)]
pub struct ScriptedClassifier {
    pub max_chars: usize,
    pub calls: AtomicUsize,
    pub longest_input: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars, ..Default::default() }
    }
}

impl Classifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    fn max_input_chars(&self) -> usize {
        self.max_chars
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.longest_input.fetch_max(text.chars().count(), Ordering::SeqCst);
        let label = match text.chars().next() {
            Some('p') => SentimentLabel::Positive,
            Some('n') => SentimentLabel::Negative,
            Some('x') => return Err(ClassifyError::Transport("scripted failure".into())),
            _ => SentimentLabel::Neutral,
        };
        Ok(Classification { label, confidence: 1.0 })
    }
}

pub fn messages(texts: &[&str]) -> Vec<CleanedMessage> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| CleanedMessage { client_id: format!("c{i}"), message: t.to_string() })
        .collect()
}

pub fn options(max_chunk_chars: usize, concurrency: usize) -> AnalyzeOptions {
    AnalyzeOptions {
        max_chunk_chars,
        concurrency,
        show_progress: false,
        ..AnalyzeOptions::default()
    }
}
