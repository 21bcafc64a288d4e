//! Offline word-list classifier.
//!
//! Scores each known polarity word, boosts it after an intensifier and flips
//! it inside a short window after a negation. Good enough to run the pipeline
//! without network access; swap in [`super::RemoteClassifier`] for a real model.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::{ClassifyError, Classifier};
use crate::chunking::DEFAULT_MAX_CHUNK_CHARS;
use crate::model::{Classification, SentimentLabel};

static POSITIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "good", "great", "excellent", "wonderful", "fantastic", "amazing", "awesome",
        "love", "happy", "glad", "pleased", "delighted", "satisfied", "perfect",
        "brilliant", "outstanding", "superb", "best", "better", "helpful", "thanks",
        "thank", "nice", "cool", "easy", "works", "working", "fixed", "solved",
        "enjoy", "pleasant", "excited", "like", "liked", "appreciate", "useful",
        "fast", "quick", "recommend", "success", "successful", "clear",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse", "hate",
        "angry", "sad", "upset", "disappointed", "unhappy", "fail", "failed",
        "failure", "problem", "issue", "wrong", "error", "broken", "bug", "crash",
        "crashed", "slow", "stuck", "difficult", "hard", "confusing", "confused",
        "annoying", "useless", "frustrated", "frustrating", "cant", "cannot",
        "refund", "cancel", "complaint", "missing", "lost", "never",
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["very", "extremely", "absolutely", "really", "incredibly", "highly", "totally", "so"]
        .into_iter()
        .collect()
});

static NEGATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["not", "no", "dont", "doesnt", "didnt", "isnt", "wasnt", "wont", "nothing", "none"]
        .into_iter()
        .collect()
});

#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    max_chars: usize,
    negation_window: usize,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self { max_chars: DEFAULT_MAX_CHUNK_CHARS, negation_window: 3 }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    pub fn with_negation_window(mut self, window: usize) -> Self {
        self.negation_window = window;
        self
    }

    /// Sum of word scores and how many polarity words contributed.
    fn score(&self, text: &str) -> (f32, usize) {
        let mut total = 0.0f32;
        let mut hits = 0usize;
        let mut modifier = 1.0f32;
        let mut since_negation: Option<usize> = None;

        for raw in text.split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            if NEGATIONS.contains(word.as_str()) {
                since_negation = Some(0);
                continue;
            }
            if INTENSIFIERS.contains(word.as_str()) {
                modifier = 1.5;
                continue;
            }

            let base = if POSITIVE_WORDS.contains(word.as_str()) {
                Some(1.0)
            } else if NEGATIVE_WORDS.contains(word.as_str()) {
                Some(-1.0)
            } else {
                None
            };

            if let Some(base) = base {
                let mut s = base * modifier;
                if since_negation.is_some_and(|n| n < self.negation_window) {
                    s = -s * 0.8;
                }
                total += s;
                hits += 1;
                modifier = 1.0;
            }

            since_negation = match since_negation {
                Some(n) if n + 1 < self.negation_window => Some(n + 1),
                _ => None,
            };
        }
        (total, hits)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn max_input_chars(&self) -> usize {
        self.max_chars
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
        if text.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(ClassifyError::InputTooLong { len, max: self.max_chars });
        }

        let (total, hits) = self.score(text);
        let label = if total > 0.0 {
            SentimentLabel::Positive
        } else if total < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        let confidence = if hits == 0 {
            0.5
        } else {
            (0.5 + (total.abs() / hits as f32) * 0.5).min(1.0)
        };
        Ok(Classification { label, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> SentimentLabel {
        LexiconClassifier::new().classify(text).unwrap().label
    }

    #[test]
    fn polarity_words_decide_the_label() {
        assert_eq!(label("thanks this is great"), SentimentLabel::Positive);
        assert_eq!(label("the app is broken and slow"), SentimentLabel::Negative);
        assert_eq!(label("what time is it"), SentimentLabel::Neutral);
    }

    #[test]
    fn negation_flips_nearby_words() {
        assert_eq!(label("this is not good"), SentimentLabel::Negative);
        assert_eq!(label("not a problem"), SentimentLabel::Positive);
    }

    #[test]
    fn negation_window_bounds_the_flip() {
        let narrow = LexiconClassifier::new().with_negation_window(1);
        assert_eq!(narrow.classify("not a problem").unwrap().label, SentimentLabel::Negative);
        assert_eq!(narrow.classify("not good").unwrap().label, SentimentLabel::Negative);

        let off = LexiconClassifier::new().with_negation_window(0);
        assert_eq!(off.classify("not good").unwrap().label, SentimentLabel::Positive);
    }

    #[test]
    fn rejects_empty_and_oversized_input() {
        let c = LexiconClassifier::new().with_max_chars(5);
        assert_eq!(c.classify("   "), Err(ClassifyError::EmptyInput));
        assert_eq!(
            c.classify("abcdefg"),
            Err(ClassifyError::InputTooLong { len: 7, max: 5 })
        );
    }
}
