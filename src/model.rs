//! Records passed between the cleaning, sentiment and rendering stages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One human turn pulled out of the export, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub client_id: String,
    pub human_message: String,
}

/// A normalized, deduplicated human message. This is the on-disk shape of
/// `cleaned_chat_data.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedMessage {
    pub client_id: String,
    pub message: String,
}

/// How often a normalized message occurred before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCount {
    pub message: String,
    pub count: usize,
}

/// A bounded slice of one cleaned message, tagged with the message it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChunk {
    pub source_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    /// Neutral, or any label the classifier emits that is not a known polarity.
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// Map a classifier's raw label string onto our three buckets.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" | "POS" | "LABEL_1" => SentimentLabel::Positive,
            "NEGATIVE" | "NEG" | "LABEL_0" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one classifier call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub confidence: f32,
}

/// Classifier result for one chunk. `label` is `None` when the call failed,
/// in which case the chunk casts no vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLabel {
    pub source_index: usize,
    pub label: Option<SentimentLabel>,
}

/// Aggregated sentiment of a whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Label(SentimentLabel),
    /// Every chunk of the message failed classification.
    Unavailable,
}

impl Verdict {
    pub fn label(&self) -> Option<SentimentLabel> {
        match self {
            Verdict::Label(l) => Some(*l),
            Verdict::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSentiment {
    pub source_index: usize,
    pub verdict: Verdict,
}

/// Count of one label on one synthetic date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub label: SentimentLabel,
    pub count: usize,
}

/// Everything the sentiment stage hands to the renderer.
#[derive(Debug, Clone, Default)]
pub struct SentimentReport {
    /// One entry per cleaned message, in message order.
    pub sentiments: Vec<MessageSentiment>,
    /// Labels in first-seen order with their message counts.
    pub category_counts: Vec<(SentimentLabel, usize)>,
    pub trend: Vec<TrendPoint>,
    /// Source indices whose verdict is `Unavailable`.
    pub unavailable: Vec<usize>,
    pub chunk_count: usize,
    pub failed_chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_labels_map_to_buckets() {
        assert_eq!(SentimentLabel::from_raw("POSITIVE"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_raw("label_0"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_raw(" neg "), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_raw("mixed"), SentimentLabel::Neutral);
    }

    #[test]
    fn labels_serialize_uppercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"NEGATIVE\"");
    }
}
