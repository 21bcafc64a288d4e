//! Folding chunk labels back into one verdict per message.
//!
//! Majority vote over a message's chunk labels in chunk order. On a count
//! tie the label that appeared first wins. Chunks whose classification failed
//! cast no vote; a message with no votes at all is `Verdict::Unavailable`.

use tracing::warn;

use crate::model::{ChunkLabel, MessageSentiment, SentimentLabel, Verdict};

/// Majority label of `labels`, ties going to the earliest label. `None` when
/// `labels` is empty.
pub fn majority_vote<I>(labels: I) -> Option<SentimentLabel>
where
    I: IntoIterator<Item = SentimentLabel>,
{
    // (label, count) in first-seen order
    let mut tally: Vec<(SentimentLabel, usize)> = Vec::with_capacity(SentimentLabel::ALL.len());
    for label in labels {
        match tally.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => tally.push((label, 1)),
        }
    }

    let mut best: Option<(SentimentLabel, usize)> = None;
    for (label, n) in tally {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((label, n));
        }
    }
    best.map(|(label, _)| label)
}

/// Verdict for the message at `message_index`, looking only at chunk labels
/// tagged with that index.
pub fn aggregate(message_index: usize, chunk_labels: &[ChunkLabel]) -> Verdict {
    let votes = chunk_labels
        .iter()
        .filter(|c| c.source_index == message_index)
        .filter_map(|c| c.label);
    match majority_vote(votes) {
        Some(label) => Verdict::Label(label),
        None => Verdict::Unavailable,
    }
}

/// One [`MessageSentiment`] per index in `0..message_count`, in a single pass
/// over `chunk_labels`. Same result as calling [`aggregate`] per index.
pub fn aggregate_all(message_count: usize, chunk_labels: &[ChunkLabel]) -> Vec<MessageSentiment> {
    let mut buckets: Vec<Vec<SentimentLabel>> = vec![Vec::new(); message_count];
    for c in chunk_labels {
        match buckets.get_mut(c.source_index) {
            Some(bucket) => bucket.extend(c.label),
            None => warn!(
                "Chunk label for message {} ignored: only {} messages",
                c.source_index, message_count
            ),
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(source_index, votes)| MessageSentiment {
            source_index,
            verdict: match majority_vote(votes) {
                Some(label) => Verdict::Label(label),
                None => Verdict::Unavailable,
            },
        })
        .collect()
}
