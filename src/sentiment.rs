//! Sentiment stage: chunk -> classify -> aggregate, plus the summaries the
//! renderer draws from.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

use crate::aggregate::aggregate_all;
use crate::chunking::{chunk_messages, DEFAULT_MAX_CHUNK_CHARS};
use crate::classifier::Classifier;
use crate::model::{
    ChunkLabel, CleanedMessage, MessageChunk, MessageSentiment, SentimentLabel, SentimentReport,
    TrendPoint, Verdict,
};

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub max_chunk_chars: usize,
    /// Worker threads for classification. 1 classifies sequentially.
    pub concurrency: usize,
    /// Synthetic date of the first message in the trend view.
    pub trend_start: NaiveDate,
    pub show_progress: bool,
}

pub fn default_trend_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            concurrency: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            trend_start: default_trend_start(),
            show_progress: true,
        }
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message("classifying…");
    pb
}

/// Classify every chunk on a pool of `concurrency` threads. The result is
/// index-aligned with `chunks`; a failed call becomes `label: None`.
pub fn classify_all(
    chunks: &[MessageChunk],
    classifier: &dyn Classifier,
    concurrency: usize,
    progress: &ProgressBar,
) -> Result<Vec<ChunkLabel>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .context("Failed to build Rayon thread pool")?;

    let labels: Vec<ChunkLabel> = pool.install(|| {
        chunks
            .par_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let label = match classifier.classify(&chunk.text) {
                    Ok(c) => Some(c.label),
                    Err(e) => {
                        warn!("Chunk {} of message {} got no label: {}", i, chunk.source_index, e);
                        None
                    }
                };
                progress.inc(1);
                ChunkLabel { source_index: chunk.source_index, label }
            })
            .collect()
    });
    Ok(labels)
}

/// Labels in first-seen message order with how many messages carry each.
/// Unavailable verdicts are not counted.
pub fn category_counts(sentiments: &[MessageSentiment]) -> Vec<(SentimentLabel, usize)> {
    let mut counts: Vec<(SentimentLabel, usize)> = Vec::new();
    for label in sentiments.iter().filter_map(|s| s.verdict.label()) {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
}

/// Message `i` is dated `start + i` days. Each labelled message contributes a
/// point for every observed label (1 for its own, 0 for the rest) so the
/// per-label lines stay continuous. Unavailable messages leave a gap.
pub fn sentiment_trend(sentiments: &[MessageSentiment], start: NaiveDate) -> Vec<TrendPoint> {
    let observed: Vec<SentimentLabel> = category_counts(sentiments).into_iter().map(|(l, _)| l).collect();
    let mut points = Vec::with_capacity(sentiments.len() * observed.len());
    for s in sentiments {
        let Some(own) = s.verdict.label() else { continue };
        let Some(date) = start.checked_add_days(Days::new(s.source_index as u64)) else {
            warn!("Trend date overflow at message {}", s.source_index);
            break;
        };
        for &label in &observed {
            points.push(TrendPoint { date, label, count: usize::from(label == own) });
        }
    }
    points
}

/// Run the whole sentiment stage over the cleaned messages.
pub fn analyze(
    messages: &[CleanedMessage],
    classifier: &dyn Classifier,
    opts: &AnalyzeOptions,
) -> Result<SentimentReport> {
    if messages.is_empty() {
        warn!("No messages to analyze.");
        return Ok(SentimentReport::default());
    }

    let max_chars = opts.max_chunk_chars.min(classifier.max_input_chars()).max(1);
    let chunks = chunk_messages(messages, max_chars);
    info!(
        "🪚 Split {} messages into {} chunks (≤{} chars) for {}",
        messages.len(),
        chunks.len(),
        max_chars,
        classifier.name()
    );

    let started = Instant::now();
    let pb = progress_bar(chunks.len(), opts.show_progress);
    let chunk_labels = classify_all(&chunks, classifier, opts.concurrency, &pb)?;
    pb.finish_with_message("done");

    let failed_chunks = chunk_labels.iter().filter(|c| c.label.is_none()).count();
    info!(
        "🧠 Classified {} chunks in {}ms ({} failed)",
        chunk_labels.len(),
        started.elapsed().as_millis(),
        failed_chunks
    );

    let sentiments = aggregate_all(messages.len(), &chunk_labels);
    let unavailable: Vec<usize> = sentiments
        .iter()
        .filter(|s| s.verdict == Verdict::Unavailable)
        .map(|s| s.source_index)
        .collect();
    if !unavailable.is_empty() {
        warn!("⚠️ No sentiment available for {} messages", unavailable.len());
    }

    let category_counts = category_counts(&sentiments);
    let trend = sentiment_trend(&sentiments, opts.trend_start);
    for (label, n) in &category_counts {
        info!("  {label}: {n}");
    }

    Ok(SentimentReport {
        sentiments,
        category_counts,
        trend,
        unavailable,
        chunk_count: chunks.len(),
        failed_chunks,
    })
}
