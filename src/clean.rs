//! Cleaning stage: pull human turns out of the export, normalize them,
//! drop exact duplicates and near-empty messages.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::model::{CleanedMessage, QueryCount, RawRecord};

/// Messages this short (in chars) or shorter are dropped after dedup.
pub const MIN_MESSAGE_CHARS: usize = 3;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("static pattern"));

// ================================
// Export loading
// ================================

/// One conversation turn. Only the human side matters here; every other
/// role or field is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub human: Option<String>,
}

/// The raw export: client id -> ordered turns, in file order.
#[derive(Debug, Clone, Default)]
pub struct ChatExport {
    pub clients: Vec<(String, Vec<Turn>)>,
}

impl ChatExport {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).context("Export is not a JSON object of client histories")?;
        let mut clients = Vec::with_capacity(map.len());
        for (client_id, turns) in map {
            let turns: Vec<Turn> = serde_json::from_value(turns)
                .with_context(|| format!("Malformed turn list for client {client_id:?}"))?;
            clients.push((client_id, turns));
        }
        Ok(Self { clients })
    }
}

pub fn load_export<P: AsRef<Path>>(path: P) -> Result<ChatExport> {
    let path = path.as_ref();
    info!("📄 Reading chat export: {}", path.display());
    let mut text = String::new();
    File::open(path)
        .with_context(|| format!("Failed to open export {}", path.display()))?
        .read_to_string(&mut text)
        .context("Failed to read export as UTF-8")?;
    ChatExport::from_json_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

// ================================
// Extraction + normalization
// ================================

pub fn extract_human_messages(export: &ChatExport) -> Vec<RawRecord> {
    export
        .clients
        .iter()
        .flat_map(|(client_id, turns)| {
            turns.iter().filter_map(move |t| {
                t.human.as_ref().map(|h| RawRecord {
                    client_id: client_id.clone(),
                    human_message: h.clone(),
                })
            })
        })
        .collect()
}

/// Lowercase, keep only `[a-z0-9]` and whitespace, trim, and collapse inner
/// whitespace runs to a single space. Idempotent.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable dedup on `message`; the first occurrence wins.
pub fn dedup_first_wins(messages: Vec<CleanedMessage>) -> Vec<CleanedMessage> {
    let mut seen = HashSet::<String>::new();
    let mut out = Vec::with_capacity(messages.len());
    for m in messages {
        if seen.insert(m.message.clone()) {
            out.push(m);
        }
    }
    out
}

pub fn drop_short(messages: Vec<CleanedMessage>) -> Vec<CleanedMessage> {
    messages
        .into_iter()
        .filter(|m| m.message.chars().count() >= MIN_MESSAGE_CHARS)
        .collect()
}

/// Frequency of each message, highest first; equal counts keep first-seen order.
pub fn count_queries<'a, I>(messages: I) -> Vec<QueryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut slot = HashMap::<&str, usize>::new();
    let mut counts: Vec<QueryCount> = Vec::new();
    for m in messages {
        match slot.get(m) {
            Some(&i) => counts[i].count += 1,
            None => {
                slot.insert(m, counts.len());
                counts.push(QueryCount { message: m.to_string(), count: 1 });
            }
        }
    }
    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ================================
// Stage entry point
// ================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub extracted: usize,
    pub deduplicated: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CleaningOutput {
    pub messages: Vec<CleanedMessage>,
    /// Counted over normalized, length-filtered messages *before* dedup, so
    /// repeated queries rank above one-offs.
    pub query_counts: Vec<QueryCount>,
    pub stats: CleaningStats,
}

pub fn clean_export(export: &ChatExport) -> CleaningOutput {
    let raw = extract_human_messages(export);
    let extracted = raw.len();

    let normalized: Vec<CleanedMessage> = raw
        .into_iter()
        .map(|r| CleanedMessage {
            client_id: r.client_id,
            message: normalize_text(&r.human_message),
        })
        .collect();

    let query_counts = count_queries(
        normalized
            .iter()
            .map(|m| m.message.as_str())
            .filter(|m| m.chars().count() >= MIN_MESSAGE_CHARS),
    );

    let deduped = dedup_first_wins(normalized);
    let deduplicated = deduped.len();
    let messages = drop_short(deduped);

    let stats = CleaningStats { extracted, deduplicated, kept: messages.len() };
    info!(
        "🧹 Cleaned {} human messages -> {} unique -> {} kept",
        stats.extracted, stats.deduplicated, stats.kept
    );
    for m in messages.iter().take(5) {
        debug!("  {} | {}", m.client_id, m.message);
    }

    CleaningOutput { messages, query_counts, stats }
}

// ================================
// Artifact I/O
// ================================

fn write_json_list<T: Serialize, P: AsRef<Path>>(items: &[T], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, items)?;
    w.flush()?;
    Ok(())
}

fn read_json_list<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn write_cleaned<P: AsRef<Path>>(path: P, messages: &[CleanedMessage]) -> Result<()> {
    info!("💾 Writing {} cleaned messages: {}", messages.len(), path.as_ref().display());
    write_json_list(messages, path)
}

pub fn read_cleaned<P: AsRef<Path>>(path: P) -> Result<Vec<CleanedMessage>> {
    info!("📄 Reading cleaned messages: {}", path.as_ref().display());
    read_json_list(path)
}

pub fn write_query_counts<P: AsRef<Path>>(path: P, counts: &[QueryCount]) -> Result<()> {
    write_json_list(counts, path)
}

pub fn read_query_counts<P: AsRef<Path>>(path: P) -> Result<Vec<QueryCount>> {
    read_json_list(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(client: &str, text: &str) -> CleanedMessage {
        CleanedMessage { client_id: client.into(), message: text.into() }
    }

    #[test]
    fn normalize_strips_and_collapses() {
        assert_eq!(normalize_text("Hello!!  World"), "hello world");
        assert_eq!(normalize_text("  Wait...\tWHAT?\n"), "wait what");
        assert_eq!(normalize_text("café #42"), "caf 42");
        assert_eq!(normalize_text("?!"), "");
    }

    #[test]
    fn extraction_skips_turns_without_human() {
        let export = ChatExport::from_json_str(
            r#"{"b": [{"human": "one"}, {"ai": "reply"}], "a": [{"human": "two", "ai": "x"}]}"#,
        )
        .unwrap();
        let raw = extract_human_messages(&export);
        let got: Vec<_> = raw.iter().map(|r| (r.client_id.as_str(), r.human_message.as_str())).collect();
        assert_eq!(got, vec![("b", "one"), ("a", "two")]);
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let out = dedup_first_wins(vec![
            msg("c1", "alpha"),
            msg("c2", "beta"),
            msg("c3", "alpha"),
            msg("c4", "gamma"),
        ]);
        let got: Vec<_> = out.iter().map(|m| (m.client_id.as_str(), m.message.as_str())).collect();
        assert_eq!(got, vec![("c1", "alpha"), ("c2", "beta"), ("c4", "gamma")]);
    }

    #[test]
    fn short_messages_are_dropped() {
        let out = drop_short(vec![msg("c", ""), msg("c", "ok"), msg("c", "yes")]);
        assert_eq!(out, vec![msg("c", "yes")]);
    }

    #[test]
    fn query_counts_rank_by_count_then_first_seen() {
        let counts = count_queries(["b", "a", "a", "c", "b", "d"]);
        let got: Vec<_> = counts.iter().map(|q| (q.message.as_str(), q.count)).collect();
        assert_eq!(got, vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn malformed_turns_are_rejected() {
        assert!(ChatExport::from_json_str(r#"{"c1": {"human": "x"}}"#).is_err());
        assert!(ChatExport::from_json_str("[1, 2]").is_err());
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(s in "\\PC{0,64}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }
    }
}
