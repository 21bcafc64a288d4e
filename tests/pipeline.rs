mod common;

use std::sync::atomic::Ordering;

use chatsent::model::{SentimentLabel, Verdict};
use chatsent::sentiment::analyze;
use common::{messages, options, ScriptedClassifier};

use SentimentLabel::*;

fn verdicts(texts: &[&str], max_chunk_chars: usize, concurrency: usize) -> Vec<Verdict> {
    let classifier = ScriptedClassifier::new(512);
    let report = analyze(&messages(texts), &classifier, &options(max_chunk_chars, concurrency)).unwrap();
    report.sentiments.iter().map(|s| s.verdict).collect()
}

#[test]
fn mixed_long_message_ties_to_first_chunk_label() {
    let got = verdicts(&["ppppnnnnppppnnnn"], 4, 2);
    assert_eq!(got, vec![Verdict::Label(Positive)]);
}

#[test]
fn majority_of_chunks_decides() {
    let got = verdicts(&["nnnnnnnnnnnnpppp"], 4, 2);
    assert_eq!(got, vec![Verdict::Label(Negative)]);
}

#[test]
fn all_chunks_failing_is_reported_not_defaulted() {
    let classifier = ScriptedClassifier::new(512);
    let msgs = messages(&["xxxxxxxx", "pppp", "xxxxnnnn"]);
    let report = analyze(&msgs, &classifier, &options(4, 1)).unwrap();

    let got: Vec<_> = report.sentiments.iter().map(|s| s.verdict).collect();
    assert_eq!(got, vec![Verdict::Unavailable, Verdict::Label(Positive), Verdict::Label(Negative)]);
    assert_eq!(report.unavailable, vec![0]);
    assert_eq!(report.failed_chunks, 3);
    assert_eq!(report.chunk_count, 5);
    assert_eq!(report.category_counts, vec![(Positive, 1), (Negative, 1)]);
    assert!(report.trend.iter().all(|p| p.date != chatsent::sentiment::default_trend_start()));
}

#[test]
fn batched_and_per_message_runs_agree() {
    let texts = ["ppppnnnn", "nnnnnnnnpppp", "zzzz", "xxxx", "pppppppppppp", "ab"];
    let batched = verdicts(&texts, 4, 4);
    let one_by_one: Vec<Verdict> = texts.iter().flat_map(|t| verdicts(&[t], 4, 1)).collect();
    assert_eq!(batched, one_by_one);
    assert_eq!(batched.len(), texts.len());
}

#[test]
fn parallelism_does_not_change_labels() {
    let texts: Vec<String> = (0..50)
        .map(|i| match i % 3 {
            0 => "p".repeat(10 + i),
            1 => format!("{}{}", "n".repeat(12), "p".repeat(i)),
            _ => "x".repeat(i + 1),
        })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    assert_eq!(verdicts(&refs, 6, 1), verdicts(&refs, 6, 8));
}

#[test]
fn classifier_never_sees_more_than_its_ceiling() {
    let classifier = ScriptedClassifier::new(16);
    let long = "p".repeat(1000);
    let report = analyze(&messages(&[&long]), &classifier, &options(512, 2)).unwrap();

    assert_eq!(classifier.longest_input.load(Ordering::SeqCst), 16);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 63);
    assert_eq!(report.chunk_count, 63);
    assert_eq!(report.sentiments[0].verdict, Verdict::Label(Positive));
}

#[test]
fn lexicon_classifier_runs_end_to_end() {
    let classifier = chatsent::LexiconClassifier::new();
    let msgs = messages(&["thanks this works great", "the app crashed again", "what are your hours"]);
    let report = analyze(&msgs, &classifier, &options(512, 2)).unwrap();
    let got: Vec<_> = report.sentiments.iter().map(|s| s.verdict).collect();
    assert_eq!(
        got,
        vec![Verdict::Label(Positive), Verdict::Label(Negative), Verdict::Label(Neutral)]
    );
}
