mod common;

use std::fs;

use chatsent::clean::count_queries;
use chatsent::model::SentimentReport;
use chatsent::render::{render_all, RenderInput};
use chatsent::sentiment::analyze;
use common::{messages, options, ScriptedClassifier};

#[test]
fn renders_four_charts_and_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let msgs = messages(&["pppp good", "nnnn bad", "zzzz meh", "pppp fine"]);
    let counts = count_queries(["pppp good", "pppp good", "nnnn bad", "zzzz meh", "pppp fine"]);
    let report = analyze(&msgs, &ScriptedClassifier::new(512), &options(512, 2)).unwrap();

    let outputs = render_all(
        dir.path(),
        &RenderInput { messages: &msgs, query_counts: &counts, report: &report, run_id: "test-run" },
    )
    .unwrap();

    assert_eq!(outputs.charts().count(), 4);
    for chart in outputs.charts() {
        let svg = fs::read_to_string(chart).unwrap();
        assert!(svg.contains("<svg"), "{} is not an SVG", chart.display());
    }

    let html = fs::read_to_string(&outputs.report).unwrap();
    assert!(html.contains("test-run"));
    assert!(html.contains("sentiment_trend.svg"));
    assert!(html.contains(r#"<td class="NEGATIVE">NEGATIVE</td>"#));
}

#[test]
fn empty_dataset_renders_no_charts() {
    let dir = tempfile::tempdir().unwrap();
    let report = SentimentReport::default();
    let outputs = render_all(
        dir.path().join("out"),
        &RenderInput { messages: &[], query_counts: &[], report: &report, run_id: "empty" },
    )
    .unwrap();

    assert_eq!(outputs.charts().count(), 0);
    let html = fs::read_to_string(&outputs.report).unwrap();
    assert!(html.contains("No messages to visualize."));
}

#[test]
fn unavailable_messages_are_listed_but_not_charted() {
    let dir = tempfile::tempdir().unwrap();
    let msgs = messages(&["xxxxxxxxxxxx", "pppp <ok>"]);
    let report = analyze(&msgs, &ScriptedClassifier::new(4), &options(4, 1)).unwrap();
    assert_eq!(report.unavailable, vec![0]);

    let outputs = render_all(
        dir.path(),
        &RenderInput { messages: &msgs, query_counts: &[], report: &report, run_id: "r" },
    )
    .unwrap();

    assert!(outputs.top_queries.is_none());
    assert!(outputs.distribution.is_some());
    let html = fs::read_to_string(&outputs.report).unwrap();
    assert!(html.contains("No sentiment available"));
    assert!(html.contains("#0 xxxxxxxxxxxx"));
    assert!(html.contains("pppp &lt;ok&gt;"));
}
