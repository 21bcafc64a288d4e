//! Charts and the HTML report.
//!
//! Four independent SVG charts are drawn with Plotters; `report.html` ties
//! them together with a summary and the per-message labels. A chart with no
//! data is skipped rather than drawn empty.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use plotters::element::Pie;
use plotters::prelude::*;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::model::{CleanedMessage, QueryCount, SentimentLabel, SentimentReport, TrendPoint};

pub const TOP_QUERY_LIMIT: usize = 10;
const QUERY_LABEL_CHARS: usize = 40;

pub struct RenderInput<'a> {
    pub messages: &'a [CleanedMessage],
    pub query_counts: &'a [QueryCount],
    pub report: &'a SentimentReport,
    pub run_id: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedOutputs {
    pub top_queries: Option<PathBuf>,
    pub distribution: Option<PathBuf>,
    pub share: Option<PathBuf>,
    pub trend: Option<PathBuf>,
    pub report: PathBuf,
}

impl RenderedOutputs {
    pub fn charts(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.top_queries, &self.distribution, &self.share, &self.trend]
            .into_iter()
            .flatten()
    }
}

fn label_color(label: SentimentLabel) -> RGBColor {
    match label {
        SentimentLabel::Positive => RGBColor(50, 205, 50),
        SentimentLabel::Negative => RGBColor(255, 99, 71),
        SentimentLabel::Neutral => RGBColor(160, 160, 160),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// The `n` most frequent queries, highest first; ties keep input order.
pub fn top_queries(counts: &[QueryCount], n: usize) -> Vec<QueryCount> {
    let mut ranked = counts.to_vec();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

// ================================
// Charts
// ================================

fn draw_top_queries(path: &Path, queries: &[QueryCount]) -> Result<()> {
    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = queries.len() as i32;
    let max = queries.iter().map(|q| q.count).max().unwrap_or(1) as f64;
    // highest count drawn at the top
    let labels: Vec<String> = queries
        .iter()
        .rev()
        .map(|q| truncate_chars(&q.message, QUERY_LABEL_CHARS))
        .collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Top 10 User Queries", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(320)
        .build_cartesian_2d(0f64..max * 1.1, (0i32..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Frequency")
        .y_desc("Query")
        .y_labels(queries.len())
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    let bar_color = RGBColor(49, 130, 189);
    chart.draw_series(queries.iter().rev().enumerate().map(|(i, q)| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(i)), (q.count as f64, SegmentValue::Exact(i + 1))],
            bar_color.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_distribution(path: &Path, counts: &[(SentimentLabel, usize)]) -> Result<()> {
    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let k = counts.len() as i32;
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(1) as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sentiment Distribution", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0i32..k).into_segmented(), 0u32..max + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Sentiment")
        .y_desc("Frequency")
        .x_labels(counts.len())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => counts
                .get(*i as usize)
                .map(|(l, _)| l.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, (label, n))| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *n as u32)],
            label_color(*label).filled(),
        );
        bar.set_margin(0, 0, 20, 20);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_share(path: &Path, counts: &[(SentimentLabel, usize)]) -> Result<()> {
    let root = SVGBackend::new(path, (700, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Sentiment Distribution by Category", ("sans-serif", 28))?;

    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.36;
    let sizes: Vec<f64> = counts.iter().map(|(_, n)| *n as f64).collect();
    let colors: Vec<RGBColor> = counts.iter().map(|(l, _)| label_color(*l)).collect();
    let labels: Vec<String> = counts.iter().map(|(l, _)| l.to_string()).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.donut_hole(radius * 0.45);
    pie.label_style(("sans-serif", 20).into_font().color(&BLACK));
    pie.percentages(("sans-serif", radius * 0.08).into_font().color(&BLACK));
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

fn draw_trend(path: &Path, trend: &[TrendPoint], labels: &[SentimentLabel]) -> Result<()> {
    let (Some(first), Some(last)) = (trend.first(), trend.last()) else {
        return Ok(());
    };
    let origin = first.date;
    let span = (last.date - origin).num_days().max(1) as i32;
    let max = trend.iter().map(|p| p.count).max().unwrap_or(1) as f64;
    let day_of = |d: NaiveDate| (d - origin).num_days() as i32;

    let root = SVGBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sentiment Trends Over Time", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(0i32..span, 0f64..max * 1.2)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Number of Queries")
        .x_labels(8)
        .x_label_formatter(&|d| {
            origin
                .checked_add_days(Days::new((*d).max(0) as u64))
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .draw()?;

    for &label in labels {
        let color = label_color(label);
        let points: Vec<(i32, f64)> = trend
            .iter()
            .filter(|p| p.label == label)
            .map(|p| (day_of(p.date), p.count as f64))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

// ================================
// HTML report
// ================================

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_report(path: &Path, input: &RenderInput<'_>, outputs: &RenderedOutputs) -> Result<()> {
    info!("🖼️ Writing HTML report: {}", path.display());
    let report = input.report;

    let mut html = String::new();
    html.push_str(r#"<!doctype html>
<html>
<head>
<meta charset="utf-8" />
<title>Chat Sentiment Report</title>
<style>
body { font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; margin: 20px; }
table { border-collapse: collapse; margin-bottom: 16px; }
th, td { padding: 6px 8px; border-bottom: 1px solid #ddd; text-align: left; }
img { max-width: 100%; margin: 12px 0; border: 1px solid #eee; }
.small { color: #666; font-size: 12px; }
.POSITIVE { color: #228b22; } .NEGATIVE { color: #d2402a; } .NEUTRAL { color: #777; }
</style>
</head>
<body>
<h1>Chat Sentiment Report</h1>
"#);
    html.push_str(&format!(r#"<p class="small">Run {}</p>"#, html_escape(input.run_id)));

    if input.messages.is_empty() {
        html.push_str("<p>No messages to visualize.</p>\n</body>\n</html>\n");
        File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?
            .write_all(html.as_bytes())?;
        return Ok(());
    }

    html.push_str("<h2>Summary</h2>\n<table>\n");
    let mut row = |k: &str, v: String| {
        html.push_str(&format!("<tr><th>{k}</th><td>{v}</td></tr>\n"));
    };
    row("Messages", input.messages.len().to_string());
    row("Chunks", report.chunk_count.to_string());
    row("Failed chunks", report.failed_chunks.to_string());
    for (label, n) in &report.category_counts {
        row(label.as_str(), n.to_string());
    }
    row("No sentiment available", report.unavailable.len().to_string());
    html.push_str("</table>\n");

    for chart in outputs.charts() {
        let name = file_name(chart);
        html.push_str(&format!(r#"<img src="{name}" alt="{name}" />"#));
        html.push('\n');
    }

    if !report.unavailable.is_empty() {
        html.push_str("<h2>No sentiment available</h2>\n<p class=\"small\">Every chunk of these messages failed classification; they are left out of the sentiment charts.</p>\n<ul>\n");
        for &i in &report.unavailable {
            if let Some(m) = input.messages.get(i) {
                html.push_str(&format!("<li>#{i} {}</li>\n", html_escape(&truncate_chars(&m.message, 200))));
            }
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h2>Messages</h2>\n<table>\n<thead><tr><th>#</th><th>Client</th><th>Message</th><th>Sentiment</th></tr></thead>\n<tbody>\n");
    for s in &report.sentiments {
        let Some(m) = input.messages.get(s.source_index) else { continue };
        let label = s.verdict.label().map(|l| l.as_str()).unwrap_or("n/a");
        html.push_str(&format!(
            r#"<tr><td>{i}</td><td>{client}</td><td>{text}</td><td class="{label}">{label}</td></tr>"#,
            i = s.source_index,
            client = html_escape(&m.client_id),
            text = html_escape(&truncate_chars(&m.message, 200)),
            label = label,
        ));
        html.push('\n');
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    let mut f = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    f.write_all(html.as_bytes())?;
    Ok(())
}

// ================================
// Entry point
// ================================

pub fn render_all<P: AsRef<Path>>(out_dir: P, input: &RenderInput<'_>) -> Result<RenderedOutputs> {
    let out_dir = out_dir.as_ref();
    create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let report = input.report;
    let mut outputs = RenderedOutputs { report: out_dir.join("report.html"), ..Default::default() };

    let top = top_queries(input.query_counts, TOP_QUERY_LIMIT);
    if top.is_empty() {
        warn!("No queries to chart; skipping top queries");
    } else {
        let path = out_dir.join("top_queries.svg");
        draw_top_queries(&path, &top).context("Failed to draw top queries")?;
        outputs.top_queries = Some(path);
    }

    if report.category_counts.is_empty() {
        warn!("No sentiment labels to chart; skipping sentiment charts");
    } else {
        let path = out_dir.join("sentiment_distribution.svg");
        draw_distribution(&path, &report.category_counts).context("Failed to draw sentiment distribution")?;
        outputs.distribution = Some(path);

        let path = out_dir.join("sentiment_share.svg");
        draw_share(&path, &report.category_counts).context("Failed to draw sentiment share")?;
        outputs.share = Some(path);
    }

    if report.trend.is_empty() {
        warn!("No dated sentiment points; skipping sentiment trend");
    } else {
        let labels: Vec<SentimentLabel> = report.category_counts.iter().map(|(l, _)| *l).collect();
        let path = out_dir.join("sentiment_trend.svg");
        draw_trend(&path, &report.trend, &labels).context("Failed to draw sentiment trend")?;
        outputs.trend = Some(path);
    }

    write_report(&outputs.report, input, &outputs)?;
    for chart in outputs.charts() {
        info!("📊 {}", chart.display());
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_queries_keep_first_seen_order_on_ties() {
        let counts: Vec<QueryCount> = [("a", 1), ("b", 3), ("c", 1), ("d", 3)]
            .into_iter()
            .map(|(m, count)| QueryCount { message: m.into(), count })
            .collect();
        let top: Vec<_> = top_queries(&counts, 3).into_iter().map(|q| q.message).collect();
        assert_eq!(top, vec!["b", "d", "a"]);
    }

    #[test]
    fn long_labels_are_truncated_on_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ééééé", 3), "éé…");
    }
}
