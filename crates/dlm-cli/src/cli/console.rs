//! Console rendering of the live aggregate view.
//!
//! The renderer ticks once per second, beats the liveness heartbeat and
//! redraws the transfer table, the overall line and the recent log.

use dlm_core::context::PresentationSink;
use dlm_core::control::Liveness;
use dlm_core::model::Identity;
use dlm_core::progress::{AggregateView, ProgressAggregator};
use dlm_core::scheduler::RunReport;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Sink for `dlm run`. Completion notifications go to the log.
pub struct ConsoleSink;

impl PresentationSink for ConsoleSink {
    fn on_completion_notify(&self, identity: &Identity, display_name: &str) {
        tracing::info!(identity = %identity, "download complete: {}", display_name);
    }
}

/// Redraw every `every` until `stop` fires, then draw one final frame.
pub async fn render_loop(
    progress: Arc<ProgressAggregator>,
    liveness: Liveness,
    every: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let clear = std::io::stdout().is_terminal();
    let mut tick = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                liveness.beat();
                draw(&progress.snapshot(), clear);
            }
            _ = &mut stop => break,
        }
    }
    draw(&progress.snapshot(), clear);
}

fn draw(view: &AggregateView, clear: bool) {
    let mut out = std::io::stdout().lock();
    if clear {
        let _ = out.write_all(b"\x1b[2J\x1b[H");
    }
    let _ = out.write_all(render(view).as_bytes());
    let _ = out.flush();
}

pub fn render(view: &AggregateView) -> String {
    let mut s = String::new();
    for t in view.active() {
        s.push_str(&format!(
            "{:>3}%  {:<40}  {:>10}  ETA {}\n",
            t.percentage,
            truncate(&t.display_name, 40),
            format_rate(t.throughput_bps),
            format_eta(t.eta_secs)
        ));
    }
    s.push_str(&format!(
        "Total: {} / {} ({:.1}%)  {}  ETA {}\n",
        format_bytes(view.total_received),
        format_bytes(view.total_expected),
        view.percentage,
        format_rate(view.throughput_bps),
        format_eta(view.eta_secs)
    ));
    for line in &view.recent_log {
        s.push_str(line);
        s.push('\n');
    }
    s
}

pub fn summary_line(report: &RunReport) -> String {
    format!(
        "{} completed, {} failed, {} not started",
        report.completed.len(),
        report.failed.len(),
        report.not_dispatched.len()
    )
}

pub fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if n < 1024 {
        return format!("{} B", n);
    }
    let mut value = n as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_rate(bps: Option<f64>) -> String {
    match bps {
        Some(b) if b.is_finite() && b >= 0.0 => format!("{}/s", format_bytes(b as u64)),
        _ => "?".to_string(),
    }
}

pub fn format_eta(secs: Option<f64>) -> String {
    let Some(secs) = secs.filter(|s| s.is_finite() && *s >= 0.0) else {
        return "?".to_string();
    };
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn eta_formats() {
        assert_eq!(format_eta(None), "?");
        assert_eq!(format_eta(Some(f64::INFINITY)), "?");
        assert_eq!(format_eta(Some(10.0)), "10s");
        assert_eq!(format_eta(Some(125.0)), "2m05s");
        assert_eq!(format_eta(Some(3723.0)), "1h02m03s");
    }

    #[test]
    fn rate_unknown_is_question_mark() {
        assert_eq!(format_rate(None), "?");
        assert_eq!(format_rate(Some(50.0)), "50 B/s");
    }

    #[test]
    fn render_shows_active_total_and_log() {
        let progress = ProgressAggregator::new();
        progress.on_total_expected(1000);
        progress.on_started("a", "a.1080p.mkv", 1000);
        progress.on_progress("a", 500, 50);
        progress.push_log("[12:00:00] [INF]: 1 available files found in 1 batches");

        let out = render(&progress.snapshot());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(" 50%  a.1080p.mkv"));
        assert!(lines[1].starts_with("Total: 500 B / 1000 B (50.0%)"));
        assert!(lines[2].ends_with("1 available files found in 1 batches"));
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "x".repeat(50);
        let t = truncate(&name, 40);
        assert_eq!(t.chars().count(), 40);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn summary_counts() {
        let report = RunReport {
            completed: vec!["a".into(), "b".into()],
            failed: vec![("c".into(), "HTTP 404".into())],
            not_dispatched: Vec::new(),
            peak_active: 2,
        };
        assert_eq!(summary_line(&report), "2 completed, 1 failed, 0 not started");
    }
}
