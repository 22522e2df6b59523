//! Terminal rendering of status lines and the final report.

use chrono::{DateTime, Local};
use colored::{Color, Colorize};
use phish_analyzer::{AnalysisOutcome, AnalysisRequest, PipelineState, RiskLevel, RiskMatch};

const RULE: &str = "==================================================";
const THIN_RULE: &str = "--------------------------------------------------";

/// How the model text is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Plain text with keywords coloured
    Terminal,
    /// The escaped HTML markup produced by the formatter
    Markup,
}

pub fn status_line(state: PipelineState, message: &str) -> String {
    let stamp = Local::now().format("%H:%M:%S").to_string();
    let message = match state {
        PipelineState::Done => message.green().bold(),
        PipelineState::Failed => message.red().bold(),
        _ => message.yellow().bold(),
    };
    format!("{} {}", format!("[{}]", stamp).dimmed(), message)
}

/// Full report for a finished run.
pub fn render(
    request: &AnalysisRequest,
    outcome: &AnalysisOutcome,
    finished_at: DateTime<Local>,
    mode: TextMode,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", RULE.bright_cyan()));
    out.push_str(&format!(
        "{}\n",
        format!(
            "ANALYSIS REPORT - {}",
            finished_at.format("%Y-%m-%d %H:%M:%S")
        )
        .bold()
    ));
    out.push_str(&format!("{}\n", RULE.bright_cyan()));
    out.push_str(&format!("TARGET: {}\n", request.url()));
    out.push_str(&format!("MODEL:  {}\n", request.model()));
    out.push('\n');

    match outcome {
        AnalysisOutcome::Success {
            raw_text,
            formatted,
        } => {
            out.push_str(&format!("{}\n", "ANALYSIS COMPLETE".green().bold()));
            out.push_str(&format!("{}\n", THIN_RULE));
            match mode {
                TextMode::Terminal => out.push_str(&highlight(raw_text, &formatted.matches)),
                TextMode::Markup => out.push_str(&formatted.text),
            }
            out.push('\n');
            out.push_str(&format!("{}\n", THIN_RULE));
            out.push_str(&format!(
                "Risk indicators: {}\n",
                risk_summary(&formatted.risk_levels)
            ));
        }
        AnalysisOutcome::Failure {
            kind,
            detail,
            failed_at,
        } => {
            out.push_str(&format!("{}\n", "ANALYSIS FAILED".red().bold()));
            out.push_str(&format!("{}\n", THIN_RULE));
            out.push_str(&format!("Error: {}\n", kind));
            out.push_str(&format!("Detail: {}\n", detail));
            out.push_str(&format!("Stopped while: {}\n", failed_at.status_text()));
        }
    }

    out
}

/// Colour every keyword occurrence in `raw`. Overlapping occurrences keep
/// the leftmost one, as in the markup.
pub fn highlight(raw: &str, matches: &[RiskMatch]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;

    for m in matches {
        if m.start < pos {
            continue;
        }
        out.push_str(&raw[pos..m.start]);
        out.push_str(
            &raw[m.start..m.end]
                .color(level_color(m.level))
                .bold()
                .to_string(),
        );
        pos = m.end;
    }
    out.push_str(&raw[pos..]);

    out
}

fn risk_summary(levels: &[RiskLevel]) -> String {
    if levels.is_empty() {
        return "none detected".dimmed().to_string();
    }
    levels
        .iter()
        .filter_map(|level| {
            level
                .keyword()
                .map(|kw| kw.color(level_color(*level)).bold().to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn level_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low | RiskLevel::Safe | RiskLevel::Legitimate => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High | RiskLevel::Suspicious => Color::TrueColor {
            r: 204,
            g: 102,
            b: 0,
        },
        RiskLevel::Critical | RiskLevel::Dangerous | RiskLevel::Phishing => Color::Red,
        RiskLevel::Unknown => Color::White,
    }
}
