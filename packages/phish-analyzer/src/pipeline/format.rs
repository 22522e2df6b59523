//! Risk keyword tagging of model output.
//!
//! The model is asked to answer with fixed verdict phrases. This module finds
//! them (case-sensitive substring scan, each keyword independent of the
//! others) and renders the raw text as escaped markup with every occurrence
//! highlighted. It does not pick an overall verdict for the operator.

use serde::{Deserialize, Serialize};

/// Risk classification attached to a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
    Safe,
    Suspicious,
    Dangerous,
    Phishing,
    Legitimate,
}

impl RiskLevel {
    /// Scan order of the tagged keywords.
    pub const TAGGED: [RiskLevel; 9] = [
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
        Self::Safe,
        Self::Suspicious,
        Self::Dangerous,
        Self::Phishing,
        Self::Legitimate,
    ];

    /// Marker the model emits for this level.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => None,
            Self::Low => Some("LOW RISK"),
            Self::Medium => Some("MEDIUM RISK"),
            Self::High => Some("HIGH RISK"),
            Self::Critical => Some("CRITICAL RISK"),
            Self::Safe => Some("SAFE"),
            Self::Suspicious => Some("SUSPICIOUS"),
            Self::Dangerous => Some("DANGEROUS"),
            Self::Phishing => Some("PHISHING"),
            Self::Legitimate => Some("LEGITIMATE"),
        }
    }

    /// Highlight colour as `#rrggbb`.
    pub fn color_hex(&self) -> &'static str {
        match self {
            Self::Low | Self::Safe | Self::Legitimate => "#00cc00",
            Self::Medium => "#cccc00",
            Self::High | Self::Suspicious => "#cc6600",
            Self::Critical | Self::Dangerous | Self::Phishing => "#cc0000",
            Self::Unknown => "#888888",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Safe => "safe",
            Self::Suspicious => "suspicious",
            Self::Dangerous => "dangerous",
            Self::Phishing => "phishing",
            Self::Legitimate => "legitimate",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One keyword occurrence. `start..end` is a byte range in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMatch {
    pub level: RiskLevel,
    pub start: usize,
    pub end: usize,
}

/// Display-ready model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResult {
    /// Escaped markup with highlighted keywords
    pub text: String,

    /// Every keyword occurrence, ordered by position
    pub matches: Vec<RiskMatch>,

    /// Distinct levels found, ordered by first occurrence
    pub risk_levels: Vec<RiskLevel>,
}

impl FormattedResult {
    /// Level whose keyword appears first in the text, or `Unknown`.
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_levels
            .first()
            .copied()
            .unwrap_or(RiskLevel::Unknown)
    }

    pub fn has_level(&self, level: RiskLevel) -> bool {
        self.risk_levels.contains(&level)
    }
}

/// Tag risk keywords in `raw` and render it as markup.
///
/// The raw text is never altered: `matches` index into it, and `text`
/// decodes back to it once the spans and `<br>` are removed.
pub fn format_result(raw: &str) -> FormattedResult {
    let mut matches: Vec<RiskMatch> = RiskLevel::TAGGED
        .iter()
        .filter_map(|level| level.keyword().map(|kw| (*level, kw)))
        .flat_map(|(level, kw)| {
            raw.match_indices(kw).map(move |(start, m)| RiskMatch {
                level,
                start,
                end: start + m.len(),
            })
        })
        .collect();

    // Position order; longer match first on a tie
    matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut risk_levels = Vec::new();
    for m in &matches {
        if !risk_levels.contains(&m.level) {
            risk_levels.push(m.level);
        }
    }

    FormattedResult {
        text: render_markup(raw, &matches),
        matches,
        risk_levels,
    }
}

/// Escape text for embedding in HTML. Newlines become `<br>`.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
}

fn render_markup(raw: &str, matches: &[RiskMatch]) -> String {
    let mut out = String::with_capacity(raw.len() + matches.len() * 64);
    let mut pos = 0;

    for m in matches {
        // Overlapping occurrence: the leftmost one is already highlighted
        if m.start < pos {
            continue;
        }
        push_escaped(&mut out, &raw[pos..m.start]);
        out.push_str(&format!(
            r#"<span class="risk risk-{}" style="color: {}; font-weight: bold;">"#,
            m.level,
            m.level.color_hex()
        ));
        push_escaped(&mut out, &raw[m.start..m.end]);
        out.push_str("</span>");
        pos = m.end;
    }
    push_escaped(&mut out, &raw[pos..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(level: RiskLevel, keyword: &str) -> String {
        format!(
            r#"<span class="risk risk-{}" style="color: {}; font-weight: bold;">{}</span>"#,
            level,
            level.color_hex(),
            keyword
        )
    }

    #[test]
    fn test_low_risk_and_safe_both_annotated() {
        let result = format_result("Overall: LOW RISK\nRecommendation: SAFE");

        assert_eq!(
            result.text,
            format!(
                "Overall: {}<br>Recommendation: {}",
                span(RiskLevel::Low, "LOW RISK"),
                span(RiskLevel::Safe, "SAFE")
            )
        );
        assert_eq!(result.risk_levels, vec![RiskLevel::Low, RiskLevel::Safe]);
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn test_suspicious_is_highlighted() {
        let raw = "Recommendation: SUSPICIOUS risk due to urgency language.";
        let result = format_result(raw);

        assert!(result.text.contains(&span(RiskLevel::Suspicious, "SUSPICIOUS")));
        assert_eq!(result.risk_level(), RiskLevel::Suspicious);
        assert_eq!(result.matches[0].start, 16);
        assert_eq!(&raw[result.matches[0].start..result.matches[0].end], "SUSPICIOUS");
    }

    #[test]
    fn test_every_occurrence_is_recorded() {
        let result = format_result("SAFE here, SAFE there");
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.risk_levels, vec![RiskLevel::Safe]);
        assert_eq!(result.text.matches("<span").count(), 2);
    }

    #[test]
    fn test_conflicting_verdicts_coexist() {
        let result = format_result("Looks LEGITIMATE but the form is PHISHING, so not SAFE.");

        assert_eq!(
            result.risk_levels,
            vec![RiskLevel::Legitimate, RiskLevel::Phishing, RiskLevel::Safe]
        );
        // Earliest occurrence wins the single-verdict view
        assert_eq!(result.risk_level(), RiskLevel::Legitimate);
    }

    #[test]
    fn test_no_keywords_is_unknown() {
        let result = format_result("I could not decide.");
        assert_eq!(result.risk_level(), RiskLevel::Unknown);
        assert!(result.matches.is_empty());
        assert_eq!(result.text, "I could not decide.");
    }

    #[test]
    fn test_matching_is_case_sensitive_substring() {
        let result = format_result("This page is UNSAFE, not safe.");

        assert_eq!(result.risk_levels, vec![RiskLevel::Safe]);
        assert!(result.text.contains(&format!("UN{}", span(RiskLevel::Safe, "SAFE"))));
    }

    #[test]
    fn test_model_output_is_escaped() {
        let result = format_result("<script>alert('x')</script> & \"HIGH RISK\"");

        assert!(!result.text.contains("<script>"));
        assert!(result
            .text
            .starts_with("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; &quot;"));
        assert!(result.text.contains(&span(RiskLevel::High, "HIGH RISK")));
    }

    #[test]
    fn test_matches_index_raw_text_with_multibyte_prefix() {
        let raw = "Évaluation: CRITICAL RISK";
        let result = format_result(raw);
        let m = result.matches[0];
        assert_eq!(&raw[m.start..m.end], "CRITICAL RISK");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("a<b>\nc"), "a&lt;b&gt;<br>c");
    }
}
