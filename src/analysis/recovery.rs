//! Salvage free-text provider responses into structured results.
//!
//! Providers are prompted for JSON but do not always comply. The
//! recovery ladder tries, in order:
//!
//!   1. the response already parsed as structured → use it directly
//!   2. a JSON fragment embedded in the text body → parse that
//!   3. keyword extraction over the prose itself → degraded result
//!
//! Only an empty response is unrecoverable; any non-empty text yields
//! at least a keyword-derived result, so a chain with a chatty
//! provider never falls all the way through on formatting alone.

use super::providers::extract_json_block;
use super::traits::{AiAnalysis, RawResponse};
use crate::review::{Category, Issue, Severity, SourceResult, SourceStatus, Suggestion};
use crate::util::truncate_with_ellipsis;

/// Maximum characters of prose carried into a recovered summary.
const SUMMARY_MAX_CHARS: usize = 300;

// Keyword-extraction scores. Illustrative policy constants.
const SCORE_KEYWORD_DEFAULT: f64 = 5.0;
const SCORE_PERF_RECURSION: f64 = 3.0;

/// Attempt to turn a raw provider response into a [`SourceResult`].
///
/// Returns `None` only when the response carries no content at all,
/// in which case the chain moves on to the next provider.
pub fn recover(source: &str, raw: RawResponse) -> Option<SourceResult> {
    match raw {
        RawResponse::Structured(analysis) => {
            Some(analysis.into_source_result(source, SourceStatus::Ok))
        }
        RawResponse::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            // A JSON fragment buried in prose still counts as structured.
            let candidate = extract_json_block(trimmed);
            if let Ok(analysis) = serde_json::from_str::<AiAnalysis>(candidate) {
                return Some(analysis.into_source_result(source, SourceStatus::Ok));
            }
            Some(extract_from_prose(source, trimmed))
        }
    }
}

/// Keyword extraction over a prose response.
///
/// Scans for performance and security vocabulary and synthesizes at
/// most one issue per category. Responses that pair "performance"
/// language with recursion get a harsher score since that combination
/// almost always describes an exponential blowup.
fn extract_from_prose(source: &str, text: &str) -> SourceResult {
    let lower = text.to_lowercase();

    let mentions_performance = ["performance", "slow", "inefficient", "complexity", "recursive"]
        .iter()
        .any(|kw| lower.contains(kw));
    let mentions_security = ["input", "validation", "security", "vulnerability"]
        .iter()
        .any(|kw| lower.contains(kw));
    let mentions_recursion = lower.contains("recursive") || lower.contains("recursion");

    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    if mentions_performance {
        issues.push(Issue {
            category: Category::Performance,
            severity: Severity::High,
            line: None,
            column: None,
            message: "Performance concern identified in analysis".to_string(),
            suggestion: Some("Consider algorithmic improvements".to_string()),
            rule_id: None,
            source: source.to_string(),
        });
        suggestions.push(Suggestion {
            kind: "performance".to_string(),
            description: "Address the performance concern raised in the analysis".to_string(),
            code: None,
            reason: "Analysis text flagged performance-related language".to_string(),
        });
    }

    if mentions_security {
        issues.push(Issue {
            category: Category::Security,
            severity: Severity::Medium,
            line: None,
            column: None,
            message: "Input validation concern identified in analysis".to_string(),
            suggestion: Some("Validate and bound all external input".to_string()),
            rule_id: None,
            source: source.to_string(),
        });
        suggestions.push(Suggestion {
            kind: "security".to_string(),
            description: "Add validation for external input".to_string(),
            code: None,
            reason: "Analysis text flagged input handling".to_string(),
        });
    }

    let score = if mentions_performance && mentions_recursion {
        SCORE_PERF_RECURSION
    } else {
        SCORE_KEYWORD_DEFAULT
    };

    SourceResult {
        source: source.to_string(),
        issues,
        score,
        summary: truncate_with_ellipsis(text, SUMMARY_MAX_CHARS),
        status: SourceStatus::Degraded,
        suggestions,
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_response_passes_through() {
        let analysis = AiAnalysis { score: 8.5, ..Default::default() };
        let result = recover("openai", RawResponse::Structured(analysis)).unwrap();
        assert_eq!(result.score, 8.5);
        assert_eq!(result.status, SourceStatus::Ok);
    }

    #[test]
    fn embedded_json_is_recovered_as_structured() {
        let text = "Sure! Here is the analysis:\n```json\n{\"score\": 6.5, \"summary\": \"ok\"}\n```\nHope that helps.";
        let result = recover("anthropic", RawResponse::Text(text.into())).unwrap();
        assert_eq!(result.score, 6.5);
        assert_eq!(result.status, SourceStatus::Ok);
    }

    #[test]
    fn unfenced_embedded_json_is_recovered_as_structured() {
        let text = "Here is my assessment: {\"score\": 6.5, \"summary\": \"ok\"} hope that helps.";
        let result = recover("openai", RawResponse::Text(text.into())).unwrap();
        assert_eq!(result.status, SourceStatus::Ok);
        assert_eq!(result.score, 6.5);
    }

    #[test]
    fn prose_with_recursion_and_performance_scores_low() {
        let text = "This recursive fibonacci has serious performance problems \
                    due to exponential call growth.";
        let result = recover("cohere", RawResponse::Text(text.into())).unwrap();
        assert_eq!(result.score, 3.0);
        assert_eq!(result.status, SourceStatus::Degraded);
        assert!(result
            .issues
            .iter()
            .any(|i| i.category == Category::Performance));
    }

    #[test]
    fn prose_with_security_language_yields_security_issue() {
        let text = "The code accepts user input without any validation.";
        let result = recover("openai", RawResponse::Text(text.into())).unwrap();
        assert_eq!(result.score, 5.0);
        assert!(result.issues.iter().any(|i| i.category == Category::Security));
    }

    #[test]
    fn bland_prose_yields_neutral_degraded_result() {
        let text = "The code looks fine overall.";
        let result = recover("openai", RawResponse::Text(text.into())).unwrap();
        assert_eq!(result.score, 5.0);
        assert!(result.issues.is_empty());
        assert_eq!(result.status, SourceStatus::Degraded);
    }

    #[test]
    fn empty_text_is_unrecoverable() {
        assert!(recover("openai", RawResponse::Text("   ".into())).is_none());
        assert!(recover("openai", RawResponse::Text(String::new())).is_none());
    }

    #[test]
    fn long_prose_summary_is_truncated() {
        let text = "a".repeat(1000);
        let result = recover("openai", RawResponse::Text(text)).unwrap();
        assert!(result.summary.chars().count() <= SUMMARY_MAX_CHARS + 1);
    }
}
