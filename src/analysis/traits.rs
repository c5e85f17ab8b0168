//! Provider trait and the structured schema providers are asked for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::review::taxonomy::{normalize_category, normalize_severity};
use crate::review::{Category, Issue, Language, SourceResult, SourceStatus, Suggestion};

// ── Structured provider schema ───────────────────────────────────

fn default_score() -> f64 {
    5.0
}

/// The JSON schema every provider is prompted to return.
///
/// Fields are individually defaulted so a partially-conforming
/// response still parses; a response missing everything degrades to a
/// neutral score with no findings rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<AiIssue>,
    #[serde(default)]
    pub suggestions: Vec<AiSuggestion>,
    #[serde(default)]
    pub security_concerns: Vec<AiSecurityConcern>,
    #[serde(default)]
    pub performance_notes: Vec<AiPerformanceNote>,
    #[serde(default = "default_score")]
    pub readability_score: f64,
    #[serde(default = "default_score")]
    pub maintainability_score: f64,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiIssue {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiSuggestion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiSecurityConcern {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mitigation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiPerformanceNote {
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub suggestion: String,
}

impl AiAnalysis {
    /// Normalize into a [`SourceResult`] attributed to `source`.
    ///
    /// Security concerns join the issue list under the security
    /// category (so downstream security counts see them); performance
    /// notes become suggestions.
    pub fn into_source_result(self, source: &str, status: SourceStatus) -> SourceResult {
        let mut issues: Vec<Issue> = self
            .issues
            .into_iter()
            .map(|i| Issue {
                category: normalize_category(source, &i.kind),
                severity: normalize_severity(source, &i.severity),
                line: i.line,
                column: None,
                message: i.message,
                suggestion: i.suggestion,
                rule_id: None,
                source: source.to_string(),
            })
            .collect();

        for concern in self.security_concerns {
            issues.push(Issue {
                category: Category::Security,
                severity: normalize_severity(source, &concern.severity),
                line: None,
                column: None,
                message: concern.description,
                suggestion: (!concern.mitigation.is_empty()).then_some(concern.mitigation),
                rule_id: None,
                source: source.to_string(),
            });
        }

        let mut suggestions: Vec<Suggestion> = self
            .suggestions
            .into_iter()
            .map(|s| Suggestion {
                kind: s.kind,
                description: s.description,
                code: s.code,
                reason: s.reason,
            })
            .collect();

        for note in self.performance_notes {
            suggestions.push(Suggestion {
                kind: if note.area.is_empty() { "performance".into() } else { note.area },
                description: note.issue,
                code: None,
                reason: note.suggestion,
            });
        }

        let summary = if self.summary.is_empty() {
            format!("{source} analysis found {} issue(s)", issues.len())
        } else {
            self.summary
        };

        SourceResult {
            source: source.to_string(),
            issues,
            score: self.score.clamp(0.0, 10.0),
            summary,
            status,
            suggestions,
        }
    }
}

// ── Raw response ─────────────────────────────────────────────────

/// What a provider call produced before recovery.
#[derive(Debug, Clone)]
pub enum RawResponse {
    /// The response body parsed directly as [`AiAnalysis`].
    Structured(AiAnalysis),
    /// Free text; the recovery ladder will try to coerce it.
    Text(String),
}

// ── Provider trait ───────────────────────────────────────────────

/// One AI analysis backend.
///
/// Implementations wrap a specific model API. Errors (network,
/// timeout, non-2xx) are returned to the chain, which skips to the
/// next provider without retrying.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name used for issue attribution (e.g. "openai").
    fn name(&self) -> &str;

    /// Analyze a sanitized code sample.
    async fn analyze(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
    ) -> anyhow::Result<RawResponse>;
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Severity;

    #[test]
    fn structured_analysis_normalizes_vocabulary() {
        let analysis = AiAnalysis {
            score: 7.0,
            issues: vec![AiIssue {
                kind: "performance_issue".into(),
                severity: "high".into(),
                line: Some(3),
                message: "exponential recursion".into(),
                suggestion: Some("memoize".into()),
            }],
            security_concerns: vec![AiSecurityConcern {
                kind: "input_validation".into(),
                severity: "medium".into(),
                description: "no input validation".into(),
                mitigation: "validate and bound input".into(),
            }],
            performance_notes: vec![AiPerformanceNote {
                area: "algorithm_efficiency".into(),
                issue: "O(2^n) growth".into(),
                suggestion: "iterative approach".into(),
            }],
            ..Default::default()
        };

        let result = analysis.into_source_result("openai", SourceStatus::Ok);
        assert_eq!(result.source, "openai");
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].category, Category::Performance);
        assert_eq!(result.issues[0].severity, Severity::High);
        assert_eq!(result.issues[1].category, Category::Security);
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].kind, "algorithm_efficiency");
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        let analysis = AiAnalysis { score: 42.0, ..Default::default() };
        let result = analysis.into_source_result("openai", SourceStatus::Ok);
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn empty_analysis_parses_with_defaults() {
        let analysis: AiAnalysis = serde_json::from_str("{}").unwrap();
        assert_eq!(analysis.score, 5.0);
        assert!(analysis.issues.is_empty());
        let result = analysis.into_source_result("anthropic", SourceStatus::Ok);
        assert!(result.summary.contains("0 issue(s)"));
    }
}
