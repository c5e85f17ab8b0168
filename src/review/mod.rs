//! Unified review data model.
//!
//! Every analysis source — external linters and AI providers alike —
//! is normalized into the same closed vocabulary before aggregation:
//! concrete runners produce [`SourceResult`]s, and the aggregator
//! folds them into one [`AggregatedReview`]. Issues are immutable once
//! created; nothing downstream of a runner ever re-labels a finding.

pub mod taxonomy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Severity ─────────────────────────────────────────────────────

/// Severity level for a review issue, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational suggestion, not a blocker.
    Low,
    /// Should be addressed but not urgent.
    Medium,
    /// Important issue that should be fixed soon.
    High,
    /// Must-fix: correctness or security problem.
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Category ─────────────────────────────────────────────────────

/// Closed classification of an issue's nature.
///
/// Source-specific vocabularies (pylint message types, eslint
/// severities, AI issue labels) are mapped into this enum by
/// [`taxonomy`]; the aggregator never sees a raw tool vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Syntax,
    Style,
    Logic,
    Security,
    Performance,
    Maintainability,
    Documentation,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Style => "style",
            Self::Logic => "logic",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Maintainability => "maintainability",
            Self::Documentation => "documentation",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Language ─────────────────────────────────────────────────────

/// Programming languages the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    Php,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Self::Python,
        Self::Javascript,
        Self::Typescript,
        Self::Java,
        Self::C,
        Self::Cpp,
        Self::Go,
        Self::Rust,
        Self::Php,
        Self::Ruby,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Ruby => "ruby",
        }
    }

    /// File extension used when handing a sample to an external tool.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Javascript => "js",
            Self::Typescript => "ts",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Go => "go",
            Self::Rust => "rs",
            Self::Php => "php",
            Self::Ruby => "rb",
        }
    }

    /// Detect a language from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" => Some(Self::Python),
            "js" | "jsx" => Some(Self::Javascript),
            "ts" | "tsx" => Some(Self::Typescript),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Self::Cpp),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "php" => Some(Self::Php),
            "rb" => Some(Self::Ruby),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Focus areas ──────────────────────────────────────────────────

/// Reviewer attention areas a caller may request.
///
/// An unrecognized area is a validation error at the API boundary;
/// core components only ever see this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    Security,
    Performance,
    Readability,
    Maintainability,
    Style,
    Documentation,
}

impl FocusArea {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "security" => Some(Self::Security),
            "performance" => Some(Self::Performance),
            "readability" => Some(Self::Readability),
            "maintainability" => Some(Self::Maintainability),
            "style" => Some(Self::Style),
            "documentation" => Some(Self::Documentation),
            _ => None,
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Security => "Conduct a thorough security review",
            Self::Performance => "Consider performance optimizations",
            Self::Readability => "Improve code readability and documentation",
            Self::Maintainability => "Reduce coupling to ease future maintenance",
            Self::Style => "Align the code with the language's style conventions",
            Self::Documentation => "Document public interfaces and tricky sections",
        }
    }
}

// ── Issue ────────────────────────────────────────────────────────

/// A single normalized finding from one analysis source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unified category of the finding.
    pub category: Category,
    /// Unified severity of the finding.
    pub severity: Severity,
    /// 1-based line number, when the source reported one.
    pub line: Option<u32>,
    /// 1-based column number, when the source reported one.
    pub column: Option<u32>,
    /// Human-readable description.
    pub message: String,
    /// Suggested fix, when the source offered one.
    pub suggestion: Option<String>,
    /// Source-native rule identifier (e.g. "C0301", "no-unused-vars").
    pub rule_id: Option<String>,
    /// Which analyzer produced this issue (e.g. "pylint", "openai").
    pub source: String,
}

// ── Suggestion ───────────────────────────────────────────────────

/// An improvement suggestion from an AI provider.
///
/// Distinct from [`Issue::suggestion`]: these are standalone
/// refactoring proposals, not fixes attached to a specific finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Kind of improvement (e.g. "performance_optimization").
    pub kind: String,
    /// What to change and why it helps.
    pub description: String,
    /// Proposed replacement code, when the provider supplied one.
    pub code: Option<String>,
    /// Rationale for the change.
    pub reason: String,
}

// ── Source result ────────────────────────────────────────────────

/// Outcome marker for a single analysis source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source ran and its output parsed cleanly.
    Ok,
    /// The source exceeded its timeout; result is neutral.
    TimedOut,
    /// The source could not run at all; result is neutral.
    Failed,
    /// A fallback path produced this result (reduced fidelity).
    Degraded,
}

impl SourceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
            Self::Degraded => "degraded",
        }
    }
}

/// The normalized output of one analyzer (tool or AI provider) for
/// one review.
///
/// Runners never return errors: any execution or parsing failure is
/// absorbed into a neutral result with the matching [`SourceStatus`],
/// so the aggregator's inputs are total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    /// Analyzer name (e.g. "pylint", "bandit", "openai", "heuristic").
    pub source: String,
    /// Normalized findings, in the order the source reported them.
    pub issues: Vec<Issue>,
    /// Per-source quality score in [0, 10].
    pub score: f64,
    /// One-line description of what this source concluded.
    pub summary: String,
    /// How the run ended.
    pub status: SourceStatus,
    /// Improvement suggestions (AI sources only; empty for tools).
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl SourceResult {
    /// Neutral result used when a source times out or fails outright.
    pub fn neutral(source: &str, status: SourceStatus, summary: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            issues: Vec::new(),
            score: 5.0,
            summary: summary.into(),
            status,
            suggestions: Vec::new(),
        }
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

// ── Requests ─────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// A single code review request as accepted by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// The code to review.
    pub code: String,
    /// Language of the sample; decides tool applicability.
    pub language: Language,
    /// Optional free-text context forwarded to AI providers.
    #[serde(default)]
    pub context: Option<String>,
    /// Optional file name (used for language cross-checking only).
    #[serde(default)]
    pub file_name: Option<String>,
    /// Run the external static-analysis tools.
    #[serde(default = "default_true")]
    pub include_static_analysis: bool,
    /// Run the AI provider chain.
    #[serde(default = "default_true")]
    pub include_ai_analysis: bool,
    /// Requested reviewer attention areas (validated at the boundary).
    #[serde(default)]
    pub focus_areas: Option<Vec<String>>,
}

/// An ordered batch of review requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReviewRequest {
    pub reviews: Vec<ReviewRequest>,
}

// ── Aggregated review ────────────────────────────────────────────

/// Issue counts keyed by severity. Always sums to the issue total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn tally(issues: &[Issue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Per-source outcome recorded on the final review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: String,
    pub status: SourceStatus,
    pub score: f64,
}

/// The final merged review for one code sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReview {
    /// Unique review ID (UUID v4).
    pub id: String,
    /// When the review completed.
    pub timestamp: DateTime<Utc>,
    /// Language of the reviewed sample.
    pub language: Language,
    /// File name, if the caller supplied one.
    pub file_name: Option<String>,
    /// Weighted overall score in [0, 10], rounded to two decimals.
    pub overall_score: f64,
    /// Union of all source issues, source order preserved, no dedup.
    pub issues: Vec<Issue>,
    /// Issue counts by severity; invariant: sums to `issues.len()`.
    pub severity_counts: SeverityCounts,
    /// Number of AI improvement suggestions collected.
    pub suggestion_count: usize,
    /// Deterministic quality summary.
    pub summary: String,
    /// Prioritized next steps, at most five.
    pub recommendations: Vec<String>,
    /// Names of all sources that contributed.
    pub sources_used: Vec<String>,
    /// Per-source outcome markers for observability.
    pub source_outcomes: Vec<SourceOutcome>,
    /// Wall-clock duration of the review in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of one item inside a batch review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum BatchItem {
    Ok { review: AggregatedReview },
    Error { error: String },
}

/// Response for a batch review call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReviewResponse {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub successful_reviews: usize,
    pub failed_reviews: usize,
    /// One entry per request, in request order.
    pub results: Vec<BatchItem>,
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn language_extension_round_trip() {
        for lang in Language::ALL {
            let name = format!("sample.{}", lang.extension());
            // C++ headers aside, every canonical extension maps back.
            let detected = Language::from_file_name(&name);
            assert!(detected.is_some(), "no detection for {name}");
        }
        assert_eq!(Language::from_file_name("app.tsx"), Some(Language::Typescript));
        assert_eq!(Language::from_file_name("README"), None);
    }

    #[test]
    fn focus_area_parse_is_case_insensitive() {
        assert_eq!(FocusArea::parse("Security"), Some(FocusArea::Security));
        assert_eq!(FocusArea::parse("PERFORMANCE"), Some(FocusArea::Performance));
        assert_eq!(FocusArea::parse("vibes"), None);
    }

    #[test]
    fn severity_counts_sum_to_issue_total() {
        let issue = |severity| Issue {
            category: Category::Style,
            severity,
            line: None,
            column: None,
            message: "m".into(),
            suggestion: None,
            rule_id: None,
            source: "test".into(),
        };
        let issues = vec![
            issue(Severity::Critical),
            issue(Severity::High),
            issue(Severity::High),
            issue(Severity::Low),
        ];
        let counts = SeverityCounts::tally(&issues);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total(), issues.len());
    }

    #[test]
    fn neutral_result_shape() {
        let r = SourceResult::neutral("pylint", SourceStatus::TimedOut, "pylint timed out");
        assert_eq!(r.score, 5.0);
        assert!(r.issues.is_empty());
        assert_eq!(r.status, SourceStatus::TimedOut);
    }

    #[test]
    fn review_request_defaults() {
        let req: ReviewRequest =
            serde_json::from_str(r#"{"code": "print(1)", "language": "python"}"#).unwrap();
        assert!(req.include_static_analysis);
        assert!(req.include_ai_analysis);
        assert!(req.focus_areas.is_none());
    }
}
