//! External static-analysis tool runner.
//!
//! Each enabled tool is spawned as a child process against a
//! temporary copy of the (already sanitized) code sample, with a hard
//! timeout. Stdout is parsed as the tool's JSON schema first, falling
//! back to line-oriented text parsing when a tool was invoked in a
//! mode or version that prints plain text.
//!
//! The runner has no failure path: timeouts and spawn errors degrade
//! to a neutral [`SourceResult`] with the matching status, and a
//! non-zero exit code is expected (linters exit non-zero whenever
//! they have findings).

use std::io::Write;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::config::ToolsConfig;
use crate::review::taxonomy::{normalize_category, normalize_severity};
use crate::review::{Issue, Language, SourceResult, SourceStatus};

// Score deductions per finding, by severity. Illustrative policy
// constants; change here, not at call sites.
const WEIGHT_CRITICAL: f64 = 3.0;
const WEIGHT_HIGH: f64 = 2.0;
const WEIGHT_MEDIUM: f64 = 1.0;
const WEIGHT_LOW: f64 = 0.5;

/// A tool's invocation contract: fixed command, fixed argument list,
/// and the languages it applies to.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub languages: &'static [Language],
}

/// Registry of supported tools. Adding a tool means a new entry here
/// plus a mapping table in [`crate::review::taxonomy`].
pub const TOOLS: [ToolSpec; 3] = [
    ToolSpec {
        name: "pylint",
        command: "pylint",
        // C0114/C0116 (missing docstrings) fire on every snippet and
        // drown real findings.
        args: &["--output-format=json", "--disable=C0114,C0116"],
        languages: &[Language::Python],
    },
    ToolSpec {
        name: "bandit",
        command: "bandit",
        args: &["-f", "json", "-r"],
        languages: &[Language::Python],
    },
    ToolSpec {
        name: "eslint",
        command: "eslint",
        args: &["--format=json"],
        languages: &[Language::Javascript, Language::Typescript],
    },
];

/// Whether a tool binary is discoverable on PATH (health reporting).
pub fn tool_available(spec: &ToolSpec) -> bool {
    which::which(spec.command).is_ok()
}

// ── Runner ───────────────────────────────────────────────────────

pub struct ToolRunner {
    enabled: ToolsConfig,
    timeout: Duration,
    registry: &'static [ToolSpec],
}

impl ToolRunner {
    pub fn new(enabled: ToolsConfig, timeout: Duration) -> Self {
        Self { enabled, timeout, registry: &TOOLS }
    }

    /// Swap the tool registry. Test seam.
    #[cfg(test)]
    pub(crate) fn with_registry(mut self, registry: &'static [ToolSpec]) -> Self {
        self.registry = registry;
        self
    }

    fn is_enabled(&self, name: &str) -> bool {
        match name {
            "pylint" => self.enabled.pylint,
            "eslint" => self.enabled.eslint,
            "bandit" => self.enabled.bandit,
            _ => false,
        }
    }

    /// Tools that are enabled and applicable to `language`.
    pub fn applicable(&self, language: Language) -> Vec<&'static ToolSpec> {
        self.registry
            .iter()
            .filter(|spec| spec.languages.contains(&language) && self.is_enabled(spec.name))
            .collect()
    }

    /// Run every applicable tool against the sample. One result per
    /// tool, in registry order. Never fails.
    pub async fn run_all(&self, code: &str, language: Language) -> Vec<SourceResult> {
        let mut results = Vec::new();
        for spec in self.applicable(language) {
            results.push(self.run_tool(spec, code, language).await);
        }
        results
    }

    /// Run one tool. Timeout and spawn failures degrade to a neutral
    /// result; they are logged, never propagated.
    async fn run_tool(&self, spec: &ToolSpec, code: &str, language: Language) -> SourceResult {
        // Scratch file lives exactly as long as this call; the
        // NamedTempFile guard removes it on every exit path.
        let file = match scratch_file(code, language) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(tool = spec.name, error = %e, "failed to stage code sample");
                return SourceResult::neutral(
                    spec.name,
                    SourceStatus::Failed,
                    format!("{} could not stage the code sample", spec.name),
                );
            }
        };

        let invocation = Command::new(spec.command)
            .args(spec.args)
            .arg(file.path())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!(tool = spec.name, error = %e, "tool failed to spawn");
                return SourceResult::neutral(
                    spec.name,
                    SourceStatus::Failed,
                    format!("{} failed to run", spec.name),
                );
            }
            Err(_) => {
                tracing::warn!(tool = spec.name, timeout_secs = self.timeout.as_secs(), "tool timed out");
                return SourceResult::neutral(
                    spec.name,
                    SourceStatus::TimedOut,
                    format!("{} timed out", spec.name),
                );
            }
        };

        // Non-zero exit is the normal "findings present" case for
        // every linter in the registry; only spawn errors above count
        // as failure.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let issues = parse_output(spec.name, &stdout);
        let score = score_from_issues(&issues);

        tracing::info!(
            tool = spec.name,
            issues = issues.len(),
            score,
            exit = output.status.code().unwrap_or(-1),
            "tool run completed"
        );

        SourceResult {
            source: spec.name.to_string(),
            summary: format!("{} found {} issue(s)", spec.name, issues.len()),
            issues,
            score,
            status: SourceStatus::Ok,
            suggestions: Vec::new(),
        }
    }
}

fn scratch_file(code: &str, language: Language) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("critiq-")
        .suffix(&format!(".{}", language.extension()))
        .tempfile()?;
    file.write_all(code.as_bytes())?;
    file.flush()?;
    Ok(file)
}

// ── Scoring ──────────────────────────────────────────────────────

/// Per-tool score: start at 10, deduct per finding by severity,
/// clamp to [0, 10]. Monotonically non-increasing in issue count.
pub fn score_from_issues(issues: &[Issue]) -> f64 {
    let deduction: f64 = issues
        .iter()
        .map(|i| match i.severity {
            crate::review::Severity::Critical => WEIGHT_CRITICAL,
            crate::review::Severity::High => WEIGHT_HIGH,
            crate::review::Severity::Medium => WEIGHT_MEDIUM,
            crate::review::Severity::Low => WEIGHT_LOW,
        })
        .sum();
    (10.0 - deduction).clamp(0.0, 10.0)
}

// ── Output parsing ───────────────────────────────────────────────

/// Parse tool stdout: JSON per the tool's own schema first, then the
/// line-oriented text fallback. Unparseable content yields no issues
/// rather than an error.
fn parse_output(tool: &str, stdout: &str) -> Vec<Issue> {
    if stdout.trim().is_empty() {
        return Vec::new();
    }

    let parsed = match tool {
        "pylint" => parse_pylint_json(stdout),
        "eslint" => parse_eslint_json(stdout),
        "bandit" => parse_bandit_json(stdout),
        _ => None,
    };

    match parsed {
        Some(issues) => issues,
        None => {
            tracing::debug!(tool, "structured parse failed, using text fallback");
            parse_text_lines(tool, stdout)
        }
    }
}

#[derive(Deserialize)]
struct PylintMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default)]
    message: String,
    #[serde(rename = "message-id", default)]
    message_id: Option<String>,
}

fn parse_pylint_json(stdout: &str) -> Option<Vec<Issue>> {
    let messages: Vec<PylintMessage> = serde_json::from_str(stdout).ok()?;
    Some(
        messages
            .into_iter()
            .map(|m| Issue {
                category: normalize_category("pylint", &m.kind),
                severity: normalize_severity("pylint", &m.kind),
                line: m.line,
                column: m.column,
                message: m.message,
                suggestion: None,
                rule_id: m.message_id,
                source: "pylint".into(),
            })
            .collect(),
    )
}

#[derive(Deserialize)]
struct EslintFile {
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Deserialize)]
struct EslintMessage {
    #[serde(default)]
    severity: u8,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default)]
    message: String,
    #[serde(rename = "ruleId", default)]
    rule_id: Option<String>,
}

fn parse_eslint_json(stdout: &str) -> Option<Vec<Issue>> {
    let files: Vec<EslintFile> = serde_json::from_str(stdout).ok()?;
    Some(
        files
            .into_iter()
            .flat_map(|f| f.messages)
            .map(|m| {
                let raw = m.severity.to_string();
                Issue {
                    category: normalize_category("eslint", &raw),
                    severity: normalize_severity("eslint", &raw),
                    line: m.line,
                    column: m.column,
                    message: m.message,
                    suggestion: None,
                    rule_id: m.rule_id,
                    source: "eslint".into(),
                }
            })
            .collect(),
    )
}

#[derive(Deserialize)]
struct BanditReport {
    #[serde(default)]
    results: Vec<BanditResult>,
}

#[derive(Deserialize)]
struct BanditResult {
    #[serde(default)]
    issue_severity: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    line_number: Option<u32>,
    #[serde(default)]
    test_id: Option<String>,
}

fn parse_bandit_json(stdout: &str) -> Option<Vec<Issue>> {
    let report: BanditReport = serde_json::from_str(stdout).ok()?;
    Some(
        report
            .results
            .into_iter()
            .map(|r| Issue {
                category: normalize_category("bandit", &r.issue_severity),
                severity: normalize_severity("bandit", &r.issue_severity),
                line: r.line_number,
                column: None,
                message: r.issue_text,
                suggestion: None,
                rule_id: r.test_id,
                source: "bandit".into(),
            })
            .collect(),
    )
}

/// Line-oriented fallback for non-JSON output. Accepts lines shaped
/// like `file:line:type: message` (pylint/eslint stylistic default);
/// anything else is silently dropped.
fn parse_text_lines(tool: &str, stdout: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.splitn(4, ':');
        let (Some(_file), Some(line_no), Some(kind), Some(message)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(line_no) = line_no.trim().parse::<u32>() else {
            continue;
        };
        let kind = kind.trim();
        let message = message.trim();
        if message.is_empty() {
            continue;
        }
        issues.push(Issue {
            category: normalize_category(tool, kind),
            severity: normalize_severity(tool, kind),
            line: Some(line_no),
            column: None,
            message: message.to_string(),
            suggestion: None,
            rule_id: None,
            source: tool.to_string(),
        });
    }
    issues
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{Category, Severity};

    fn issue(severity: Severity) -> Issue {
        Issue {
            category: Category::Style,
            severity,
            line: None,
            column: None,
            message: "m".into(),
            suggestion: None,
            rule_id: None,
            source: "test".into(),
        }
    }

    #[test]
    fn score_deductions_follow_weights() {
        assert_eq!(score_from_issues(&[]), 10.0);
        assert_eq!(score_from_issues(&[issue(Severity::Critical)]), 7.0);
        assert_eq!(score_from_issues(&[issue(Severity::High)]), 8.0);
        assert_eq!(score_from_issues(&[issue(Severity::Medium)]), 9.0);
        assert_eq!(score_from_issues(&[issue(Severity::Low)]), 9.5);
    }

    #[test]
    fn score_is_monotone_and_clamped() {
        let mut issues = Vec::new();
        let mut last = 10.0;
        for _ in 0..16 {
            issues.push(issue(Severity::Critical));
            let score = score_from_issues(&issues);
            assert!(score <= last, "score must not increase with more issues");
            assert!((0.0..=10.0).contains(&score));
            last = score;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn pylint_json_parses_into_unified_issues() {
        let stdout = r#"[
            {"type": "error", "line": 3, "column": 1, "message": "undefined variable 'x'", "message-id": "E0602"},
            {"type": "convention", "line": 1, "column": 0, "message": "line too long", "message-id": "C0301"}
        ]"#;
        let issues = parse_output("pylint", stdout);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].category, Category::Syntax);
        assert_eq!(issues[0].rule_id.as_deref(), Some("E0602"));
        assert_eq!(issues[1].severity, Severity::Low);
    }

    #[test]
    fn eslint_json_flattens_files() {
        let stdout = r#"[
            {"filePath": "/tmp/x.js", "messages": [
                {"ruleId": "no-unused-vars", "severity": 2, "message": "unused var", "line": 4, "column": 7},
                {"ruleId": "semi", "severity": 1, "message": "missing semicolon", "line": 9, "column": 2}
            ]}
        ]"#;
        let issues = parse_output("eslint", stdout);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].severity, Severity::Medium);
        assert_eq!(issues[1].rule_id.as_deref(), Some("semi"));
    }

    #[test]
    fn bandit_json_is_always_security() {
        let stdout = r#"{"results": [
            {"issue_severity": "HIGH", "issue_text": "subprocess call with shell=True", "line_number": 12, "test_id": "B602"}
        ]}"#;
        let issues = parse_output("bandit", stdout);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, Category::Security);
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[test]
    fn text_fallback_matches_colon_shape_and_drops_noise() {
        let stdout = "\
sample.py:3:error: undefined variable
************* Module sample
Your code has been rated at 7.50/10
sample.py:9:warning: unused import
";
        let issues = parse_output("pylint", stdout);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].severity, Severity::Medium);
    }

    #[test]
    fn garbage_output_yields_no_issues() {
        assert!(parse_output("pylint", "").is_empty());
        assert!(parse_output("eslint", "total garbage").is_empty());
        assert!(parse_output("bandit", "{\"broken\": ").is_empty());
    }

    #[test]
    fn applicability_respects_language_and_flags() {
        let runner = ToolRunner::new(ToolsConfig::default(), Duration::from_secs(30));
        let python: Vec<_> = runner.applicable(Language::Python).iter().map(|t| t.name).collect();
        assert_eq!(python, ["pylint", "bandit"]);
        let js: Vec<_> = runner.applicable(Language::Javascript).iter().map(|t| t.name).collect();
        assert_eq!(js, ["eslint"]);
        assert!(runner.applicable(Language::Rust).is_empty());

        let disabled = ToolRunner::new(
            ToolsConfig { pylint: false, eslint: true, bandit: true },
            Duration::from_secs(30),
        );
        let python: Vec<_> = disabled.applicable(Language::Python).iter().map(|t| t.name).collect();
        assert_eq!(python, ["bandit"]);
    }

    #[tokio::test]
    async fn missing_binary_degrades_to_neutral_failed() {
        let runner = ToolRunner::new(ToolsConfig::default(), Duration::from_secs(5));
        let spec = ToolSpec {
            name: "pylint",
            command: "critiq-definitely-not-installed",
            args: &[],
            languages: &[Language::Python],
        };
        let result = runner.run_tool(&spec, "print(1)\n", Language::Python).await;
        assert_eq!(result.status, SourceStatus::Failed);
        assert_eq!(result.score, 5.0);
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn slow_tool_times_out_to_neutral() {
        let runner = ToolRunner::new(ToolsConfig::default(), Duration::from_millis(50));
        // `tail -f <file>` blocks until killed, standing in for a hung linter.
        let spec = ToolSpec {
            name: "pylint",
            command: "tail",
            args: &["-f"],
            languages: &[Language::Python],
        };
        let result = runner.run_tool(&spec, "print(1)\n", Language::Python).await;
        assert_eq!(result.status, SourceStatus::TimedOut);
        assert_eq!(result.score, 5.0);
        assert!(result.issues.is_empty());
    }
}
