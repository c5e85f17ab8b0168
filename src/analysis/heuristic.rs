//! Offline heuristic analyzer.
//!
//! Last rung of the provider chain. Runs purely on pattern matching,
//! never touches the network, and never fails, so a deployment with
//! no API keys (or with every provider down) still produces a usable
//! review instead of an error.

use std::sync::OnceLock;

use regex::Regex;

use crate::review::{Category, Issue, Language, Severity, SourceResult, SourceStatus, Suggestion};

/// Score when the heuristics found at least one issue.
const SCORE_WITH_ISSUES: f64 = 6.0;
/// Score when the code passed every heuristic.
const SCORE_CLEAN: f64 = 8.0;

fn definition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Captures the declared name for Python, JS/TS, Rust and Go styles.
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:def|function|fn|func)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

fn raw_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Numeric conversion wrapped directly around raw input with no
    // intervening validation, e.g. `int(input(...))`.
    RE.get_or_init(|| {
        Regex::new(r"(?:int|float|parseInt|parseFloat|Number)\s*\(\s*(?:input|prompt|readline)\s*\(").unwrap()
    })
}

/// Analyze a code sample with offline heuristics.
///
/// Always succeeds; the result is marked degraded so callers can tell
/// it apart from a real provider answer.
pub fn analyze(code: &str, _language: Language) -> SourceResult {
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    for (name, line) in self_recursive_definitions(code) {
        issues.push(Issue {
            category: Category::Performance,
            severity: Severity::High,
            line: Some(line),
            column: None,
            message: format!("Function '{name}' calls itself recursively"),
            suggestion: Some("Consider an iterative approach or memoization".to_string()),
            rule_id: None,
            source: "heuristic".to_string(),
        });
        suggestions.push(Suggestion {
            kind: "performance".to_string(),
            description: format!("Rewrite '{name}' iteratively or add memoization"),
            code: None,
            reason: "Unbounded recursion can grow exponentially and exhaust the stack"
                .to_string(),
        });
    }

    if raw_input_re().is_match(code) {
        issues.push(Issue {
            category: Category::Security,
            severity: Severity::Medium,
            line: None,
            column: None,
            message: "Raw user input converted to a number without validation".to_string(),
            suggestion: Some("Validate and bound the input before converting".to_string()),
            rule_id: None,
            source: "heuristic".to_string(),
        });
        suggestions.push(Suggestion {
            kind: "security".to_string(),
            description: "Wrap input conversion in validation with an explicit range check"
                .to_string(),
            code: None,
            reason: "Unvalidated input causes crashes or unbounded work on hostile values"
                .to_string(),
        });
    }

    let (score, summary) = if issues.is_empty() {
        (SCORE_CLEAN, "Heuristic analysis found no obvious issues".to_string())
    } else {
        (
            SCORE_WITH_ISSUES,
            format!("Heuristic analysis flagged {} issue(s)", issues.len()),
        )
    };

    SourceResult {
        source: "heuristic".to_string(),
        issues,
        score,
        summary,
        status: SourceStatus::Degraded,
        suggestions,
    }
}

/// Find function definitions whose body mentions their own name.
///
/// The body is taken as everything up to the next definition (or end
/// of input). Crude, but accurate enough for the fallback tier.
fn self_recursive_definitions(code: &str) -> Vec<(String, u32)> {
    let defs: Vec<_> = definition_re().captures_iter(code).collect();
    let mut out = Vec::new();

    for (idx, cap) in defs.iter().enumerate() {
        let whole = cap.get(0).unwrap();
        let name = cap.get(1).unwrap().as_str();
        let body_start = whole.end();
        let body_end = defs
            .get(idx + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(code.len());

        if code[body_start..body_end].contains(name) {
            let line = code[..whole.start()].lines().count() as u32 + 1;
            out.push((name.to_string(), line));
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FIBONACCI: &str = "\
def calculate_fibonacci(n):
    if n <= 1:
        return n
    return calculate_fibonacci(n - 1) + calculate_fibonacci(n - 2)
";

    #[test]
    fn detects_recursive_python_function() {
        let result = analyze(FIBONACCI, Language::Python);
        assert_eq!(result.score, SCORE_WITH_ISSUES);
        assert_eq!(result.status, SourceStatus::Degraded);
        let issue = result
            .issues
            .iter()
            .find(|i| i.category == Category::Performance)
            .expect("recursion issue");
        assert!(issue.message.contains("calculate_fibonacci"));
        assert_eq!(issue.line, Some(1));
    }

    #[test]
    fn detects_unvalidated_numeric_input() {
        let code = "n = int(input(\"Enter a number: \"))\nprint(n * 2)\n";
        let result = analyze(code, Language::Python);
        assert!(result.issues.iter().any(|i| i.category == Category::Security));
        assert_eq!(result.score, SCORE_WITH_ISSUES);
    }

    #[test]
    fn detects_recursive_js_function() {
        let code = "function fact(n) {\n  if (n <= 1) return 1;\n  return n * fact(n - 1);\n}\n";
        let result = analyze(code, Language::Javascript);
        assert!(result.issues.iter().any(|i| i.category == Category::Performance));
    }

    #[test]
    fn clean_code_scores_high_with_no_issues() {
        let code = "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n";
        let result = analyze(code, Language::Python);
        assert!(result.issues.is_empty());
        assert_eq!(result.score, SCORE_CLEAN);
        assert_eq!(result.source, "heuristic");
    }

    #[test]
    fn non_recursive_neighbor_is_not_flagged() {
        // `add` appears inside `triple`'s body, but `add` itself is clean.
        let code = "def add(a, b):\n    return a + b\n\ndef triple(x):\n    return add(add(x, x), x)\n";
        let result = analyze(code, Language::Python);
        assert!(result.issues.is_empty());
    }
}
