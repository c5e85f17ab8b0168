//! Source-vocabulary normalization.
//!
//! Every analyzer speaks its own dialect: pylint labels findings
//! `convention`/`refactor`/`warning`/`error`/`fatal`, eslint uses
//! numeric severities, bandit shouts `HIGH`/`MEDIUM`/`LOW`, and AI
//! providers improvise. These functions map each dialect into the
//! unified [`Severity`]/[`Category`] enums.
//!
//! Both mappings are pure and total: an unknown raw value falls back
//! to `Severity::Medium` / `Category::Style` rather than failing, so
//! downstream code never encounters an unmapped vocabulary entry.
//! Adding a new analyzer means adding one match arm here, nothing in
//! the aggregator.

use super::{Category, Severity};

/// Map a source-native severity string to the unified severity.
///
/// Unknown sources and unknown raw values default to `Medium`.
pub fn normalize_severity(source: &str, raw: &str) -> Severity {
    match source {
        "pylint" => pylint_severity(raw),
        "eslint" => eslint_severity(raw),
        "bandit" => bandit_severity(raw),
        // AI providers are prompted for the unified vocabulary, so
        // this arm mostly passes through.
        _ => unified_severity(raw),
    }
}

/// Map a source-native issue label to the unified category.
///
/// Unknown sources and unknown raw values default to `Style`.
pub fn normalize_category(source: &str, raw: &str) -> Category {
    match source {
        "pylint" => pylint_category(raw),
        "eslint" => eslint_category(raw),
        // Every bandit finding is a security finding regardless of its
        // test id.
        "bandit" => Category::Security,
        _ => unified_category(raw),
    }
}

// ── pylint ───────────────────────────────────────────────────────

// pylint reports a message "type" rather than a severity; both the
// severity and the category derive from it.

fn pylint_severity(raw: &str) -> Severity {
    match raw {
        "fatal" => Severity::Critical,
        "error" => Severity::High,
        "warning" => Severity::Medium,
        "refactor" | "convention" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn pylint_category(raw: &str) -> Category {
    match raw {
        "error" | "fatal" => Category::Syntax,
        "refactor" => Category::Maintainability,
        "warning" | "convention" => Category::Style,
        _ => Category::Style,
    }
}

// ── eslint ───────────────────────────────────────────────────────

// eslint severities arrive as the stringified numbers from its JSON
// output: 2 = error, 1 = warning.

fn eslint_severity(raw: &str) -> Severity {
    match raw {
        "2" => Severity::High,
        _ => Severity::Medium,
    }
}

fn eslint_category(raw: &str) -> Category {
    match raw {
        "2" => Category::Syntax,
        _ => Category::Style,
    }
}

// ── bandit ───────────────────────────────────────────────────────

// bandit's severities are shifted up one notch: everything it finds
// is a security concern, so its HIGH maps to our Critical.

fn bandit_severity(raw: &str) -> Severity {
    match raw.to_ascii_uppercase().as_str() {
        "HIGH" => Severity::Critical,
        "MEDIUM" => Severity::High,
        "LOW" => Severity::Medium,
        _ => Severity::Medium,
    }
}

// ── unified pass-through (AI providers) ──────────────────────────

fn unified_severity(raw: &str) -> Severity {
    match raw.to_ascii_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        "low" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn unified_category(raw: &str) -> Category {
    // Providers sometimes answer with the original service's longer
    // labels ("performance_issue", "security_vulnerability"); match
    // on the prefix rather than requiring the exact enum name.
    let raw = raw.to_ascii_lowercase();
    if raw.starts_with("syntax") {
        Category::Syntax
    } else if raw.starts_with("logic") {
        Category::Logic
    } else if raw.starts_with("security") || raw.starts_with("input_validation") {
        Category::Security
    } else if raw.starts_with("performance") {
        Category::Performance
    } else if raw.starts_with("maintainability") {
        Category::Maintainability
    } else if raw.starts_with("documentation") {
        Category::Documentation
    } else {
        Category::Style
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pylint_mappings() {
        assert_eq!(normalize_severity("pylint", "fatal"), Severity::Critical);
        assert_eq!(normalize_severity("pylint", "error"), Severity::High);
        assert_eq!(normalize_severity("pylint", "warning"), Severity::Medium);
        assert_eq!(normalize_severity("pylint", "convention"), Severity::Low);
        assert_eq!(normalize_category("pylint", "error"), Category::Syntax);
        assert_eq!(normalize_category("pylint", "refactor"), Category::Maintainability);
    }

    #[test]
    fn eslint_numeric_severities() {
        assert_eq!(normalize_severity("eslint", "2"), Severity::High);
        assert_eq!(normalize_severity("eslint", "1"), Severity::Medium);
        assert_eq!(normalize_category("eslint", "2"), Category::Syntax);
        assert_eq!(normalize_category("eslint", "1"), Category::Style);
    }

    #[test]
    fn bandit_severity_shift() {
        assert_eq!(normalize_severity("bandit", "HIGH"), Severity::Critical);
        assert_eq!(normalize_severity("bandit", "medium"), Severity::High);
        assert_eq!(normalize_severity("bandit", "LOW"), Severity::Medium);
        assert_eq!(normalize_category("bandit", "B603"), Category::Security);
    }

    #[test]
    fn unknown_values_hit_documented_defaults() {
        assert_eq!(normalize_severity("pylint", "??"), Severity::Medium);
        assert_eq!(normalize_severity("some-new-tool", "wat"), Severity::Medium);
        assert_eq!(normalize_category("some-new-tool", "wat"), Category::Style);
    }

    #[test]
    fn ai_provider_long_labels() {
        assert_eq!(normalize_category("openai", "performance_issue"), Category::Performance);
        assert_eq!(
            normalize_category("anthropic", "security_vulnerability"),
            Category::Security
        );
        assert_eq!(normalize_category("cohere", "input_validation"), Category::Security);
        assert_eq!(normalize_severity("openai", "CRITICAL"), Severity::Critical);
    }

    #[test]
    fn mapping_is_total_over_arbitrary_input() {
        // No input may panic or escape the closed enums.
        for raw in ["", "🦀", "ERROR;DROP TABLE", "high\n", "-1"] {
            let _ = normalize_severity("pylint", raw);
            let _ = normalize_severity("unknown", raw);
            let _ = normalize_category("eslint", raw);
            let _ = normalize_category("unknown", raw);
        }
    }
}
