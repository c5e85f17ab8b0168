//! Small shared helpers: secret redaction and string trimming.

use std::sync::OnceLock;

use regex::Regex;

/// Placeholder substituted for redacted credential values.
const REDACTED: &str = "***REDACTED***";

fn secret_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Assignment-shaped credentials only; matching bare words
        // would mangle legitimate identifiers.
        [
            r#"(?i)api[_-]?key\s*=\s*["'][^"']+["']"#,
            r#"(?i)password\s*=\s*["'][^"']+["']"#,
            r#"(?i)secret\s*=\s*["'][^"']+["']"#,
            r#"(?i)token\s*=\s*["'][^"']+["']"#,
            r#"(?i)\bkey\s*=\s*["'][^"']+["']"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static regex"))
        .collect()
    })
}

/// Strip credential-looking assignments from a code sample before it
/// is written to disk or sent to an AI provider.
pub fn sanitize_code(code: &str) -> String {
    let mut sanitized = code.to_string();
    for pattern in secret_patterns() {
        sanitized = pattern.replace_all(&sanitized, REDACTED).into_owned();
    }
    sanitized
}

/// Truncate on a char boundary, appending an ellipsis when trimmed.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}…")
}
