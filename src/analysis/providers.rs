//! Concrete [`AiProvider`] implementations.
//!
//! Each provider wraps a specific model API, renders the shared
//! analysis prompt, and returns either a structured analysis (when
//! the model honored the requested JSON schema) or its raw text for
//! the recovery ladder to salvage.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{AiAnalysis, AiProvider, RawResponse};
use crate::config::ProviderConfig;
use crate::review::Language;

// ── Shared prompt ────────────────────────────────────────────────

/// Build the analysis prompt sent to every provider.
///
/// The template is fixed so the same input always produces the same
/// prompt regardless of which provider ends up answering.
pub fn analysis_prompt(code: &str, language: Language, context: Option<&str>) -> String {
    let context_section = match context {
        Some(ctx) if !ctx.is_empty() => format!("\n## Additional Context\n{ctx}\n"),
        _ => String::new(),
    };

    format!(
        r#"You are an expert code reviewer analyzing a {lang} code sample.

## Code
```{lang}
{code}
```
{context}
## Instructions
Analyze the code for correctness, performance, security, style, and
maintainability. Respond in EXACTLY this JSON format:

```json
{{
  "score": 0.0 to 10.0,
  "issues": [
    {{
      "type": "performance_issue" | "security_vulnerability" | "style_issue" | "maintainability" | "correctness",
      "severity": "critical" | "high" | "medium" | "low",
      "line": line number or null,
      "message": "what the issue is",
      "suggestion": "how to fix it or null"
    }}
  ],
  "suggestions": [
    {{
      "type": "improvement category",
      "description": "what to change",
      "code": "example code or null",
      "reason": "why it helps"
    }}
  ],
  "security_concerns": [
    {{
      "type": "concern category",
      "severity": "critical" | "high" | "medium" | "low",
      "description": "what the concern is",
      "mitigation": "how to mitigate it"
    }}
  ],
  "performance_notes": [
    {{
      "area": "affected area",
      "issue": "what is slow",
      "suggestion": "how to speed it up"
    }}
  ],
  "readability_score": 0.0 to 10.0,
  "maintainability_score": 0.0 to 10.0,
  "summary": "one-paragraph overall assessment"
}}
```

Focus on substantive issues. If the code is good, say so."#,
        lang = language.label(),
        code = code,
        context = context_section,
    )
}

/// Parse a provider's completion text: structured when it conforms to
/// the requested schema, raw text otherwise.
fn classify_completion(text: &str) -> RawResponse {
    let candidate = extract_json_block(text);
    match serde_json::from_str::<AiAnalysis>(candidate) {
        Ok(analysis) => RawResponse::Structured(analysis),
        Err(_) => RawResponse::Text(text.to_string()),
    }
}

/// Extract JSON content from a response that may be wrapped in
/// ```json blocks, or embedded bare in surrounding prose (taken as
/// the span between the outermost braces).
pub(crate) fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return text[json_start..json_start + end].trim();
        }
    }
    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        if let Some(end) = text[block_start..].find("```") {
            let candidate = text[block_start..block_start + end].trim();
            // Skip the language identifier line if present
            if let Some(nl) = candidate.find('\n') {
                let first_line = &candidate[..nl];
                if !first_line.starts_with('{') {
                    return candidate[nl + 1..].trim();
                }
            }
            return candidate;
        }
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].trim();
        }
    }
    text.trim()
}

// ── OpenAI provider ──────────────────────────────────────────────

/// Analysis provider backed by the OpenAI chat completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(cfg: &ProviderConfig, timeout: Duration) -> Self {
        Self {
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn analyze(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
    ) -> anyhow::Result<RawResponse> {
        let prompt = analysis_prompt(code, language, context);

        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": prompt,
            }]
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error {}: {}", status, body);
        }

        let body: serde_json::Value = resp.json().await?;
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        Ok(classify_completion(text))
    }
}

// ── Anthropic provider ───────────────────────────────────────────

/// Analysis provider backed by the Anthropic messages API.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(cfg: &ProviderConfig, timeout: Duration) -> Self {
        Self {
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn analyze(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
    ) -> anyhow::Result<RawResponse> {
        let prompt = analysis_prompt(code, language, context);

        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": prompt,
            }]
        });

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error {}: {}", status, body);
        }

        let body: serde_json::Value = resp.json().await?;
        let text = body["content"][0]["text"].as_str().unwrap_or_default();

        Ok(classify_completion(text))
    }
}

// ── Cohere provider ──────────────────────────────────────────────

/// Analysis provider backed by the Cohere generate API.
pub struct CohereProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
    client: reqwest::Client,
}

impl CohereProvider {
    pub fn new(cfg: &ProviderConfig, timeout: Duration) -> Self {
        Self {
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiProvider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn analyze(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
    ) -> anyhow::Result<RawResponse> {
        let prompt = analysis_prompt(code, language, context);

        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "prompt": prompt,
        });

        let resp = self
            .client
            .post("https://api.cohere.ai/v1/generate")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Cohere API error {}: {}", status, body);
        }

        let body: serde_json::Value = resp.json().await?;
        let text = body["generations"][0]["text"].as_str().unwrap_or_default();

        Ok(classify_completion(text))
    }
}

// ── Tests ────────────────────────────────────────────────────────
