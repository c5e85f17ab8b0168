//! Provider failover chain.
//!
//! Tries providers in configured priority order; the first one whose
//! response survives recovery wins. Network errors, timeouts, and
//! unrecoverable responses all mean "move on", and the offline
//! heuristic analyzer closes the chain, so `analyze` is infallible.

use std::time::Duration;

use tracing::warn;

use super::heuristic;
use super::providers::{AnthropicProvider, CohereProvider, OpenAiProvider};
use super::recovery::recover;
use super::traits::AiProvider;
use crate::config::ProvidersConfig;
use crate::review::{Language, SourceResult};

pub struct ProviderChain {
    providers: Vec<Box<dyn AiProvider>>,
}

impl ProviderChain {
    /// Build the chain from configuration, honoring priority order
    /// and skipping providers with no API key.
    pub fn from_config(cfg: &ProvidersConfig, timeout: Duration) -> Self {
        let mut providers: Vec<Box<dyn AiProvider>> = Vec::new();
        for name in &cfg.priority {
            let Some(provider_cfg) = cfg.get(name) else {
                warn!(provider = %name, "unknown provider in priority list, skipping");
                continue;
            };
            if !provider_cfg.is_configured() {
                continue;
            }
            match name.as_str() {
                "openai" => providers.push(Box::new(OpenAiProvider::new(provider_cfg, timeout))),
                "anthropic" => {
                    providers.push(Box::new(AnthropicProvider::new(provider_cfg, timeout)))
                }
                "cohere" => providers.push(Box::new(CohereProvider::new(provider_cfg, timeout))),
                _ => unreachable!("get() only resolves known providers"),
            }
        }
        Self { providers }
    }

    /// Build a chain over explicit providers. Test seam.
    pub fn with_providers(providers: Vec<Box<dyn AiProvider>>) -> Self {
        Self { providers }
    }

    /// Names of the providers currently in the chain.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run the chain over a sanitized code sample.
    ///
    /// Never fails: if every provider errors out or answers with
    /// nothing usable, the heuristic analyzer supplies the result.
    pub async fn analyze(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
    ) -> SourceResult {
        for provider in &self.providers {
            match provider.analyze(code, language, context).await {
                Ok(raw) => match recover(provider.name(), raw) {
                    Some(result) => return result,
                    None => {
                        warn!(provider = provider.name(), "empty response, trying next provider");
                    }
                },
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider call failed, trying next");
                }
            }
        }
        heuristic::analyze(code, language)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::traits::{AiAnalysis, RawResponse};
    use crate::review::{Category, SourceStatus};
    use async_trait::async_trait;

    struct StubProvider {
        name: &'static str,
        response: anyhow::Result<RawResponse>,
    }

    impl StubProvider {
        fn ok_structured(name: &'static str, score: f64) -> Box<dyn AiProvider> {
            Box::new(Self {
                name,
                response: Ok(RawResponse::Structured(AiAnalysis {
                    score,
                    summary: format!("{name} verdict"),
                    ..Default::default()
                })),
            })
        }

        fn ok_text(name: &'static str, text: &str) -> Box<dyn AiProvider> {
            Box::new(Self { name, response: Ok(RawResponse::Text(text.to_string())) })
        }

        fn failing(name: &'static str) -> Box<dyn AiProvider> {
            Box::new(Self { name, response: Err(anyhow::anyhow!("connection refused")) })
        }
    }

    #[async_trait]
    impl AiProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn analyze(
            &self,
            _code: &str,
            _language: Language,
            _context: Option<&str>,
        ) -> anyhow::Result<RawResponse> {
            match &self.response {
                Ok(raw) => Ok(raw.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    const FIBONACCI: &str = "\
def calculate_fibonacci(n):
    if n <= 1:
        return n
    return calculate_fibonacci(n - 1) + calculate_fibonacci(n - 2)
";

    #[tokio::test]
    async fn first_healthy_provider_wins() {
        let chain = ProviderChain::with_providers(vec![
            StubProvider::ok_structured("openai", 7.0),
            StubProvider::ok_structured("anthropic", 2.0),
        ]);
        let result = chain.analyze("x = 1", Language::Python, None).await;
        assert_eq!(result.source, "openai");
        assert_eq!(result.score, 7.0);
    }

    #[tokio::test]
    async fn failing_provider_is_skipped() {
        let chain = ProviderChain::with_providers(vec![
            StubProvider::failing("openai"),
            StubProvider::ok_structured("anthropic", 6.0),
        ]);
        let result = chain.analyze("x = 1", Language::Python, None).await;
        assert_eq!(result.source, "anthropic");
        assert_eq!(result.status, SourceStatus::Ok);
    }

    #[tokio::test]
    async fn empty_response_falls_through() {
        let chain = ProviderChain::with_providers(vec![
            StubProvider::ok_text("openai", "   "),
            StubProvider::ok_structured("cohere", 5.5),
        ]);
        let result = chain.analyze("x = 1", Language::Python, None).await;
        assert_eq!(result.source, "cohere");
    }

    #[tokio::test]
    async fn prose_about_recursion_recovers_with_low_score() {
        let chain = ProviderChain::with_providers(vec![StubProvider::ok_text(
            "openai",
            "This recursive implementation has exponential performance cost.",
        )]);
        let result = chain.analyze(FIBONACCI, Language::Python, None).await;
        assert_eq!(result.score, 3.0);
        assert_eq!(result.status, SourceStatus::Degraded);
        assert!(result.issues.iter().any(|i| i.category == Category::Performance));
    }

    #[tokio::test]
    async fn empty_chain_ends_at_heuristic() {
        let chain = ProviderChain::with_providers(vec![]);
        let result = chain.analyze(FIBONACCI, Language::Python, None).await;
        assert_eq!(result.source, "heuristic");
        assert_ne!(result.status, SourceStatus::Failed);
        assert!(result.issues.iter().any(|i| i.category == Category::Performance));
    }

    #[tokio::test]
    async fn all_failing_chain_ends_at_heuristic() {
        let chain = ProviderChain::with_providers(vec![
            StubProvider::failing("openai"),
            StubProvider::failing("anthropic"),
            StubProvider::failing("cohere"),
        ]);
        let result = chain
            .analyze("def add(a, b):\n    return a + b\n", Language::Python, None)
            .await;
        assert_eq!(result.source, "heuristic");
        assert_eq!(result.score, 8.0);
    }
}
