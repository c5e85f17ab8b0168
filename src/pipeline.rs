//! Review orchestration.
//!
//! Validates a request at the boundary, runs the static tools and
//! the provider chain concurrently, merges their results, and records
//! the finished review in history. Analyzer failures never surface
//! here; only invalid requests do.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::{aggregate, ReviewMeta};
use crate::analysis::ProviderChain;
use crate::config::Config;
use crate::error::{ReviewError, Result};
use crate::history::ReviewHistory;
use crate::review::{
    AggregatedReview, BatchItem, BatchReviewRequest, BatchReviewResponse, FocusArea, Language,
    ReviewRequest, SourceResult,
};
use crate::tools::ToolRunner;
use crate::util::sanitize_code;

pub struct ReviewPipeline {
    tools: ToolRunner,
    chain: ProviderChain,
    history: Arc<ReviewHistory>,
    max_code_bytes: usize,
    max_batch: usize,
    batch_workers: usize,
}

impl ReviewPipeline {
    pub fn new(config: &Config, history: Arc<ReviewHistory>) -> Self {
        let tools = ToolRunner::new(
            config.tools.clone(),
            Duration::from_secs(config.limits.tool_timeout_secs),
        );
        let chain = ProviderChain::from_config(
            &config.providers,
            Duration::from_secs(config.limits.provider_timeout_secs),
        );
        Self {
            tools,
            chain,
            history,
            max_code_bytes: config.limits.max_code_bytes,
            max_batch: config.limits.max_batch,
            batch_workers: config.limits.batch_workers.max(1),
        }
    }

    /// Swap in an explicit provider chain. Test seam.
    #[cfg(test)]
    pub fn with_chain(mut self, chain: ProviderChain) -> Self {
        self.chain = chain;
        self
    }

    /// Swap in an explicit tool runner. Test seam.
    #[cfg(test)]
    pub fn with_tools(mut self, tools: ToolRunner) -> Self {
        self.tools = tools;
        self
    }

    /// Run one review end to end.
    pub async fn review(&self, request: ReviewRequest) -> Result<AggregatedReview> {
        let start = Instant::now();
        let focus_areas = self.validate(&request)?;

        let code = sanitize_code(&request.code);
        let language = request.language;
        let context = request.context.as_deref();

        let (static_results, ai_result) = tokio::join!(
            self.run_static(&code, language, request.include_static_analysis),
            self.run_ai(&code, language, context, request.include_ai_analysis),
        );

        let review = aggregate(
            &static_results,
            ai_result.as_ref(),
            ReviewMeta {
                language,
                file_name: request.file_name,
                focus_areas,
                duration_ms: start.elapsed().as_millis() as u64,
            },
        );

        info!(
            review_id = %review.id,
            language = %review.language,
            score = review.overall_score,
            issues = review.issues.len(),
            "review completed"
        );

        self.history.append(review.clone());
        Ok(review)
    }

    /// Run an ordered batch with bounded concurrency.
    ///
    /// Per-item failures are isolated into [`BatchItem::Error`]; the
    /// batch itself only fails on a malformed envelope.
    pub async fn review_batch(&self, request: BatchReviewRequest) -> Result<BatchReviewResponse> {
        if request.reviews.is_empty() {
            return Err(ReviewError::Validation("batch contains no reviews".into()));
        }
        if request.reviews.len() > self.max_batch {
            return Err(ReviewError::Validation(format!(
                "batch size {} exceeds the maximum of {}",
                request.reviews.len(),
                self.max_batch,
            )));
        }

        let total = request.reviews.len();
        // `buffered` keeps completion in submission order.
        let results: Vec<BatchItem> = stream::iter(request.reviews)
            .map(|item| async {
                match self.review(item).await {
                    Ok(review) => BatchItem::Ok { review },
                    Err(e) => BatchItem::Error { error: e.to_string() },
                }
            })
            .buffered(self.batch_workers)
            .collect()
            .await;

        let successful_reviews = results
            .iter()
            .filter(|r| matches!(r, BatchItem::Ok { .. }))
            .count();

        Ok(BatchReviewResponse {
            batch_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            total,
            successful_reviews,
            failed_reviews: total - successful_reviews,
            results,
        })
    }

    fn validate(&self, request: &ReviewRequest) -> Result<Vec<FocusArea>> {
        if request.code.trim().is_empty() {
            return Err(ReviewError::Validation("code must not be empty".into()));
        }
        if request.code.len() > self.max_code_bytes {
            return Err(ReviewError::Validation(format!(
                "code size {} exceeds the maximum of {} bytes",
                request.code.len(),
                self.max_code_bytes,
            )));
        }

        if let Some(name) = &request.file_name {
            if let Some(inferred) = Language::from_file_name(name) {
                if inferred != request.language {
                    warn!(
                        file_name = %name,
                        declared = %request.language,
                        inferred = %inferred,
                        "file extension disagrees with declared language"
                    );
                }
            }
        }

        let mut focus_areas = Vec::new();
        if let Some(raw_areas) = &request.focus_areas {
            for raw in raw_areas {
                match FocusArea::parse(raw) {
                    Some(area) => focus_areas.push(area),
                    None => {
                        return Err(ReviewError::Validation(format!(
                            "unknown focus area: {raw}"
                        )))
                    }
                }
            }
        }
        Ok(focus_areas)
    }

    async fn run_static(
        &self,
        code: &str,
        language: Language,
        include: bool,
    ) -> Vec<SourceResult> {
        if !include {
            return Vec::new();
        }
        self.tools.run_all(code, language).await
    }

    async fn run_ai(
        &self,
        code: &str,
        language: Language,
        context: Option<&str>,
        include: bool,
    ) -> Option<SourceResult> {
        if !include {
            return None;
        }
        Some(self.chain.analyze(code, language, context).await)
    }
}

// ── Tests ────────────────────────────────────────────────────────
