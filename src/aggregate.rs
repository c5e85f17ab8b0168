//! Merge per-source results into one scored review.
//!
//! Pure except for the UUID and timestamp it stamps on the result:
//! the same inputs always produce the same score, summary, and
//! recommendations, so two reviews of the same code are comparable.

use chrono::Utc;
use uuid::Uuid;

use crate::review::{
    AggregatedReview, Category, FocusArea, Issue, Language, SeverityCounts, SourceOutcome,
    SourceResult, Suggestion,
};

/// Weight of the static-analysis average in the overall score.
const STATIC_WEIGHT: f64 = 0.6;
/// Weight of the AI score in the overall score.
const AI_WEIGHT: f64 = 0.4;
/// Score substituted for an absent side of the blend.
const NEUTRAL_SCORE: f64 = 5.0;
/// Upper bound on recommendation entries.
const MAX_RECOMMENDATIONS: usize = 5;

/// Inputs the aggregator needs beyond the source results.
pub struct ReviewMeta {
    pub language: Language,
    pub file_name: Option<String>,
    pub focus_areas: Vec<FocusArea>,
    pub duration_ms: u64,
}

/// Merge static-tool and AI results into an [`AggregatedReview`].
pub fn aggregate(
    static_results: &[SourceResult],
    ai_result: Option<&SourceResult>,
    meta: ReviewMeta,
) -> AggregatedReview {
    let mut issues: Vec<Issue> = Vec::new();
    let mut suggestions: Vec<Suggestion> = Vec::new();
    let mut sources_used = Vec::new();
    let mut source_outcomes = Vec::new();

    for result in static_results.iter().chain(ai_result) {
        issues.extend(result.issues.iter().cloned());
        suggestions.extend(result.suggestions.iter().cloned());
        sources_used.push(result.source.clone());
        source_outcomes.push(SourceOutcome {
            source: result.source.clone(),
            status: result.status,
            score: result.score,
        });
    }

    let overall_score = blend_scores(static_results, ai_result);
    let severity_counts = SeverityCounts::tally(&issues);
    let summary = build_summary(overall_score, &severity_counts, suggestions.len());
    let recommendations =
        build_recommendations(&issues, &severity_counts, &meta.focus_areas, suggestions.len());

    AggregatedReview {
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        language: meta.language,
        file_name: meta.file_name,
        overall_score,
        issues,
        severity_counts,
        suggestion_count: suggestions.len(),
        summary,
        recommendations,
        sources_used,
        source_outcomes,
        duration_ms: meta.duration_ms,
    }
}

/// Weighted blend of the static average and the AI score.
///
/// Either side missing contributes the neutral score, so a
/// static-only or AI-only review still lands on the same scale.
fn blend_scores(static_results: &[SourceResult], ai_result: Option<&SourceResult>) -> f64 {
    let static_avg = if static_results.is_empty() {
        NEUTRAL_SCORE
    } else {
        let sum: f64 = static_results.iter().map(|r| r.score.clamp(0.0, 10.0)).sum();
        sum / static_results.len() as f64
    };
    let ai_score = ai_result.map(|r| r.score.clamp(0.0, 10.0)).unwrap_or(NEUTRAL_SCORE);

    round2(STATIC_WEIGHT * static_avg + AI_WEIGHT * ai_score)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn build_summary(score: f64, counts: &SeverityCounts, suggestion_count: usize) -> String {
    let band = if score >= 8.0 {
        "excellent"
    } else if score >= 6.0 {
        "good, with minor improvements available"
    } else if score >= 4.0 {
        "in need of improvement"
    } else {
        "in need of significant attention"
    };
    let mut summary = format!("Code quality is {band} (score: {score:.1}/10).");
    if counts.total() > 0 {
        summary.push_str(&format!(" Found {} issue(s).", counts.total()));
    }
    if suggestion_count > 0 {
        summary.push_str(&format!(
            " {suggestion_count} improvement suggestion(s) available."
        ));
    }
    summary
}

/// Prioritized next steps, capped at [`MAX_RECOMMENDATIONS`].
///
/// Order is fixed: critical findings first, then security, then the
/// caller's focus areas, then a pointer at the suggestion list.
fn build_recommendations(
    issues: &[Issue],
    counts: &SeverityCounts,
    focus_areas: &[FocusArea],
    suggestion_count: usize,
) -> Vec<String> {
    let mut recs = Vec::new();

    if counts.critical > 0 {
        recs.push(format!(
            "Address {} critical issue(s) before merging",
            counts.critical
        ));
    }

    let security_count = issues.iter().filter(|i| i.category == Category::Security).count();
    if security_count > 0 {
        recs.push(format!("Review {} security finding(s)", security_count));
    }

    for area in focus_areas {
        recs.push(area.recommendation().to_string());
    }

    if suggestion_count > 0 {
        recs.push(format!("Apply {} improvement suggestion(s)", suggestion_count));
    }

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

// ── Tests ────────────────────────────────────────────────────────
