//! In-memory review history.
//!
//! Bounded ring of completed reviews backing the lookup and metrics
//! endpoints. Oldest entries fall off first; nothing is persisted
//! across restarts.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::review::{AggregatedReview, SeverityCounts};

/// Maximum number of reviews retained.
pub const HISTORY_CAPACITY: usize = 100;

/// Number of reviews listed in the metrics snapshot.
const RECENT_WINDOW: usize = 10;

#[derive(Default)]
pub struct ReviewHistory {
    entries: Mutex<VecDeque<AggregatedReview>>,
}

/// Compact view of one review for the metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDigest {
    pub id: String,
    pub language: String,
    pub overall_score: f64,
    pub issue_count: usize,
}

/// Dashboard snapshot over the retained history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMetrics {
    pub total_reviews: usize,
    pub average_score: f64,
    pub language_distribution: HashMap<String, usize>,
    pub total_issues: usize,
    pub severity_totals: SeverityCounts,
    pub recent_reviews: Vec<ReviewDigest>,
}

impl ReviewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished review, evicting the oldest past capacity.
    pub fn append(&self, review: AggregatedReview) {
        let mut entries = self.entries.lock();
        if entries.len() >= HISTORY_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(review);
    }

    /// Look up a retained review by ID.
    pub fn get(&self, id: &str) -> Option<AggregatedReview> {
        self.entries.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Aggregate metrics over everything currently retained.
    pub fn metrics(&self) -> HistoryMetrics {
        let entries = self.entries.lock();

        let total_reviews = entries.len();
        let average_score = if total_reviews == 0 {
            0.0
        } else {
            let sum: f64 = entries.iter().map(|r| r.overall_score).sum();
            ((sum / total_reviews as f64) * 100.0).round() / 100.0
        };

        let mut language_distribution: HashMap<String, usize> = HashMap::new();
        let mut total_issues = 0;
        let mut severity_totals = SeverityCounts::default();
        for review in entries.iter() {
            *language_distribution
                .entry(review.language.label().to_string())
                .or_default() += 1;
            total_issues += review.issues.len();
            severity_totals.critical += review.severity_counts.critical;
            severity_totals.high += review.severity_counts.high;
            severity_totals.medium += review.severity_counts.medium;
            severity_totals.low += review.severity_counts.low;
        }

        let recent_reviews = entries
            .iter()
            .rev()
            .take(RECENT_WINDOW)
            .map(|r| ReviewDigest {
                id: r.id.clone(),
                language: r.language.label().to_string(),
                overall_score: r.overall_score,
                issue_count: r.issues.len(),
            })
            .collect();

        HistoryMetrics {
            total_reviews,
            average_score,
            language_distribution,
            total_issues,
            severity_totals,
            recent_reviews,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
