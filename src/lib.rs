//! critiq — multi-source code review aggregation.
//!
//! Fans a code sample out to external static analyzers and an AI
//! provider failover chain, normalizes every finding into one
//! severity/category vocabulary, and merges the results into a single
//! scored review.
//!
//! ```text
//!                  ┌──────────────┐
//!   request ──────▶│   pipeline   │──────▶ aggregated review
//!                  └──────┬───────┘
//!            ┌────────────┴────────────┐
//!      ┌─────▼─────┐             ┌─────▼─────┐
//!      │   tools   │             │  analysis │
//!      │ pylint    │             │ openai →  │
//!      │ eslint    │             │ anthropic │
//!      │ bandit    │             │ → cohere  │
//!      └───────────┘             │ → offline │
//!                                └───────────┘
//! ```

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod pipeline;
pub mod review;
pub mod tools;
pub mod util;
