//! AI provider chain: prompt, fallback, and response recovery.
//!
//! A configured set of AI backends is tried strictly in priority
//! order; the first response that can be coerced into the unified
//! schema wins. When every backend fails to respond at all, a pure
//! offline pattern analyzer produces the result instead, so the chain
//! never returns an error.
//!
//! ```text
//! code ─▸ openai ──(skip on error)──▸ anthropic ──▸ cohere ──▸ heuristic
//!            │                           │            │           │
//!            ▾                           ▾            ▾           ▾
//!        RawResponse ───▸ recovery (json / fragment / keywords) ─▸ SourceResult
//! ```
//!
//! Add a new backend by implementing [`AiProvider`] and registering
//! it in [`ProviderChain::from_config`].

pub mod chain;
pub mod heuristic;
pub mod providers;
pub mod recovery;
pub mod traits;

#[allow(unused_imports)]
pub use chain::ProviderChain;
#[allow(unused_imports)]
pub use providers::{AnthropicProvider, CohereProvider, OpenAiProvider};
#[allow(unused_imports)]
pub use traits::{AiAnalysis, AiProvider, RawResponse};
