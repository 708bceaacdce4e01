//! Remote scoring service contract
//!
//! The core consumes four logical operations. Transport and encoding are
//! the implementor's business; [`HttpScoringClient`] speaks the JSON/HTTP
//! dialect of the Flask scoring server.

mod http;
mod types;

pub use http::HttpScoringClient;
pub use types::{AffinityScoreMap, LineageReport};

use crate::slots::WireLineage;
use async_trait::async_trait;
use thiserror::Error;

/// Scoring service failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Connection, DNS or timeout failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Service answered with a non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Reply body did not decode
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Service answered successfully but refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Request task ended without a reply
    #[error("Request task failed: {0}")]
    TaskFailed(String),
}

/// Remote roster, affinity, stats and optimizer operations
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Every character id in roster order
    async fn list_characters(&self) -> Result<Vec<String>, FetchError>;

    /// Affinity of each other character with `child_id`
    async fn affinity(&self, child_id: &str) -> Result<AffinityScoreMap, FetchError>;

    /// Pairwise and aggregate stats for a lineage (blanks allowed);
    /// the report's lineage echoes the request
    async fn lineage_stats(&self, lineage: &WireLineage) -> Result<LineageReport, FetchError>;

    /// Best completion of `lineage` drawing on `candidate_pool`;
    /// the report's lineage is the suggestion
    async fn optimize(
        &self,
        lineage: &WireLineage,
        candidate_pool: &[String],
    ) -> Result<LineageReport, FetchError>;
}
