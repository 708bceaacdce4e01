//! HTTP client for the scoring service
//!
//! Endpoints:
//! - `GET  /characters` → `["name", ...]`
//! - `POST /affinity` `{"character_name"}` → `{"name": score, ...}`
//! - `POST /lineage_stats` `{"lineage": [7]}` → stats report
//! - `POST /optimize` `{"lineage_names": [7], "available_names": [...]}` →
//!   suggestion report or `{"error": msg}`

use super::types::{affinity_from_json, OptimizeReply};
use super::{AffinityScoreMap, FetchError, LineageReport, ScoringService};
use crate::config::LineageConfig;
use crate::slots::WireLineage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const USER_AGENT: &str = concat!("lineage-common/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct AffinityRequest<'a> {
    character_name: &'a str,
}

#[derive(Serialize)]
struct StatsRequest<'a> {
    lineage: &'a WireLineage,
}

#[derive(Serialize)]
struct OptimizeRequest<'a> {
    lineage_names: &'a WireLineage,
    available_names: &'a [String],
}

/// reqwest-backed [`ScoringService`]
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LineageConfig) -> Result<Self, FetchError> {
        Self::new(config.server_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, FetchError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST scoring service");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn list_characters(&self) -> Result<Vec<String>, FetchError> {
        let url = self.url("characters");
        tracing::debug!(url = %url, "GET scoring service");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let roster: Vec<String> = Self::decode(response).await?;
        tracing::debug!(count = roster.len(), "Retrieved roster");
        Ok(roster)
    }

    async fn affinity(&self, child_id: &str) -> Result<AffinityScoreMap, FetchError> {
        let raw: HashMap<String, Value> = self
            .post(
                "affinity",
                &AffinityRequest {
                    character_name: child_id,
                },
            )
            .await?;
        Ok(affinity_from_json(raw))
    }

    async fn lineage_stats(&self, lineage: &WireLineage) -> Result<LineageReport, FetchError> {
        self.post("lineage_stats", &StatsRequest { lineage }).await
    }

    async fn optimize(
        &self,
        lineage: &WireLineage,
        candidate_pool: &[String],
    ) -> Result<LineageReport, FetchError> {
        let reply: OptimizeReply = self
            .post(
                "optimize",
                &OptimizeRequest {
                    lineage_names: lineage,
                    available_names: candidate_pool,
                },
            )
            .await?;

        match reply {
            OptimizeReply::Report(report) => Ok(report),
            OptimizeReply::Rejected { error } => Err(FetchError::Rejected(error)),
        }
    }
}
