//! Vector index client (Qdrant REST API)
//!
//! Queries the incident collection for nearest neighbors. The index is
//! populated offline by the ingestion pipeline; this client only reads.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{IncidentType, QdrantConfig};
use crate::service::retry;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The backing store cannot be reached; callers may degrade gracefully
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    /// Query vector size disagrees with the index configuration; fatal
    #[error("Vector dimension mismatch: index expects {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The index answered but the response could not be interpreted
    #[error("Malformed index response: {0}")]
    Malformed(String),
}

/// Metadata filter applied server-side during the ANN search
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub industry: Option<String>,
    pub categories: Vec<IncidentType>,
}

impl QueryFilter {
    pub fn is_empty(&self) -> bool {
        self.industry.is_none() && self.categories.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct QueryParams {
    pub top_k: usize,
    pub filter: QueryFilter,
}

/// Incident payload as written by the ingestion loader.
///
/// Fields live either at the top level or nested under `metadata`
/// depending on the source batch, so both are accepted and all are
/// optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IncidentPayload {
    pub embedding_id: Option<String>,
    #[serde(default)]
    pub embedding_text: String,
    pub content: Option<String>,
    pub source_file: Option<String>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub estimated_cost: Option<f64>,
    pub records_affected: Option<u64>,
    #[serde(default)]
    pub metadata: PayloadMetadata,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PayloadMetadata {
    pub title: Option<String>,
    pub severity: Option<String>,
    pub organization: Option<String>,
    pub industry: Option<String>,
    pub incident_date: Option<String>,
    pub estimated_cost: Option<f64>,
    pub records_affected: Option<u64>,
}

/// One nearest-neighbor hit
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f64,
    pub payload: IncidentPayload,
}

/// Nearest-neighbor search over stored incident vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns at most `top_k` points, sorted descending by score and
    /// deduplicated by id.
    async fn query(&self, vector: &[f32], params: &QueryParams)
        -> Result<Vec<ScoredPoint>, IndexError>;
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<RawPoint>,
}

#[derive(Deserialize)]
struct RawPoint {
    id: PointId,
    score: f64,
    #[serde(default)]
    payload: IncidentPayload,
}

/// Qdrant point ids are either integers or UUID strings
#[derive(Deserialize)]
#[serde(untagged)]
enum PointId {
    Num(u64),
    Str(String),
}

impl PointId {
    fn into_string(self) -> String {
        match self {
            PointId::Num(n) => n.to_string(),
            PointId::Str(s) => s,
        }
    }
}

/// Client for a Qdrant collection holding incident vectors
#[derive(Clone)]
pub struct QdrantIndexClient {
    client: Client,
    config: QdrantConfig,
    /// Dimensionality the collection was created with
    dimensions: usize,
    max_top_k: usize,
}

impl QdrantIndexClient {
    pub fn new(config: QdrantConfig, dimensions: usize, max_top_k: usize) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sengol-intel/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config,
            dimensions,
            max_top_k,
        }
    }

    async fn attempt(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.config.base_url.as_str().trim_end_matches('/'),
            self.config.collection
        );

        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(filter_json) = build_filter(filter) {
            body["filter"] = filter_json;
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            // Qdrant reports vector size disagreement as a 400
            if detail.to_lowercase().contains("dimension") {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
            return Err(IndexError::Malformed(format!("HTTP {}: {}", status, detail)));
        }
        if !status.is_success() {
            return Err(IndexError::Unavailable(format!("HTTP {}", status)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Malformed(e.to_string()))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|p| ScoredPoint {
                id: p.id.into_string(),
                score: p.score,
                payload: p.payload,
            })
            .collect())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndexClient {
    async fn query(
        &self,
        vector: &[f32],
        params: &QueryParams,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if vector.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let top_k = params.top_k.clamp(1, self.max_top_k);

        let mut points = retry::with_backoff(
            "qdrant_search",
            |e: &IndexError| matches!(e, IndexError::Unavailable(_)),
            || self.attempt(vector, top_k, &params.filter),
        )
        .await?;

        // The index should already return ranked results, but ordering and
        // uniqueness are part of this client's contract
        points.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut seen = HashSet::new();
        points.retain(|p| seen.insert(p.id.clone()));
        points.truncate(top_k);

        tracing::debug!(
            collection = %self.config.collection,
            top_k = top_k,
            returned = points.len(),
            "Vector index query completed"
        );

        Ok(points)
    }
}

/// Build a Qdrant filter from the metadata constraints, if any
fn build_filter(filter: &QueryFilter) -> Option<serde_json::Value> {
    if filter.is_empty() {
        return None;
    }

    let mut must = Vec::new();

    if !filter.categories.is_empty() {
        let categories: Vec<&str> = filter.categories.iter().map(|c| c.as_str()).collect();
        must.push(json!({ "key": "category", "match": { "any": categories } }));
    }

    if let Some(industry) = &filter.industry {
        must.push(json!({ "key": "industry", "match": { "value": industry } }));
    }

    Some(json!({ "must": must }))
}
