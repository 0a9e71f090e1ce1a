//! Incident similarity search and evidence aggregation
//!
//! Combines the embedding client and the vector index: embeds a system
//! description, retrieves nearest historical incidents, post-filters them by
//! similarity threshold, and aggregates the survivors into statistics.
//!
//! Incident evidence is an enrichment, not a hard dependency: when either
//! backend is unavailable the search degrades to an empty result instead of
//! failing the request. Configuration faults (vector dimension mismatch) are
//! the exception and propagate.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::model::{
    IncidentRecord, IncidentStatistics, IncidentType, SearchConfig, Severity, SimilarityMatch,
};
use crate::service::embedding::{Embedder, EmbeddingError};
use crate::service::vector_index::{
    IndexError, QueryFilter, QueryParams, ScoredPoint, VectorIndex,
};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Integrity fault that would corrupt downstream weights if swallowed
    #[error("Search configuration fault: {0}")]
    Configuration(String),
}

/// Per-call search options; unset fields fall back to [`SearchConfig`]
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub min_similarity: Option<f64>,
    pub industry: Option<String>,
    pub incident_types: Vec<IncidentType>,
}

/// Retrieves historical incidents semantically similar to a description
#[derive(Clone)]
pub struct IncidentSearchService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: SearchConfig,
}

impl IncidentSearchService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Find stored incidents similar to `description`.
    ///
    /// Two-stage filter: the index returns a fixed `top_k` regardless of
    /// absolute relevance, so weak matches are dropped afterwards by the
    /// similarity threshold rather than trusted by rank alone.
    pub async fn find_similar_incidents(
        &self,
        description: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SimilarityMatch>, SearchError> {
        let vector = match self.embedder.embed(description).await {
            Ok(v) => v,
            Err(e @ EmbeddingError::ServiceUnavailable(_)) => {
                tracing::warn!(error = %e, "Embedding unavailable, proceeding without evidence");
                return Ok(Vec::new());
            }
            Err(e @ EmbeddingError::InvalidInput(_)) => {
                tracing::warn!(error = %e, "Embedding rejected input, proceeding without evidence");
                return Ok(Vec::new());
            }
        };

        let params = QueryParams {
            top_k: options.limit.unwrap_or(self.config.default_limit),
            filter: QueryFilter {
                industry: options.industry.clone(),
                categories: options.incident_types.clone(),
            },
        };

        let points = match self.index.query(&vector, &params).await {
            Ok(points) => points,
            Err(e @ (IndexError::Unavailable(_) | IndexError::Malformed(_))) => {
                tracing::warn!(error = %e, "Vector index unavailable, proceeding without evidence");
                return Ok(Vec::new());
            }
            Err(e @ IndexError::DimensionMismatch { .. }) => {
                return Err(SearchError::Configuration(e.to_string()));
            }
        };

        let threshold = options.min_similarity.unwrap_or(self.config.min_similarity);
        let retrieved = points.len();

        let matches: Vec<SimilarityMatch> = points
            .into_iter()
            .filter(|p| p.score >= threshold)
            .filter_map(match_from_point)
            .enumerate()
            .map(|(rank, mut m)| {
                m.rank = rank;
                m
            })
            .collect();

        tracing::debug!(
            retrieved = retrieved,
            kept = matches.len(),
            threshold = threshold,
            "Incident search completed"
        );

        Ok(matches)
    }
}

/// Aggregate a match set into statistics.
///
/// Costs are averaged only over matches that report one; treating a missing
/// cost as zero would bias the average downward. An empty input yields
/// zeroed aggregates, never NaN.
pub fn calculate_incident_statistics(matches: &[SimilarityMatch]) -> IncidentStatistics {
    if matches.is_empty() {
        return IncidentStatistics::default();
    }

    let mut distribution = crate::model::SeverityDistribution::default();
    let mut total_cost = 0.0;
    let mut costed = 0usize;
    let mut similarity_sum = 0.0;

    for m in matches {
        distribution.record(m.record.severity);
        similarity_sum += m.similarity;
        if let Some(cost) = m.record.estimated_cost {
            total_cost += cost;
            costed += 1;
        }
    }

    IncidentStatistics {
        total_incidents_analyzed: matches.len(),
        avg_cost: (costed > 0).then(|| total_cost / costed as f64),
        total_cost,
        avg_similarity_score: similarity_sum / matches.len() as f64,
        severity_distribution: distribution,
    }
}

/// Convert a scored index point into a similarity match.
///
/// Records whose category tag cannot be interpreted are dropped: without a
/// category they cannot be tied to any question's evidence set.
fn match_from_point(point: ScoredPoint) -> Option<SimilarityMatch> {
    let payload = point.payload;

    let incident_type = payload
        .category
        .as_deref()
        .and_then(IncidentType::from_category)?;

    let severity = payload
        .metadata
        .severity
        .as_deref()
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium);

    let estimated_cost = payload
        .estimated_cost
        .or(payload.metadata.estimated_cost)
        .filter(|c| *c >= 0.0);

    let embedding_text = if payload.embedding_text.is_empty() {
        payload.content.unwrap_or_default()
    } else {
        payload.embedding_text
    };

    let record = IncidentRecord {
        id: payload.embedding_id.unwrap_or(point.id),
        incident_type,
        organization: payload.metadata.organization,
        industry: payload.industry.or(payload.metadata.industry),
        severity,
        incident_date: payload
            .metadata
            .incident_date
            .as_deref()
            .and_then(parse_incident_date),
        estimated_cost,
        records_affected: payload.records_affected.or(payload.metadata.records_affected),
        embedding_text,
        source_file: payload.source_file,
    };

    Some(SimilarityMatch {
        record,
        similarity: point.score.clamp(0.0, 1.0),
        rank: 0,
    })
}

/// Ingested dates arrive as plain dates or full timestamps
fn parse_incident_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}
