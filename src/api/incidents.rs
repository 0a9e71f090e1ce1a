//! REST API endpoint for incident similarity search

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::{IncidentStatistics, IncidentType, SimilarityMatch};
use crate::service::incident_search::{calculate_incident_statistics, SearchOptions};
use crate::service::IncidentSearchService;

/// Incident similarity search request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSearchRequest {
    /// Free-text system or scenario description to match against
    pub description: String,
    /// Restrict matches to this industry
    pub industry: Option<String>,
    /// Restrict matches to these incident categories
    #[serde(default)]
    pub incident_types: Vec<IncidentType>,
    /// Maximum number of matches to return
    pub limit: Option<usize>,
    /// Override the configured similarity cutoff
    pub min_similarity: Option<f64>,
}

/// Incident similarity search response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSearchResponse {
    pub matches: Vec<SimilarityMatch>,
    pub statistics: IncidentStatistics,
}

/// Search historical incidents similar to a description
#[utoipa::path(
    post,
    path = "/v1/incidents/search",
    request_body = IncidentSearchRequest,
    responses(
        (status = 200, description = "Matches retrieved", body = IncidentSearchResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "incidents"
)]
#[post("/v1/incidents/search")]
pub async fn search_incidents(
    service: web::Data<IncidentSearchService>,
    body: web::Json<IncidentSearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();

    if request.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "description must not be empty".to_string(),
        ));
    }

    let matches = service
        .find_similar_incidents(
            &request.description,
            &SearchOptions {
                limit: request.limit,
                min_similarity: request.min_similarity,
                industry: request.industry,
                incident_types: request.incident_types,
            },
        )
        .await?;

    let statistics = calculate_incident_statistics(&matches);

    Ok(HttpResponse::Ok().json(IncidentSearchResponse {
        matches,
        statistics,
    }))
}

/// Configure incident routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search_incidents);
}
