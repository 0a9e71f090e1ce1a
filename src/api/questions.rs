//! REST API endpoints for dynamic question generation

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::api::error::ApiError;
use crate::db::repository::AssessmentRepository;
use crate::model::GenerationContext;
use crate::service::DynamicQuestionGenerator;

/// Query parameters for question generation
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    /// Assessment to persist the generated set under (optional)
    pub assessment_id: Option<String>,
}

/// Generate an evidence-weighted question set for a system description
#[utoipa::path(
    post,
    path = "/v1/questions/generate",
    params(GenerateParams),
    request_body = GenerationContext,
    responses(
        (status = 200, description = "Question set generated", body = crate::model::GeneratedQuestionSet),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "questions"
)]
#[post("/v1/questions/generate")]
pub async fn generate_questions(
    generator: web::Data<DynamicQuestionGenerator>,
    repository: web::Data<AssessmentRepository>,
    query: web::Query<GenerateParams>,
    body: web::Json<GenerationContext>,
) -> Result<HttpResponse, ApiError> {
    let ctx = body.into_inner();
    let set = generator.generate(&ctx).await?;

    // Persistence is best effort; the computed set is returned regardless
    if let Some(assessment_id) = &query.assessment_id {
        if let Err(e) = repository
            .save_generated_questions(
                assessment_id,
                &set.generation_metadata.fingerprint,
                &set.risk_questions,
                &set.compliance_questions,
            )
            .await
        {
            tracing::warn!(
                error = %e,
                assessment_id = %assessment_id,
                "Failed to persist generated questions"
            );
        }
    }

    Ok(HttpResponse::Ok().json(set))
}

/// Fetch the persisted question set for an assessment
#[utoipa::path(
    get,
    path = "/v1/assessments/{id}/questions",
    params(
        ("id" = String, Path, description = "Assessment ID")
    ),
    responses(
        (status = 200, description = "Persisted question set"),
        (status = 404, description = "No question set persisted for this assessment"),
        (status = 500, description = "Internal server error")
    ),
    tag = "questions"
)]
#[get("/v1/assessments/{id}/questions")]
pub async fn get_assessment_questions(
    repository: web::Data<AssessmentRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let row = repository
        .get_generated_questions(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    let assessment_id = row.assessment_id.clone();
    let fingerprint = row.fingerprint.clone();
    let generated_at = row.generated_at;
    let (risk_questions, compliance_questions) = row
        .into_questions()
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "assessmentId": assessment_id,
        "fingerprint": fingerprint,
        "riskQuestions": risk_questions,
        "complianceQuestions": compliance_questions,
        "generatedAt": generated_at,
    })))
}

/// Configure question routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_questions).service(get_assessment_questions);
}

/// OpenAPI documentation for the service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sengol Intel API",
        description = "Incident similarity search and evidence-weighted question generation"
    ),
    paths(
        generate_questions,
        get_assessment_questions,
        crate::api::incidents::search_incidents,
        crate::api::health::liveness,
        crate::api::health::readiness,
    ),
    components(schemas(
        crate::model::GenerationContext,
        crate::model::GeneratedQuestionSet,
        crate::model::GeneratedQuestion,
        crate::model::GenerationMetadata,
        crate::model::QuestionEvidence,
        crate::model::IncidentSummary,
        crate::model::IncidentRef,
        crate::model::IncidentStatistics,
        crate::model::SeverityDistribution,
        crate::model::SimilarityMatch,
        crate::model::IncidentRecord,
        crate::model::IncidentType,
        crate::model::Severity,
        crate::model::Domain,
        crate::model::Priority,
        crate::model::QuestionIntensity,
        crate::api::incidents::IncidentSearchRequest,
        crate::api::incidents::IncidentSearchResponse,
        crate::api::health::HealthStatus,
        crate::api::health::ReadinessStatus,
        crate::api::health::DependencyHealth,
    ))
)]
pub struct ApiDoc;
