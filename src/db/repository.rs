//! Repository for persisted assessment question sets
//!
//! Ownership of the assessment is enforced by the calling layer; this
//! repository assumes the caller is already authorized.

use sqlx::PgPool;

use super::models::GeneratedQuestionsRow;
use super::DbError;
use crate::model::GeneratedQuestion;

/// Repository for generated question persistence
#[derive(Clone)]
pub struct AssessmentRepository {
    pool: PgPool,
}

impl AssessmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the generated question set for an assessment
    pub async fn save_generated_questions(
        &self,
        assessment_id: &str,
        fingerprint: &str,
        risk_questions: &[GeneratedQuestion],
        compliance_questions: &[GeneratedQuestion],
    ) -> Result<(), DbError> {
        let risk = serde_json::to_value(risk_questions)
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        let compliance = serde_json::to_value(compliance_questions)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO generated_questions (
                assessment_id, fingerprint, risk_questions, compliance_questions, generated_at
            ) VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (assessment_id) DO UPDATE SET
                fingerprint = EXCLUDED.fingerprint,
                risk_questions = EXCLUDED.risk_questions,
                compliance_questions = EXCLUDED.compliance_questions,
                generated_at = EXCLUDED.generated_at
            "#,
        )
        .bind(assessment_id)
        .bind(fingerprint)
        .bind(risk)
        .bind(compliance)
        .execute(&self.pool)
        .await?;

        tracing::debug!(assessment_id = %assessment_id, "Persisted generated questions");
        Ok(())
    }

    /// Fetch the persisted question set for an assessment, if any
    pub async fn get_generated_questions(
        &self,
        assessment_id: &str,
    ) -> Result<Option<GeneratedQuestionsRow>, DbError> {
        let row = sqlx::query_as::<_, GeneratedQuestionsRow>(
            r#"
            SELECT assessment_id, fingerprint, risk_questions, compliance_questions, generated_at
            FROM generated_questions
            WHERE assessment_id = $1
            "#,
        )
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
