//! Row types for the assessment store

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbError;
use crate::model::GeneratedQuestion;

/// Persisted question set for one assessment
#[derive(Debug, FromRow)]
pub struct GeneratedQuestionsRow {
    pub assessment_id: String,
    pub fingerprint: String,
    pub risk_questions: serde_json::Value,
    pub compliance_questions: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedQuestionsRow {
    /// Deserialize the stored JSONB columns back into question lists
    pub fn into_questions(
        self,
    ) -> Result<(Vec<GeneratedQuestion>, Vec<GeneratedQuestion>), DbError> {
        let risk = serde_json::from_value(self.risk_questions)
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        let compliance = serde_json::from_value(self.compliance_questions)
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok((risk, compliance))
    }
}
