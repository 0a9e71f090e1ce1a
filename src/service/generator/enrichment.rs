//! Optional LLM narrative enrichment for top-ranked questions
//!
//! A separately-failable post-processing stage: it phrases an
//! incident-grounded justification for the highest-weighted questions.
//! Any failure leaves the already-ranked question set untouched with
//! `justification = None`.

use rig::client::CompletionClient;
use rig::providers::openai;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{GeneratedQuestion, IncidentSummary};

/// Environment variable overriding the enrichment model
const ENV_NARRATIVE_MODEL: &str = "SENGOL_NARRATIVE_MODEL";

const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

/// Only the highest-ranked evidence-backed questions get narrative text
const MAX_ENRICHED: usize = 3;

const NARRATIVE_SYSTEM_PROMPT: &str = "\
You write one-sentence justifications for risk assessment questions. \
Each justification must be grounded ONLY in the incident evidence provided: \
reference the number, severity, or cost of similar historical incidents. \
Never invent incidents, costs, or statistics not present in the input. \
Keep each justification under 40 words and return one entry per question id.";

/// Justifications extracted from the LLM
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedNarratives {
    pub justifications: Vec<ExtractedJustification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedJustification {
    /// Id of the question being justified, copied from the input
    pub question_id: String,
    /// One-sentence, incident-grounded justification
    pub justification: String,
}

/// Phrases incident-grounded justification text for generated questions
pub struct NarrativeEnricher {
    client: openai::Client,
    model: String,
}

impl NarrativeEnricher {
    /// Create an enricher backed by the OpenAI API
    pub fn new(api_key: &str) -> Result<Self, String> {
        let client = openai::Client::new(api_key);

        let model =
            std::env::var(ENV_NARRATIVE_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        tracing::info!(model = %model, "Narrative enrichment enabled");

        Ok(Self { client, model })
    }

    /// Attach justifications to the top evidence-backed questions in place.
    ///
    /// Best effort: on any upstream failure the questions are returned as
    /// they were, and the failure is only logged.
    pub async fn enrich(&self, questions: &mut [GeneratedQuestion], summary: &IncidentSummary) {
        let targets: Vec<&GeneratedQuestion> = questions
            .iter()
            .filter(|q| q.evidence.incident_count > 0)
            .take(MAX_ENRICHED)
            .collect();

        if targets.is_empty() {
            return;
        }

        let prompt = build_narrative_prompt(&targets, summary);
        let start_time = std::time::Instant::now();

        let extractor = self
            .client
            .extractor::<ExtractedNarratives>(&self.model)
            .preamble(NARRATIVE_SYSTEM_PROMPT)
            .build();

        let extracted = match extractor.extract(&prompt).await {
            Ok(result) => {
                tracing::debug!(
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    questions = targets.len(),
                    "Narrative enrichment completed"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    error = %e,
                    "Narrative enrichment failed, returning questions without justifications"
                );
                return;
            }
        };

        for narrative in extracted.justifications {
            let text = narrative.justification.trim();
            if text.is_empty() {
                continue;
            }
            if let Some(q) = questions.iter_mut().find(|q| q.id == narrative.question_id) {
                q.justification = Some(text.to_string());
            }
        }
    }
}

fn build_narrative_prompt(questions: &[&GeneratedQuestion], summary: &IncidentSummary) -> String {
    let mut prompt = String::new();

    prompt.push_str("Incident evidence:\n");
    prompt.push_str(&format!(
        "- {} similar historical incidents (avg similarity {:.2})\n",
        summary.statistics.total_incidents_analyzed, summary.statistics.avg_similarity_score
    ));
    if let Some(avg_cost) = summary.statistics.avg_cost {
        prompt.push_str(&format!(
            "- average estimated cost ${:.0} (total ${:.0})\n",
            avg_cost, summary.statistics.total_cost
        ));
    }
    let dist = &summary.statistics.severity_distribution;
    prompt.push_str(&format!(
        "- severity mix: {} critical, {} high, {} medium, {} low\n",
        dist.critical, dist.high, dist.medium, dist.low
    ));

    prompt.push_str("\nQuestions to justify:\n");
    for q in questions {
        prompt.push_str(&format!(
            "- id: {} | matched incidents: {} | question: {}\n",
            q.id, q.evidence.incident_count, q.text
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Domain, IncidentStatistics, Priority, QuestionEvidence, SeverityDistribution,
    };

    fn question(id: &str, incident_count: usize) -> GeneratedQuestion {
        GeneratedQuestion {
            id: id.to_string(),
            domain: Domain::Cyber,
            text: format!("Question {}?", id),
            base_weight: 0.5,
            final_weight: 0.7,
            priority: Priority::Medium,
            evidence: QuestionEvidence {
                incident_count,
                sample_incident_ids: vec![],
            },
            justification: None,
        }
    }

    #[test]
    fn prompt_contains_evidence_and_question_ids() {
        let summary = IncidentSummary {
            statistics: IncidentStatistics {
                total_incidents_analyzed: 4,
                avg_cost: Some(2_500_000.0),
                total_cost: 10_000_000.0,
                avg_similarity_score: 0.81,
                severity_distribution: SeverityDistribution {
                    critical: 1,
                    high: 2,
                    medium: 1,
                    low: 0,
                },
            },
            representative_incidents: vec![],
        };

        let q1 = question("cyber-001", 3);
        let q2 = question("ai-002", 2);
        let prompt = build_narrative_prompt(&[&q1, &q2], &summary);

        assert!(prompt.contains("4 similar historical incidents"));
        assert!(prompt.contains("$2500000"));
        assert!(prompt.contains("id: cyber-001"));
        assert!(prompt.contains("id: ai-002"));
    }
}
