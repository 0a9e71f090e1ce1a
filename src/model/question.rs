//! Question catalog and generation output types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::incident::{IncidentStatistics, IncidentType, Severity};

/// Assessment domain a question belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Ai,
    Cyber,
    Cloud,
    Compliance,
}

impl Domain {
    /// The risk domains a request defaults to when none are given
    pub const RISK_DOMAINS: [Domain; 3] = [Domain::Ai, Domain::Cyber, Domain::Cloud];

    pub fn is_risk(&self) -> bool {
        !matches!(self, Domain::Compliance)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Ai => "ai",
            Domain::Cyber => "cyber",
            Domain::Cloud => "cloud",
            Domain::Compliance => "compliance",
        }
    }

    /// Incident categories that serve as evidence for this domain
    pub fn incident_types(&self) -> &'static [IncidentType] {
        match self {
            Domain::Ai => &[IncidentType::AiFailure],
            Domain::Cyber => &[IncidentType::Cyber, IncidentType::Vulnerability],
            Domain::Cloud => &[IncidentType::Cloud],
            Domain::Compliance => &[IncidentType::RegulationViolation],
        }
    }
}

/// Catalog-defined priority tier, used as a deterministic tie-breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Caller-selected strictness controlling how many questions survive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntensity {
    #[default]
    High,
    Medium,
    Low,
}

impl QuestionIntensity {
    /// Minimum final weight a candidate must reach to be selected.
    ///
    /// Floors rise as intensity falls, so for identical evidence
    /// |selected(low)| <= |selected(medium)| <= |selected(high)|.
    pub fn weight_floor(&self) -> f64 {
        match self {
            Self::High => 0.20,
            Self::Medium => 0.45,
            Self::Low => 0.65,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// An entry in the static question catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateQuestion {
    pub id: String,
    pub domain: Domain,
    pub text: String,
    /// Catalog-defined prior importance in [0, 1]
    pub base_weight: f64,
    /// Incident categories whose matches boost this question
    #[serde(default)]
    pub evidence_categories: Vec<IncidentType>,
    pub priority: Priority,
}

/// Evidence attached to a generated question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionEvidence {
    pub incident_count: usize,
    /// Up to a handful of representative incident ids
    pub sample_incident_ids: Vec<String>,
}

/// A selected, ranked question as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedQuestion {
    pub id: String,
    pub domain: Domain,
    pub text: String,
    pub base_weight: f64,
    /// base_weight lifted by the evidence signal, in [0, 1]
    pub final_weight: f64,
    pub priority: Priority,
    pub evidence: QuestionEvidence,
    /// Optional incident-grounded justification from the enrichment stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// Compact reference to a matched incident, embedded in the summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentRef {
    pub id: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub similarity: f64,
}

/// Summary of the incident evidence a generation was grounded on
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentSummary {
    #[serde(flatten)]
    pub statistics: IncidentStatistics,
    pub representative_incidents: Vec<IncidentRef>,
}

/// Bookkeeping about how a question set was produced
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationMetadata {
    /// Cache key this generation is stored under
    pub fingerprint: String,
    pub candidates_considered: usize,
    pub questions_selected: usize,
    pub incidents_matched: usize,
    pub weights_version: u32,
    pub cache_hit: bool,
    /// False when incident search was skipped or unavailable
    pub evidence_used: bool,
    pub generated_at: DateTime<Utc>,
}

/// Full input to the question generator.
///
/// `selected_domains` is tri-state at the transport boundary: an absent
/// field defaults to all risk domains, while an explicit empty array is
/// honored as "no risk domains selected".
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub system_description: String,
    pub selected_domains: Option<Vec<Domain>>,
    #[serde(default)]
    pub jurisdictions: Vec<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub question_intensity: QuestionIntensity,
    #[serde(default)]
    pub force_regenerate: bool,
    #[serde(default)]
    pub skip_incident_search: bool,
}

/// The generator's output
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestionSet {
    pub risk_questions: Vec<GeneratedQuestion>,
    pub compliance_questions: Vec<GeneratedQuestion>,
    /// Omitted entirely (not zeroed) when incident search was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_summary: Option<IncidentSummary>,
    pub generation_metadata: GenerationMetadata,
}

/// Memoized generation result keyed by a request fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationCacheEntry {
    pub fingerprint: String,
    pub risk_questions: Vec<GeneratedQuestion>,
    pub compliance_questions: Vec<GeneratedQuestion>,
    pub incident_summary: Option<IncidentSummary>,
    pub generated_at: DateTime<Utc>,
}
