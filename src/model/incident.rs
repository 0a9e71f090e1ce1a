//! Historical incident evidence types
//!
//! Incidents are ingested offline into the vector index; at query time the
//! service only reads them back as similarity matches and aggregates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category of a historical incident record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Cyber,
    Cloud,
    AiFailure,
    Vulnerability,
    RegulationViolation,
}

impl IncidentType {
    /// Parse the `category` payload tag written by the ingestion pipeline.
    ///
    /// Source files tag records with plural bucket names
    /// (e.g. "cyber_incidents", "ai_failures"), so match on prefixes.
    pub fn from_category(category: &str) -> Option<Self> {
        let c = category.trim().to_lowercase();
        if c.starts_with("cyber") {
            Some(Self::Cyber)
        } else if c.starts_with("cloud") {
            Some(Self::Cloud)
        } else if c.starts_with("ai") {
            Some(Self::AiFailure)
        } else if c.starts_with("vuln") {
            Some(Self::Vulnerability)
        } else if c.starts_with("regulation") || c.starts_with("compliance") {
            Some(Self::RegulationViolation)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cyber => "cyber",
            Self::Cloud => "cloud",
            Self::AiFailure => "ai_failure",
            Self::Vulnerability => "vulnerability",
            Self::RegulationViolation => "regulation_violation",
        }
    }
}

/// Ordinal incident severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric weight used when folding severity into evidence scores
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Critical => 1.0,
        }
    }

    /// Lenient parse for payload metadata written by heterogeneous sources
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "minor" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" | "major" => Some(Self::High),
            "critical" | "severe" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A normalized historical incident, as stored in the vector index payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentRecord {
    pub id: String,
    pub incident_type: IncidentType,
    pub organization: Option<String>,
    pub industry: Option<String>,
    pub severity: Severity,
    pub incident_date: Option<NaiveDate>,
    /// Estimated cost in USD; absent when the source did not report one
    pub estimated_cost: Option<f64>,
    pub records_affected: Option<u64>,
    /// The canonical text that produced the stored vector
    pub embedding_text: String,
    /// Provenance: source file the record was ingested from
    pub source_file: Option<String>,
}

/// A retrieved incident with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimilarityMatch {
    pub record: IncidentRecord,
    /// Cosine similarity in [0, 1]
    pub similarity: f64,
    /// Position within the result set (0 = closest)
    pub rank: usize,
}

/// Counts per severity bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeverityDistribution {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

impl SeverityDistribution {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.low + self.medium + self.high + self.critical
    }
}

/// Aggregate statistics over a set of similarity matches
///
/// An empty match set yields zeroed aggregates with `avg_cost = None`;
/// no field is ever NaN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IncidentStatistics {
    pub total_incidents_analyzed: usize,
    /// Mean cost over matches that report a cost; `None` when none do
    pub avg_cost: Option<f64>,
    pub total_cost: f64,
    pub avg_similarity_score: f64,
    pub severity_distribution: SeverityDistribution,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tags_from_ingestion_parse() {
        assert_eq!(
            IncidentType::from_category("cyber_incidents"),
            Some(IncidentType::Cyber)
        );
        assert_eq!(
            IncidentType::from_category("ai_failures"),
            Some(IncidentType::AiFailure)
        );
        assert_eq!(
            IncidentType::from_category("regulation_violations"),
            Some(IncidentType::RegulationViolation)
        );
        assert_eq!(IncidentType::from_category("weather"), None);
    }

    #[test]
    fn severity_is_ordinal() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::Critical.weight() > Severity::High.weight());
    }

    #[test]
    fn severity_parse_is_lenient() {
        assert_eq!(Severity::parse(" HIGH "), Some(Severity::High));
        assert_eq!(Severity::parse("severe"), Some(Severity::Critical));
        assert_eq!(Severity::parse("unknown"), None);
    }
}
