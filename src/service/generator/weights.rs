//! Evidence-weighted question scoring
//!
//! Each component of the evidence signal is a saturating, monotonically
//! non-decreasing function of the relevant match set: adding a match can
//! only raise (never lower) count, summed severity, and total cost, so a
//! question's final weight never drops when evidence gets stronger.

use crate::model::{CandidateQuestion, SimilarityMatch};

/// Version of the weighting scheme, stamped into fingerprints and metadata
pub const WEIGHTS_VERSION: u32 = 1;

/// Match count at which the count component saturates
const COUNT_SATURATION: usize = 10;

/// Summed severity weight at which the severity component saturates
/// (roughly ten medium-severity or five critical incidents)
const SEVERITY_SATURATION: f64 = 5.0;

/// Total cost (USD) at which the cost component saturates
const COST_SATURATION: f64 = 1.0e9;

const COUNT_SHARE: f64 = 0.5;
const SEVERITY_SHARE: f64 = 0.3;
const COST_SHARE: f64 = 0.2;

/// How many representative incident ids to attach to a question
const MAX_SAMPLE_IDS: usize = 3;

/// Evidence derived for one candidate question
#[derive(Debug, Clone, Default)]
pub struct EvidenceSignal {
    /// Combined signal in [0, 1]
    pub signal: f64,
    pub incident_count: usize,
    pub sample_incident_ids: Vec<String>,
}

/// Derive the evidence signal for a candidate from the matches whose
/// category intersects its evidence categories.
pub fn evidence_signal(candidate: &CandidateQuestion, matches: &[SimilarityMatch]) -> EvidenceSignal {
    let relevant: Vec<&SimilarityMatch> = matches
        .iter()
        .filter(|m| candidate.evidence_categories.contains(&m.record.incident_type))
        .collect();

    if relevant.is_empty() {
        return EvidenceSignal::default();
    }

    let count = relevant.len();
    let severity_sum: f64 = relevant.iter().map(|m| m.record.severity.weight()).sum();
    let cost_sum: f64 = relevant
        .iter()
        .filter_map(|m| m.record.estimated_cost)
        .sum();

    let count_component = (count.min(COUNT_SATURATION) as f64) / COUNT_SATURATION as f64;
    let severity_component = (severity_sum / SEVERITY_SATURATION).min(1.0);
    // Costs span many orders of magnitude; log-scale before saturating
    let cost_component = ((1.0 + cost_sum).ln() / (1.0 + COST_SATURATION).ln()).min(1.0);

    let signal = COUNT_SHARE * count_component
        + SEVERITY_SHARE * severity_component
        + COST_SHARE * cost_component;

    // Matches arrive sorted by similarity, so the first ids are the closest
    let sample_incident_ids = relevant
        .iter()
        .take(MAX_SAMPLE_IDS)
        .map(|m| m.record.id.clone())
        .collect();

    EvidenceSignal {
        signal: signal.clamp(0.0, 1.0),
        incident_count: count,
        sample_incident_ids,
    }
}

/// Combine a catalog prior with an evidence signal.
///
/// The result lifts the base weight toward 1.0 in proportion to the signal,
/// so it stays in [0, 1] and never falls below the base.
pub fn combine_weight(base_weight: f64, signal: f64) -> f64 {
    (base_weight + (1.0 - base_weight) * signal).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Domain, IncidentRecord, IncidentType, Priority, Severity, SimilarityMatch,
    };

    fn candidate(categories: &[IncidentType]) -> CandidateQuestion {
        CandidateQuestion {
            id: "q1".to_string(),
            domain: Domain::Cyber,
            text: "A question?".to_string(),
            base_weight: 0.5,
            evidence_categories: categories.to_vec(),
            priority: Priority::Medium,
        }
    }

    fn incident(
        id: &str,
        incident_type: IncidentType,
        severity: Severity,
        cost: Option<f64>,
    ) -> SimilarityMatch {
        SimilarityMatch {
            record: IncidentRecord {
                id: id.to_string(),
                incident_type,
                organization: None,
                industry: None,
                severity,
                incident_date: None,
                estimated_cost: cost,
                records_affected: None,
                embedding_text: String::new(),
                source_file: None,
            },
            similarity: 0.8,
            rank: 0,
        }
    }

    #[test]
    fn no_relevant_matches_means_zero_signal() {
        let c = candidate(&[IncidentType::Cyber]);
        let matches = vec![incident("a", IncidentType::Cloud, Severity::Critical, Some(1e9))];

        let ev = evidence_signal(&c, &matches);
        assert_eq!(ev.signal, 0.0);
        assert_eq!(ev.incident_count, 0);
        assert_eq!(combine_weight(c.base_weight, ev.signal), c.base_weight);
    }

    #[test]
    fn adding_evidence_never_decreases_the_signal() {
        let c = candidate(&[IncidentType::Cyber]);

        let mut matches = Vec::new();
        let mut previous = 0.0;
        for (i, (severity, cost)) in [
            (Severity::Low, None),
            (Severity::Medium, Some(10_000.0)),
            (Severity::Low, None),
            (Severity::Critical, Some(5_000_000.0)),
            (Severity::High, Some(250_000.0)),
        ]
        .into_iter()
        .enumerate()
        {
            matches.push(incident(&format!("i{}", i), IncidentType::Cyber, severity, cost));
            let ev = evidence_signal(&c, &matches);
            assert!(
                ev.signal >= previous,
                "signal dropped from {} to {} after adding match {}",
                previous,
                ev.signal,
                i
            );
            previous = ev.signal;
        }
    }

    #[test]
    fn signal_and_final_weight_stay_bounded_under_extreme_evidence() {
        let c = candidate(&[IncidentType::Cyber]);
        let matches: Vec<SimilarityMatch> = (0..500)
            .map(|i| {
                incident(
                    &format!("i{}", i),
                    IncidentType::Cyber,
                    Severity::Critical,
                    Some(1.0e12),
                )
            })
            .collect();

        let ev = evidence_signal(&c, &matches);
        assert!(ev.signal <= 1.0);
        let final_weight = combine_weight(0.99, ev.signal);
        assert!((0.0..=1.0).contains(&final_weight));
    }

    #[test]
    fn final_weight_exceeds_base_when_evidence_exists() {
        let c = candidate(&[IncidentType::AiFailure]);
        let matches = vec![incident("a", IncidentType::AiFailure, Severity::High, Some(1e6))];

        let ev = evidence_signal(&c, &matches);
        assert!(ev.signal > 0.0);
        assert!(combine_weight(c.base_weight, ev.signal) > c.base_weight);
    }

    #[test]
    fn sample_ids_are_capped_and_taken_in_rank_order() {
        let c = candidate(&[IncidentType::Cyber]);
        let matches: Vec<SimilarityMatch> = (0..6)
            .map(|i| incident(&format!("i{}", i), IncidentType::Cyber, Severity::Low, None))
            .collect();

        let ev = evidence_signal(&c, &matches);
        assert_eq!(ev.sample_incident_ids, vec!["i0", "i1", "i2"]);
        assert_eq!(ev.incident_count, 6);
    }
}
