//! Static question catalog
//!
//! The catalog is an immutable, explicitly constructed value injected into
//! the generator, never a process-wide singleton. Operators can substitute
//! the builtin bank with a YAML file; both go through the same validation.

mod bank;

use serde::Deserialize;
use std::collections::HashSet;

use crate::model::{CandidateQuestion, Domain};

/// Version stamped into fingerprints so cached generations are invalidated
/// when the builtin bank or its weights change
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog contains no questions")]
    Empty,

    #[error("Duplicate question id: {0}")]
    DuplicateId(String),

    #[error("Question {id} has base weight {weight} outside [0, 1]")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Question {0} has empty text")]
    EmptyText(String),

    #[error("Failed to parse catalog: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: u32,
    questions: Vec<CandidateQuestion>,
}

fn default_version() -> u32 {
    CATALOG_VERSION
}

/// A validated, versioned bank of candidate questions
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<CandidateQuestion>,
    version: u32,
}

impl QuestionCatalog {
    /// Validate and construct a catalog.
    ///
    /// Questions are sorted by (priority, id) once here, so downstream
    /// ranking is reproducible given identical evidence weights.
    pub fn new(mut questions: Vec<CandidateQuestion>, version: u32) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id.clone()) {
                return Err(CatalogError::DuplicateId(q.id.clone()));
            }
            if !(0.0..=1.0).contains(&q.base_weight) {
                return Err(CatalogError::InvalidWeight {
                    id: q.id.clone(),
                    weight: q.base_weight,
                });
            }
            if q.text.trim().is_empty() {
                return Err(CatalogError::EmptyText(q.id.clone()));
            }
        }

        questions.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.id.cmp(&b.id)));

        Ok(Self { questions, version })
    }

    /// The builtin question bank shipped with the service
    pub fn builtin() -> Self {
        Self::new(bank::builtin_questions(), CATALOG_VERSION)
            .expect("builtin question bank is valid")
    }

    /// Load an operator-supplied catalog from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.questions, file.version)
    }

    /// Candidates whose domain is in `domains`, in deterministic
    /// (priority, id) order
    pub fn candidates_for(&self, domains: &[Domain]) -> Vec<CandidateQuestion> {
        self.questions
            .iter()
            .filter(|q| domains.contains(&q.domain))
            .cloned()
            .collect()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IncidentType, Priority};

    fn question(id: &str, domain: Domain, weight: f64) -> CandidateQuestion {
        CandidateQuestion {
            id: id.to_string(),
            domain,
            text: format!("Question {}?", id),
            base_weight: weight,
            evidence_categories: vec![IncidentType::Cyber],
            priority: Priority::Medium,
        }
    }

    #[test]
    fn builtin_bank_is_valid_and_covers_all_domains() {
        let catalog = QuestionCatalog::builtin();
        for domain in [Domain::Ai, Domain::Cyber, Domain::Cloud, Domain::Compliance] {
            assert!(
                !catalog.candidates_for(&[domain]).is_empty(),
                "no builtin questions for {:?}",
                domain
            );
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = QuestionCatalog::new(
            vec![question("q1", Domain::Ai, 0.5), question("q1", Domain::Ai, 0.6)],
            1,
        );
        assert!(matches!(result, Err(CatalogError::DuplicateId(_))));
    }

    #[test]
    fn out_of_range_weights_are_rejected() {
        let result = QuestionCatalog::new(vec![question("q1", Domain::Ai, 1.5)], 1);
        assert!(matches!(result, Err(CatalogError::InvalidWeight { .. })));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            QuestionCatalog::new(vec![], 1),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn candidates_come_back_in_priority_then_id_order() {
        let mut q1 = question("b", Domain::Cyber, 0.5);
        q1.priority = Priority::Low;
        let q2 = question("c", Domain::Cyber, 0.5);
        let q3 = question("a", Domain::Cyber, 0.5);

        let catalog = QuestionCatalog::new(vec![q1, q2, q3], 1).unwrap();
        let candidates = catalog.candidates_for(&[Domain::Cyber]);
        let ids: Vec<&str> = candidates.iter().map(|q| q.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn domain_filter_excludes_other_domains() {
        let catalog = QuestionCatalog::new(
            vec![
                question("q1", Domain::Ai, 0.5),
                question("q2", Domain::Compliance, 0.5),
            ],
            1,
        )
        .unwrap();

        let ai = catalog.candidates_for(&[Domain::Ai]);
        assert_eq!(ai.len(), 1);
        assert_eq!(ai[0].id, "q1");
    }

    #[test]
    fn yaml_catalog_parses() {
        let yaml = r#"
version: 3
questions:
  - id: custom-1
    domain: cyber
    text: "Is MFA enforced for privileged accounts?"
    base_weight: 0.7
    evidence_categories: [cyber]
    priority: high
"#;
        let catalog = QuestionCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.version(), 3);
        assert_eq!(catalog.len(), 1);
    }
}
