//! Builtin question bank
//!
//! Authored offline and versioned via [`super::CATALOG_VERSION`]. Base
//! weights are catalog priors in [0, 1]; evidence categories tie each
//! question to the incident buckets that can raise its weight.

use crate::model::{CandidateQuestion, Domain, IncidentType, Priority};

fn q(
    id: &str,
    domain: Domain,
    text: &str,
    base_weight: f64,
    evidence_categories: &[IncidentType],
    priority: Priority,
) -> CandidateQuestion {
    CandidateQuestion {
        id: id.to_string(),
        domain,
        text: text.to_string(),
        base_weight,
        evidence_categories: evidence_categories.to_vec(),
        priority,
    }
}

pub(super) fn builtin_questions() -> Vec<CandidateQuestion> {
    use IncidentType::*;
    use Priority as P;

    vec![
        // AI
        q(
            "ai-001",
            Domain::Ai,
            "What controls prevent the model from producing harmful or fabricated output in user-facing flows?",
            0.75,
            &[AiFailure],
            P::High,
        ),
        q(
            "ai-002",
            Domain::Ai,
            "Is personally identifiable or regulated data excluded from prompts and fine-tuning datasets?",
            0.8,
            &[AiFailure, RegulationViolation],
            P::High,
        ),
        q(
            "ai-003",
            Domain::Ai,
            "How is prompt injection mitigated where model input includes untrusted user content?",
            0.7,
            &[AiFailure, Cyber],
            P::High,
        ),
        q(
            "ai-004",
            Domain::Ai,
            "Is model behavior monitored in production for drift, degradation, and abuse?",
            0.55,
            &[AiFailure],
            P::Medium,
        ),
        q(
            "ai-005",
            Domain::Ai,
            "What is the fallback when the model provider is unavailable or deprecates the model in use?",
            0.45,
            &[AiFailure, Cloud],
            P::Medium,
        ),
        q(
            "ai-006",
            Domain::Ai,
            "Can individual model decisions be explained and reconstructed after the fact?",
            0.35,
            &[AiFailure, RegulationViolation],
            P::Low,
        ),
        // Cyber
        q(
            "cyber-001",
            Domain::Cyber,
            "Is sensitive data encrypted at rest and in transit, including backups and logs?",
            0.8,
            &[Cyber],
            P::High,
        ),
        q(
            "cyber-002",
            Domain::Cyber,
            "How are access rights granted, reviewed, and revoked for production systems?",
            0.75,
            &[Cyber],
            P::High,
        ),
        q(
            "cyber-003",
            Domain::Cyber,
            "Is there a tested incident response plan with defined roles and notification deadlines?",
            0.7,
            &[Cyber, RegulationViolation],
            P::High,
        ),
        q(
            "cyber-004",
            Domain::Cyber,
            "How quickly are known vulnerabilities in dependencies and base images patched?",
            0.65,
            &[Vulnerability, Cyber],
            P::Medium,
        ),
        q(
            "cyber-005",
            Domain::Cyber,
            "Are secrets and credentials stored in a managed vault rather than code or configuration?",
            0.6,
            &[Cyber, Vulnerability],
            P::Medium,
        ),
        q(
            "cyber-006",
            Domain::Cyber,
            "What vetting and monitoring applies to third-party and supply-chain components?",
            0.5,
            &[Vulnerability, Cyber],
            P::Medium,
        ),
        q(
            "cyber-007",
            Domain::Cyber,
            "Is multi-factor authentication enforced for administrative and remote access?",
            0.55,
            &[Cyber],
            P::Low,
        ),
        // Cloud
        q(
            "cloud-001",
            Domain::Cloud,
            "Can the system survive a single-region or single-zone provider outage?",
            0.7,
            &[Cloud],
            P::High,
        ),
        q(
            "cloud-002",
            Domain::Cloud,
            "Are backups taken, isolated from the primary environment, and restore-tested?",
            0.65,
            &[Cloud, Cyber],
            P::High,
        ),
        q(
            "cloud-003",
            Domain::Cloud,
            "What guards against storage buckets, queues, or databases being exposed by misconfiguration?",
            0.6,
            &[Cloud, Cyber],
            P::Medium,
        ),
        q(
            "cloud-004",
            Domain::Cloud,
            "Are provider quotas, rate limits, and cost ceilings monitored with alerts before exhaustion?",
            0.4,
            &[Cloud],
            P::Low,
        ),
        q(
            "cloud-005",
            Domain::Cloud,
            "Is infrastructure defined as code and reviewed before deployment?",
            0.45,
            &[Cloud],
            P::Low,
        ),
        // Compliance
        q(
            "comp-001",
            Domain::Compliance,
            "Which data protection regimes (GDPR, HIPAA, CCPA) apply, and is processing documented for each?",
            0.75,
            &[RegulationViolation],
            P::High,
        ),
        q(
            "comp-002",
            Domain::Compliance,
            "Are data residency requirements enforced for each jurisdiction where users reside?",
            0.6,
            &[RegulationViolation],
            P::Medium,
        ),
        q(
            "comp-003",
            Domain::Compliance,
            "Is there an audit trail covering access to regulated data, retained per policy?",
            0.55,
            &[RegulationViolation, Cyber],
            P::Medium,
        ),
        q(
            "comp-004",
            Domain::Compliance,
            "How are data subject requests (access, deletion, portability) fulfilled within statutory deadlines?",
            0.5,
            &[RegulationViolation],
            P::Medium,
        ),
        q(
            "comp-005",
            Domain::Compliance,
            "Is there a process tracking AI-specific regulation applicable to the system's deployments?",
            0.4,
            &[RegulationViolation, AiFailure],
            P::Low,
        ),
    ]
}
