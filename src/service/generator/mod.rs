//! Dynamic question generator
//!
//! Orchestrates a generation request: cache lookup, incident evidence
//! retrieval, evidence-based re-weighting of the catalog, intensity cutoff,
//! deterministic ranking, optional narrative enrichment, and the cache
//! write-back.

pub mod enrichment;
pub mod fingerprint;
pub mod weights;

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::QuestionCatalog;
use crate::model::{
    Domain, GeneratedQuestion, GeneratedQuestionSet, GenerationCacheEntry, GenerationContext,
    GenerationMetadata, IncidentRef, IncidentSummary, IncidentType, QuestionEvidence,
    SimilarityMatch,
};
use crate::service::cache::GenerationCache;
use crate::service::incident_search::{
    calculate_incident_statistics, IncidentSearchService, SearchError, SearchOptions,
};
use enrichment::NarrativeEnricher;

/// How many of the closest matches appear in the incident summary
const MAX_REPRESENTATIVE_INCIDENTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Caller fault; surfaced as a 400
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Configuration/data integrity fault (e.g. vector dimension mismatch);
    /// degrading silently here would produce plausible but wrong weights
    #[error("Configuration fault: {0}")]
    Configuration(String),
}

impl From<SearchError> for GenerationError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Configuration(msg) => GenerationError::Configuration(msg),
        }
    }
}

/// Evidence-weighted question generator
pub struct DynamicQuestionGenerator {
    catalog: QuestionCatalog,
    incident_search: IncidentSearchService,
    cache: Option<Arc<dyn GenerationCache>>,
    enricher: Option<NarrativeEnricher>,
}

impl DynamicQuestionGenerator {
    pub fn new(catalog: QuestionCatalog, incident_search: IncidentSearchService) -> Self {
        Self {
            catalog,
            incident_search,
            cache: None,
            enricher: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn GenerationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_enricher(mut self, enricher: NarrativeEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Generate an evidence-weighted question set for a system description.
    ///
    /// Incident-search unavailability degrades to catalog base weights;
    /// only validation and configuration faults fail the call.
    pub async fn generate(
        &self,
        ctx: &GenerationContext,
    ) -> Result<GeneratedQuestionSet, GenerationError> {
        let description = ctx.system_description.trim();
        if description.is_empty() {
            return Err(GenerationError::Validation(
                "systemDescription must not be empty".to_string(),
            ));
        }

        let scope = effective_domains(ctx);
        let fp = fingerprint::generation_fingerprint(ctx, &scope, self.catalog.version());

        if !ctx.force_regenerate {
            if let Some(entry) = self.cached_entry(&fp).await {
                tracing::debug!(fingerprint = %fp, "Serving generation from cache");
                return Ok(self.set_from_entry(entry, &scope));
            }
        }

        let matches = if ctx.skip_incident_search {
            Vec::new()
        } else {
            let incident_types = evidence_categories_for(&scope);
            self.incident_search
                .find_similar_incidents(
                    description,
                    &SearchOptions {
                        industry: ctx.industry.clone(),
                        incident_types,
                        ..Default::default()
                    },
                )
                .await?
        };

        let candidates = self.catalog.candidates_for(&scope);
        let floor = ctx.question_intensity.weight_floor();

        let mut selected: Vec<GeneratedQuestion> = candidates
            .iter()
            .map(|c| {
                let ev = weights::evidence_signal(c, &matches);
                GeneratedQuestion {
                    id: c.id.clone(),
                    domain: c.domain,
                    text: c.text.clone(),
                    base_weight: c.base_weight,
                    final_weight: weights::combine_weight(c.base_weight, ev.signal),
                    priority: c.priority,
                    evidence: QuestionEvidence {
                        incident_count: ev.incident_count,
                        sample_incident_ids: ev.sample_incident_ids,
                    },
                    justification: None,
                }
            })
            .filter(|q| q.final_weight >= floor)
            .collect();

        selected.sort_by(|a, b| {
            b.final_weight
                .total_cmp(&a.final_weight)
                .then(a.priority.cmp(&b.priority))
                .then(a.id.cmp(&b.id))
        });

        let (mut risk_questions, compliance_questions): (Vec<_>, Vec<_>) =
            selected.into_iter().partition(|q| q.domain.is_risk());

        // Summary is omitted entirely when search was not attempted, so
        // callers can tell "no evidence found" from "not looked for"
        let incident_summary = (!ctx.skip_incident_search).then(|| IncidentSummary {
            statistics: calculate_incident_statistics(&matches),
            representative_incidents: representative_incidents(&matches),
        });

        if let (Some(enricher), Some(summary)) = (&self.enricher, &incident_summary) {
            if summary.statistics.total_incidents_analyzed > 0 {
                enricher.enrich(&mut risk_questions, summary).await;
            }
        }

        let generated_at = Utc::now();

        if let Some(cache) = &self.cache {
            let entry = GenerationCacheEntry {
                fingerprint: fp.clone(),
                risk_questions: risk_questions.clone(),
                compliance_questions: compliance_questions.clone(),
                incident_summary: incident_summary.clone(),
                generated_at,
            };
            // A failed cache write must not fail the computed response
            if let Err(e) = cache.put(&entry).await {
                tracing::warn!(error = %e, fingerprint = %fp, "Failed to write generation cache");
            }
        }

        let metadata = GenerationMetadata {
            fingerprint: fp,
            candidates_considered: candidates.len(),
            questions_selected: risk_questions.len() + compliance_questions.len(),
            incidents_matched: matches.len(),
            weights_version: weights::WEIGHTS_VERSION,
            cache_hit: false,
            evidence_used: !ctx.skip_incident_search && !matches.is_empty(),
            generated_at,
        };

        tracing::info!(
            risk = risk_questions.len(),
            compliance = compliance_questions.len(),
            incidents = matches.len(),
            intensity = %ctx.question_intensity.as_str(),
            "Generated question set"
        );

        Ok(GeneratedQuestionSet {
            risk_questions,
            compliance_questions,
            incident_summary,
            generation_metadata: metadata,
        })
    }

    async fn cached_entry(&self, fingerprint: &str) -> Option<GenerationCacheEntry> {
        let cache = self.cache.as_ref()?;
        match cache.get(fingerprint).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Cache read failed, regenerating");
                None
            }
        }
    }

    fn set_from_entry(
        &self,
        entry: GenerationCacheEntry,
        scope: &[Domain],
    ) -> GeneratedQuestionSet {
        let incidents_matched = entry
            .incident_summary
            .as_ref()
            .map(|s| s.statistics.total_incidents_analyzed)
            .unwrap_or(0);

        let metadata = GenerationMetadata {
            fingerprint: entry.fingerprint,
            candidates_considered: self.catalog.candidates_for(scope).len(),
            questions_selected: entry.risk_questions.len() + entry.compliance_questions.len(),
            incidents_matched,
            weights_version: weights::WEIGHTS_VERSION,
            cache_hit: true,
            evidence_used: incidents_matched > 0,
            generated_at: entry.generated_at,
        };

        GeneratedQuestionSet {
            risk_questions: entry.risk_questions,
            compliance_questions: entry.compliance_questions,
            incident_summary: entry.incident_summary,
            generation_metadata: metadata,
        }
    }
}

/// Resolve the tri-state domain field into the effective scope.
///
/// An absent field defaults to all risk domains; an explicit empty array is
/// honored as "no risk domains". Compliance questions are always in scope.
fn effective_domains(ctx: &GenerationContext) -> Vec<Domain> {
    let mut scope: Vec<Domain> = match &ctx.selected_domains {
        None => Domain::RISK_DOMAINS.to_vec(),
        Some(domains) => domains.clone(),
    };
    scope.push(Domain::Compliance);
    scope.sort_unstable();
    scope.dedup();
    scope
}

/// Incident categories evidentially relevant to the domain scope
fn evidence_categories_for(scope: &[Domain]) -> Vec<IncidentType> {
    let mut types: Vec<IncidentType> = Vec::new();
    for domain in scope {
        for t in domain.incident_types() {
            if !types.contains(t) {
                types.push(*t);
            }
        }
    }
    types
}

fn representative_incidents(matches: &[SimilarityMatch]) -> Vec<IncidentRef> {
    matches
        .iter()
        .take(MAX_REPRESENTATIVE_INCIDENTS)
        .map(|m| IncidentRef {
            id: m.record.id.clone(),
            incident_type: m.record.incident_type,
            severity: m.record.severity,
            similarity: m.similarity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionIntensity, SearchConfig};
    use crate::service::cache::MemoryGenerationCache;
    use crate::service::embedding::Embedder;
    use crate::service::incident_search::tests::{point, DownIndex, FixedEmbedder, FixedIndex};
    use crate::service::vector_index::VectorIndex;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn generator(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> DynamicQuestionGenerator {
        let search = IncidentSearchService::new(embedder, index, SearchConfig::default());
        DynamicQuestionGenerator::new(QuestionCatalog::builtin(), search)
    }

    fn healthcare_ctx() -> GenerationContext {
        GenerationContext {
            system_description: "Healthcare chatbot using GPT-4 storing PHI on AWS".to_string(),
            selected_domains: Some(vec![Domain::Ai, Domain::Cyber, Domain::Cloud]),
            industry: Some("healthcare".to_string()),
            ..Default::default()
        }
    }

    fn healthcare_index() -> FixedIndex {
        FixedIndex::new(vec![
            point("ai-inc-1", 0.91, "ai_failures", "high", Some(2_000_000.0)),
            point("cy-inc-1", 0.87, "cyber_incidents", "critical", Some(4_500_000.0)),
        ])
    }

    #[tokio::test]
    async fn evidence_lifts_matching_questions_above_their_base_weight() {
        let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(healthcare_index()));

        let set = gen.generate(&healthcare_ctx()).await.unwrap();

        let summary = set.incident_summary.as_ref().unwrap();
        assert_eq!(summary.statistics.total_incidents_analyzed, 2);

        let boosted: Vec<&GeneratedQuestion> = set
            .risk_questions
            .iter()
            .filter(|q| q.evidence.incident_count > 0)
            .collect();
        assert!(!boosted.is_empty());
        for q in &boosted {
            assert!(q.final_weight > q.base_weight);
            assert!(!q.evidence.sample_incident_ids.is_empty());
        }

        assert!(set.compliance_questions.iter().all(|q| q.domain == Domain::Compliance));
        assert!(set.risk_questions.iter().all(|q| q.domain.is_risk()));
    }

    #[tokio::test]
    async fn empty_description_fails_validation_before_any_backend_call() {
        let embedder = Arc::new(FixedEmbedder::new(4));
        let index = Arc::new(healthcare_index());
        let gen = generator(embedder.clone(), index.clone());

        let ctx = GenerationContext {
            system_description: "   ".to_string(),
            ..Default::default()
        };

        let result = gen.generate(&ctx).await;
        assert!(matches!(result, Err(GenerationError::Validation(_))));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_index_still_yields_the_full_default_set() {
        let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(DownIndex));

        let ctx = GenerationContext {
            system_description: "An internal analytics platform".to_string(),
            ..Default::default()
        };

        let set = gen.generate(&ctx).await.unwrap();

        // Every candidate falls back to its base weight, all of which clear
        // the high-intensity floor in the builtin bank
        assert_eq!(
            set.risk_questions.len() + set.compliance_questions.len(),
            QuestionCatalog::builtin().len()
        );

        let summary = set.incident_summary.unwrap();
        assert_eq!(summary.statistics.total_incidents_analyzed, 0);
        assert!(!set.generation_metadata.evidence_used);

        for q in &set.risk_questions {
            assert_eq!(q.final_weight, q.base_weight);
        }
    }

    #[tokio::test]
    async fn identical_requests_are_served_from_cache() {
        let index = Arc::new(healthcare_index());
        let search = IncidentSearchService::new(
            Arc::new(FixedEmbedder::new(4)),
            index.clone(),
            SearchConfig::default(),
        );
        let cache = Arc::new(MemoryGenerationCache::new(Duration::from_secs(60)));
        let gen = DynamicQuestionGenerator::new(QuestionCatalog::builtin(), search)
            .with_cache(cache);

        let ctx = healthcare_ctx();
        let first = gen.generate(&ctx).await.unwrap();
        let second = gen.generate(&ctx).await.unwrap();

        assert!(!first.generation_metadata.cache_hit);
        assert!(second.generation_metadata.cache_hit);
        assert_eq!(first.risk_questions, second.risk_questions);
        assert_eq!(first.compliance_questions, second.compliance_questions);
        assert_eq!(index.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn force_regenerate_bypasses_a_fresh_cache_entry() {
        let index = Arc::new(healthcare_index());
        let search = IncidentSearchService::new(
            Arc::new(FixedEmbedder::new(4)),
            index.clone(),
            SearchConfig::default(),
        );
        let cache = Arc::new(MemoryGenerationCache::new(Duration::from_secs(60)));
        let gen = DynamicQuestionGenerator::new(QuestionCatalog::builtin(), search)
            .with_cache(cache);

        let mut ctx = healthcare_ctx();
        gen.generate(&ctx).await.unwrap();

        ctx.force_regenerate = true;
        let second = gen.generate(&ctx).await.unwrap();

        assert!(!second.generation_metadata.cache_hit);
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn skip_incident_search_omits_the_summary_entirely() {
        let embedder = Arc::new(FixedEmbedder::new(4));
        let gen = generator(embedder.clone(), Arc::new(healthcare_index()));

        let mut ctx = healthcare_ctx();
        ctx.skip_incident_search = true;

        let set = gen.generate(&ctx).await.unwrap();
        assert!(set.incident_summary.is_none());
        assert!(!set.generation_metadata.evidence_used);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

        // Omitted means absent from the serialized output, not zeroed
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("incidentSummary").is_none());
    }

    #[tokio::test]
    async fn lower_intensity_never_selects_more_questions() {
        let mut counts = Vec::new();
        for intensity in [
            QuestionIntensity::Low,
            QuestionIntensity::Medium,
            QuestionIntensity::High,
        ] {
            let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(healthcare_index()));
            let mut ctx = healthcare_ctx();
            ctx.question_intensity = intensity;
            let set = gen.generate(&ctx).await.unwrap();
            counts.push(set.risk_questions.len() + set.compliance_questions.len());
        }

        assert!(counts[0] <= counts[1]);
        assert!(counts[1] <= counts[2]);
    }

    #[tokio::test]
    async fn output_is_sorted_by_final_weight_descending() {
        let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(healthcare_index()));
        let set = gen.generate(&healthcare_ctx()).await.unwrap();

        for list in [&set.risk_questions, &set.compliance_questions] {
            for pair in list.windows(2) {
                assert!(pair[0].final_weight >= pair[1].final_weight);
            }
        }
    }

    #[tokio::test]
    async fn explicit_empty_domains_means_no_risk_questions() {
        let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(healthcare_index()));

        let ctx = GenerationContext {
            system_description: "A payroll system".to_string(),
            selected_domains: Some(vec![]),
            ..Default::default()
        };

        let set = gen.generate(&ctx).await.unwrap();
        assert!(set.risk_questions.is_empty());
        assert!(!set.compliance_questions.is_empty());
    }

    #[tokio::test]
    async fn omitted_domains_default_to_all_risk_domains() {
        let gen = generator(Arc::new(FixedEmbedder::new(4)), Arc::new(healthcare_index()));

        let ctx = GenerationContext {
            system_description: "A payroll system".to_string(),
            selected_domains: None,
            ..Default::default()
        };

        let set = gen.generate(&ctx).await.unwrap();
        let domains: std::collections::HashSet<Domain> =
            set.risk_questions.iter().map(|q| q.domain).collect();
        assert!(domains.contains(&Domain::Ai));
        assert!(domains.contains(&Domain::Cyber));
        assert!(domains.contains(&Domain::Cloud));
    }
}
