//! Cache fingerprints for generation requests
//!
//! The fingerprint covers every input that affects the generated output:
//! description, effective domain scope, jurisdictions, industry, tech stack,
//! intensity, whether incident search ran, and the catalog/weights versions
//! (so reweighting the bank invalidates stale entries). `force_regenerate`
//! is deliberately excluded; it controls cache behavior, not output.

use sha2::{Digest, Sha256};

use super::weights::WEIGHTS_VERSION;
use crate::model::{Domain, GenerationContext};

/// Compute the cache key for a generation request.
///
/// `effective_domains` is the resolved domain scope (after defaulting), so
/// an omitted field and an explicitly-passed equivalent list hash the same.
pub fn generation_fingerprint(
    ctx: &GenerationContext,
    effective_domains: &[Domain],
    catalog_version: u32,
) -> String {
    let mut domains: Vec<&str> = effective_domains.iter().map(Domain::as_str).collect();
    domains.sort_unstable();
    domains.dedup();

    let mut jurisdictions: Vec<String> = ctx
        .jurisdictions
        .iter()
        .map(|j| j.trim().to_lowercase())
        .collect();
    jurisdictions.sort_unstable();
    jurisdictions.dedup();

    let mut tech_stack: Vec<String> = ctx
        .tech_stack
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();
    tech_stack.sort_unstable();
    tech_stack.dedup();

    let industry = ctx
        .industry
        .as_deref()
        .map(|i| i.trim().to_lowercase())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    update_component(&mut hasher, ctx.system_description.trim());
    update_list(&mut hasher, &domains);
    update_list(&mut hasher, &jurisdictions);
    update_component(&mut hasher, &industry);
    update_list(&mut hasher, &tech_stack);
    update_component(&mut hasher, ctx.question_intensity.as_str());
    update_component(&mut hasher, if ctx.skip_incident_search { "1" } else { "0" });
    update_component(
        &mut hasher,
        &format!("v{}.{}", catalog_version, WEIGHTS_VERSION),
    );

    format!("{:x}", hasher.finalize())
}

/// Length-prefix every component so no input byte can act as a field
/// separator; without this a description containing a delimiter could
/// collide with a different field split.
fn update_component(hasher: &mut Sha256, component: &str) {
    hasher.update((component.len() as u64).to_be_bytes());
    hasher.update(component.as_bytes());
}

fn update_list<S: AsRef<str>>(hasher: &mut Sha256, items: &[S]) {
    hasher.update((items.len() as u64).to_be_bytes());
    for item in items {
        update_component(hasher, item.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionIntensity;

    fn ctx(description: &str) -> GenerationContext {
        GenerationContext {
            system_description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_requests_hash_identically() {
        let a = ctx("Healthcare chatbot using GPT-4 storing PHI on AWS");
        let b = ctx("Healthcare chatbot using GPT-4 storing PHI on AWS");
        assert_eq!(
            generation_fingerprint(&a, &Domain::RISK_DOMAINS, 1),
            generation_fingerprint(&b, &Domain::RISK_DOMAINS, 1)
        );
    }

    #[test]
    fn input_list_order_does_not_matter() {
        let mut a = ctx("a system");
        a.jurisdictions = vec!["EU".to_string(), "US".to_string()];
        a.tech_stack = vec!["aws".to_string(), "postgres".to_string()];

        let mut b = ctx("a system");
        b.jurisdictions = vec!["us".to_string(), "eu".to_string()];
        b.tech_stack = vec!["Postgres".to_string(), "AWS".to_string()];

        let domains_ab = [Domain::Cyber, Domain::Ai];
        let domains_ba = [Domain::Ai, Domain::Cyber];

        assert_eq!(
            generation_fingerprint(&a, &domains_ab, 1),
            generation_fingerprint(&b, &domains_ba, 1)
        );
    }

    #[test]
    fn semantic_inputs_change_the_key() {
        let base = ctx("a system");

        let mut other_intensity = ctx("a system");
        other_intensity.question_intensity = QuestionIntensity::Low;

        let mut skipped = ctx("a system");
        skipped.skip_incident_search = true;

        let fp = generation_fingerprint(&base, &Domain::RISK_DOMAINS, 1);
        assert_ne!(
            fp,
            generation_fingerprint(&other_intensity, &Domain::RISK_DOMAINS, 1)
        );
        assert_ne!(
            fp,
            generation_fingerprint(&skipped, &Domain::RISK_DOMAINS, 1)
        );
        assert_ne!(fp, generation_fingerprint(&base, &Domain::RISK_DOMAINS, 2));
    }

    #[test]
    fn delimiter_bytes_inside_inputs_do_not_collide_across_fields() {
        // One jurisdiction containing a comma vs two separate jurisdictions
        let mut joined = ctx("a system");
        joined.jurisdictions = vec!["eu,us".to_string()];

        let mut split = ctx("a system");
        split.jurisdictions = vec!["eu".to_string(), "us".to_string()];

        assert_ne!(
            generation_fingerprint(&joined, &Domain::RISK_DOMAINS, 1),
            generation_fingerprint(&split, &Domain::RISK_DOMAINS, 1)
        );

        // Field content spilling into the neighboring field
        let mut spilled = ctx("a system");
        spilled.industry = Some("retail|aws".to_string());

        let mut adjacent = ctx("a system");
        adjacent.industry = Some("retail".to_string());
        adjacent.tech_stack = vec!["aws".to_string()];

        assert_ne!(
            generation_fingerprint(&spilled, &Domain::RISK_DOMAINS, 1),
            generation_fingerprint(&adjacent, &Domain::RISK_DOMAINS, 1)
        );
    }

    #[test]
    fn force_regenerate_does_not_change_the_key() {
        let mut forced = ctx("a system");
        forced.force_regenerate = true;
        assert_eq!(
            generation_fingerprint(&ctx("a system"), &Domain::RISK_DOMAINS, 1),
            generation_fingerprint(&forced, &Domain::RISK_DOMAINS, 1)
        );
    }
}
