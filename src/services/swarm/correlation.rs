//! Cross-vector correlation: term extraction and Jaccard similarity.
//!
//! Terms come from two regexes over each source's result JSON: a technical
//! keyword family and camelCase identifiers. The extraction is
//! intentionally simple; the Jaccard formula and the pair thresholds are
//! the stable contract.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::models::{
    Correlation, CorrelationRelationship, CorrelationSource, CrossVectorResults,
};

/// Cap on unique terms per source.
const MAX_TERMS: usize = 20;

fn technical_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:auth|authentication|service|api|database|error|failure|performance|security|config|deploy|test)\w*\b",
        )
        .unwrap()
    })
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z]+(?:[A-Z][a-z]*)+\b").unwrap())
}

/// Extract up to 20 unique key terms, first-seen order. Technical keywords
/// are case-normalized; camelCase identifiers are kept verbatim.
pub fn extract_key_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut terms = Vec::new();

    for capture in technical_regex().find_iter(text) {
        let term = capture.as_str().to_lowercase();
        if seen.insert(term.clone()) {
            terms.push(term);
            if terms.len() >= MAX_TERMS {
                return terms;
            }
        }
    }
    for capture in identifier_regex().find_iter(text) {
        let term = capture.as_str().to_string();
        if seen.insert(term.clone()) {
            terms.push(term);
            if terms.len() >= MAX_TERMS {
                break;
            }
        }
    }
    terms
}

/// |A ∩ B| / |A ∪ B|; empty-over-empty is 0.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: BTreeSet<&String> = a.iter().collect();
    let b: BTreeSet<&String> = b.iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Pairwise thresholds and relationship labels.
const PAIRS: &[(CorrelationSource, CorrelationSource, f64, CorrelationRelationship)] = &[
    (CorrelationSource::Code, CorrelationSource::Jira, 0.6, CorrelationRelationship::RelatedIssue),
    (CorrelationSource::Code, CorrelationSource::Aoma, 0.5, CorrelationRelationship::Documentation),
    (CorrelationSource::Jira, CorrelationSource::Aoma, 0.5, CorrelationRelationship::HistoricalContext),
];

/// Correlate whichever result sets are populated.
pub fn correlate(results: &CrossVectorResults) -> Vec<Correlation> {
    let terms = |value: &Option<Value>| value.as_ref().map(|v| extract_key_terms(&v.to_string()));
    let code_terms = terms(&results.code);
    let jira_terms = terms(&results.jira);
    let aoma_terms = terms(&results.aoma);

    let lookup = |source: CorrelationSource| match source {
        CorrelationSource::Code => code_terms.as_ref(),
        CorrelationSource::Jira => jira_terms.as_ref(),
        CorrelationSource::Aoma => aoma_terms.as_ref(),
    };

    let mut correlations = Vec::new();
    for (source, target, threshold, relationship) in PAIRS {
        let (Some(a), Some(b)) = (lookup(*source), lookup(*target)) else { continue };
        let similarity = jaccard(a, b);
        if similarity >= *threshold {
            let a_set: BTreeSet<&String> = a.iter().collect();
            let b_set: BTreeSet<&String> = b.iter().collect();
            let key_terms: Vec<String> = a_set.intersection(&b_set).map(|t| (*t).clone()).collect();
            correlations.push(Correlation {
                source_type: *source,
                target_type: *target,
                similarity,
                key_terms,
                relationship: *relationship,
            });
        }
    }
    correlations
}
