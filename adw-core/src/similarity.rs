//! Weighted similarity and the Jaccard text comparator behind it (§4.5).

use std::collections::HashSet;

use adw_model::{AdwId, WorkflowRecord};

const SIMILARITY_THRESHOLD: f64 = 70.0;
const MAX_SIMILAR: usize = 10;

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard similarity over lowercased whitespace tokens, in `[0, 1]`.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let set_a = tokenize(a);
    let set_b = tokenize(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Weighted similarity score between two records, in `[0, 100]`.
///
/// Symmetric by construction: every term compares `a` and `b` without
/// favoring either side.
pub fn similarity_score(a: &WorkflowRecord, b: &WorkflowRecord) -> f64 {
    let mut score = 0.0;

    if a.classification_type == b.classification_type {
        score += 30.0;
    }
    if a.workflow_template == b.workflow_template {
        score += 30.0;
    }
    if a.complexity_level == b.complexity_level {
        score += 20.0;
    }
    score += jaccard(&a.nl_input, &b.nl_input) * 20.0;

    score.clamp(0.0, 100.0)
}

/// Up to the top-10 candidates with score >= 70, descending by score,
/// excluding `target` itself.
pub fn find_similar(target: &WorkflowRecord, candidates: &[WorkflowRecord]) -> Vec<AdwId> {
    let mut scored: Vec<(AdwId, f64)> = candidates
        .iter()
        .filter(|c| c.adw_id != target.adw_id)
        .map(|c| (c.adw_id, similarity_score(target, c)))
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.as_hex().cmp(&b.0.as_hex())));
    scored
        .into_iter()
        .take(MAX_SIMILAR)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{ClassificationType, ModelSet, WorkflowTemplate};

    fn record(nl_input: &str) -> WorkflowRecord {
        WorkflowRecord::new_queued(
            AdwId::generate(),
            "1",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            nl_input,
        )
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = record("implement user authentication flow");
        let b = record("implement user login and authentication");
        assert_eq!(similarity_score(&a, &b), similarity_score(&b, &a));
    }

    #[test]
    fn identical_records_are_not_self_matched() {
        let a = record("implement auth");
        let candidates = vec![a.clone()];
        assert!(find_similar(&a, &candidates).is_empty());
    }

    #[test]
    fn caps_at_ten_and_excludes_target() {
        let target = record("implement auth");
        let candidates: Vec<_> = (0..15).map(|_| record("implement auth")).collect();
        let similar = find_similar(&target, &candidates);
        assert_eq!(similar.len(), 10);
        assert!(!similar.contains(&target.adw_id));
    }
}
