//! Optimization recommendations (§4.5): at most 5, prioritized, each a
//! self-contained sentence referencing the workflow's own numbers.

use adw_model::{ComplexityLevel, ModelSet, WorkflowRecord};

use crate::scoring::bottleneck_fraction;

const MAX_RECOMMENDATIONS: usize = 5;
const CACHE_RATE_FLOOR: f64 = 0.3;
const CLARITY_FLOOR: f64 = 50.0;
const BOTTLENECK_FRACTION_CEILING: f64 = 0.5;

/// Builds the prioritized recommendation list for one record. Order is:
/// model selection, cache structuring, input quality, bottleneck
/// decomposition, retry/error handling.
pub fn recommend(record: &WorkflowRecord, clarity_score: f64) -> Vec<String> {
    let mut tips = Vec::new();

    if let Some(tip) = model_selection_tip(record) {
        tips.push(tip);
    }
    if let Some(tip) = cache_structuring_tip(record) {
        tips.push(tip);
    }
    if clarity_score < CLARITY_FLOOR {
        tips.push(format!(
            "input clarity score is {clarity_score:.0}; add concrete acceptance criteria to \
             `nl_input` before dispatch"
        ));
    }
    if let Some(tip) = bottleneck_tip(record) {
        tips.push(tip);
    }
    if let Some(tip) = retry_tip(record) {
        tips.push(tip);
    }

    tips.truncate(MAX_RECOMMENDATIONS);
    tips
}

fn model_selection_tip(record: &WorkflowRecord) -> Option<String> {
    match (record.complexity_level, record.model_set) {
        (ComplexityLevel::Complex, ModelSet::Base) => Some(
            "this is a complex workflow running on the base model set; switch to advanced to \
             reduce retries and rework"
                .to_string(),
        ),
        (ComplexityLevel::Simple, ModelSet::Advanced) => Some(
            "this is a simple workflow running on the advanced model set; the base model set \
             would produce the same result at lower cost"
                .to_string(),
        ),
        _ => None,
    }
}

fn cache_structuring_tip(record: &WorkflowRecord) -> Option<String> {
    if record.input_tokens == 0 {
        return None;
    }
    let rate = record.cache_read_tokens as f64 / record.input_tokens as f64;
    if rate < CACHE_RATE_FLOOR {
        Some(format!(
            "cache read rate is {:.0}%; restructure prompts so shared context is cacheable \
             across steps",
            rate * 100.0
        ))
    } else {
        None
    }
}

fn bottleneck_tip(record: &WorkflowRecord) -> Option<String> {
    let fraction = bottleneck_fraction(record)?;
    if fraction <= BOTTLENECK_FRACTION_CEILING {
        return None;
    }
    let phase = record
        .phase_metrics
        .iter()
        .max_by(|a, b| a.duration_seconds.total_cmp(&b.duration_seconds))?;
    Some(format!(
        "phase \"{}\" accounts for {:.0}% of total duration; split it into smaller steps",
        phase.phase_name,
        fraction * 100.0
    ))
}

fn retry_tip(record: &WorkflowRecord) -> Option<String> {
    if record.retry_count == 0 {
        return None;
    }
    Some(format!(
        "{} retries were needed; add stricter validation or tighter tool-call error handling \
         to reduce retries",
        record.retry_count
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, PhaseMetric, WorkflowTemplate};

    fn base() -> WorkflowRecord {
        WorkflowRecord::new_queued(
            AdwId::generate(),
            "1",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            "implement auth",
        )
    }

    #[test]
    fn never_exceeds_five_recommendations() {
        let mut record = base();
        record.complexity_level = ComplexityLevel::Complex;
        record.input_tokens = 10_000;
        record.cache_read_tokens = 100;
        record.retry_count = 4;
        record.phase_metrics = vec![PhaseMetric {
            phase_name: "build".into(),
            duration_seconds: 900.0,
            cost: 1.0,
        }];
        record.total_duration_seconds = 1000.0;
        let tips = recommend(&record, 10.0);
        assert!(tips.len() <= 5);
        assert!(tips.iter().any(|t| t.contains("advanced")));
    }

    #[test]
    fn healthy_record_has_no_recommendations() {
        let record = base();
        assert!(recommend(&record, 90.0).is_empty());
    }
}
