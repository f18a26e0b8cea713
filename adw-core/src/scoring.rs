//! The four deterministic analytics scorers (§4.5): clarity, cost efficiency,
//! performance, and quality. Every scorer starts from a base score, applies
//! additive penalties/bonuses, and clamps to `[0, 100]`. Missing upstream
//! fields are treated as neutral rather than penalized.

use adw_model::{ComplexityLevel, ModelSet, WorkflowRecord};

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Base 60; penalizes empty/very-short input, rewards a well-structured
/// 20-150 word body with capitalization and multiple sentences.
pub fn clarity_score(record: &WorkflowRecord) -> f64 {
    let text = record.nl_input.trim();
    if text.is_empty() {
        return 0.0;
    }

    let words = crate::complexity::word_count(text);
    let mut score = 60.0;

    if words < 5 {
        score -= 40.0;
    } else if words < 10 {
        score -= 15.0;
    }

    if (20..=150).contains(&words) {
        score += 15.0;
    }

    if text.chars().next().is_some_and(|c| c.is_uppercase()) {
        score += 5.0;
    }

    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    if sentence_count >= 2 {
        score += 10.0;
    }

    clamp(score)
}

/// Base 70; penalizes over-budget spend, model/complexity mismatch, a high
/// retry-cost fraction, and poor cache utilization; rewards the opposite.
pub fn cost_efficiency_score(record: &WorkflowRecord) -> f64 {
    let mut score = 70.0;

    if record.estimated_cost_total > 0.0 {
        let ratio = record.actual_cost_total / record.estimated_cost_total;
        if ratio > 1.0 {
            let over_pct = (ratio - 1.0) * 100.0;
            score -= (over_pct / 2.0).min(40.0);
        } else if ratio < 0.8 {
            score += 10.0;
        }
    }

    let mismatch = matches!(
        (record.complexity_level, record.model_set),
        (ComplexityLevel::Complex, ModelSet::Base) | (ComplexityLevel::Simple, ModelSet::Advanced)
    );
    if mismatch {
        score -= 15.0;
    } else {
        score += 5.0;
    }

    if record.actual_cost_total > 0.0 && record.retry_count > 0 {
        let phase_cost_total: f64 = record.phase_metrics.iter().map(|p| p.cost).sum();
        let total = if phase_cost_total > 0.0 {
            phase_cost_total
        } else {
            record.actual_cost_total
        };
        let retry_fraction = retry_cost_fraction(record, total);
        if retry_fraction > 0.3 {
            score -= 20.0;
        }
    }

    if let Some(rate) = cache_hit_rate(record) {
        if rate < 0.3 {
            score -= 15.0;
        } else if rate > 0.6 {
            score += 10.0;
        }
    }

    clamp(score)
}

/// Estimates the fraction of `total` attributable to retries: one retry
/// "costs" roughly one additional unit of average per-attempt spend.
fn retry_cost_fraction(record: &WorkflowRecord, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let attempts = (record.retry_count as f64) + 1.0;
    let per_attempt = total / attempts;
    (per_attempt * record.retry_count as f64 / total).min(1.0)
}

fn cache_hit_rate(record: &WorkflowRecord) -> Option<f64> {
    if record.input_tokens == 0 {
        return None;
    }
    Some(record.cache_read_tokens as f64 / record.input_tokens as f64)
}

/// Base 75; compares `total_duration_seconds` against the peer mean, checks
/// for a single bottleneck phase, and rewards throughput (steps per second).
pub fn performance_score(record: &WorkflowRecord, peer_mean_duration: Option<f64>) -> f64 {
    let mut score = 75.0;

    if let Some(peer_mean) = peer_mean_duration.filter(|m| *m > 0.0) {
        let ratio = record.total_duration_seconds / peer_mean;
        if ratio > 1.5 {
            score -= ((ratio - 1.0) * 20.0).min(35.0);
        } else if ratio < 0.75 {
            score += 10.0;
        }
    }

    if let Some(bottleneck_fraction) = bottleneck_fraction(record) {
        if bottleneck_fraction > 0.5 {
            score -= 15.0;
        }
    }

    if record.total_duration_seconds > 0.0 && record.steps_completed > 0 {
        let steps_per_minute = record.steps_completed as f64 / (record.total_duration_seconds / 60.0);
        if steps_per_minute > 2.0 {
            score += 10.0;
        } else if steps_per_minute < 0.2 {
            score -= 10.0;
        }
    }

    clamp(score)
}

/// The fraction of total duration spent in the single largest phase, if any
/// phase metrics are present.
pub fn bottleneck_fraction(record: &WorkflowRecord) -> Option<f64> {
    if record.phase_metrics.is_empty() || record.total_duration_seconds <= 0.0 {
        return None;
    }
    let max_phase = record
        .phase_metrics
        .iter()
        .map(|p| p.duration_seconds)
        .fold(0.0_f64, f64::max);
    Some(max_phase / record.total_duration_seconds)
}

/// Base 80; penalized by error count/severity, retry count, and a non-`completed`
/// terminal status.
pub fn quality_score(record: &WorkflowRecord) -> f64 {
    let mut score = 80.0;

    score -= (record.errors.len() as f64) * 10.0;
    score -= (record.retry_count as f64) * 5.0;

    use adw_model::WorkflowStatus::*;
    match record.status {
        Completed => score += 10.0,
        Failed => score -= 30.0,
        Stopped => score -= 15.0,
        Queued | Running => {}
    }

    clamp(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, ErrorEntry, WorkflowTemplate};

    fn base_record(nl_input: &str) -> WorkflowRecord {
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
    fn clarity_on_empty_input_is_zero() {
        assert_eq!(clarity_score(&base_record("")), 0.0);
    }

    #[test]
    fn clarity_on_well_formed_hundred_words_is_high() {
        let sentence = "Implement the feature carefully and test it thoroughly. ";
        let body = sentence.repeat(8);
        let record = base_record(body.trim());
        assert!(crate::complexity::word_count(&record.nl_input) >= 80);
        assert!(clarity_score(&record) >= 80.0);
    }

    #[test]
    fn all_scores_stay_within_bounds() {
        let mut record = base_record("a");
        record.actual_cost_total = 1000.0;
        record.estimated_cost_total = 1.0;
        record.retry_count = 50;
        record.errors = vec![ErrorEntry {
            category: "timeout".into(),
            message: "x".into(),
        }];
        assert!((0.0..=100.0).contains(&clarity_score(&record)));
        assert!((0.0..=100.0).contains(&cost_efficiency_score(&record)));
        assert!((0.0..=100.0).contains(&performance_score(&record, Some(10.0))));
        assert!((0.0..=100.0).contains(&quality_score(&record)));
    }

    #[test]
    fn clean_completed_record_scores_well_on_quality() {
        let record = base_record("implement the login flow and write tests for it");
        assert_eq!(quality_score(&record), 80.0);
    }
}
