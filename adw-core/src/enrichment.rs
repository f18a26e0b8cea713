//! Best-effort, idempotent enrichment of a scanned record (§4.5): folding
//! phase-level cost data into the record's totals when the child process
//! hasn't already summed them itself. Missing cost data is not an error.

use adw_model::WorkflowRecord;

pub fn enrich(record: &mut WorkflowRecord) {
    if record.phase_metrics.is_empty() {
        return;
    }

    if record.actual_cost_total == 0.0 {
        record.actual_cost_total = record.phase_metrics.iter().map(|p| p.cost).sum();
    }

    if record.total_duration_seconds == 0.0 {
        record.total_duration_seconds = record.phase_metrics.iter().map(|p| p.duration_seconds).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, ModelSet, PhaseMetric, WorkflowTemplate};

    fn record() -> WorkflowRecord {
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
    fn folds_phase_costs_into_totals_when_absent() {
        let mut r = record();
        r.phase_metrics = vec![
            PhaseMetric {
                phase_name: "plan".into(),
                duration_seconds: 10.0,
                cost: 1.5,
            },
            PhaseMetric {
                phase_name: "build".into(),
                duration_seconds: 20.0,
                cost: 2.5,
            },
        ];
        enrich(&mut r);
        assert_eq!(r.actual_cost_total, 4.0);
        assert_eq!(r.total_duration_seconds, 30.0);
    }

    #[test]
    fn is_idempotent() {
        let mut r = record();
        r.phase_metrics = vec![PhaseMetric {
            phase_name: "plan".into(),
            duration_seconds: 10.0,
            cost: 1.5,
        }];
        enrich(&mut r);
        let once = r.clone();
        enrich(&mut r);
        assert_eq!(r, once);
    }
}
