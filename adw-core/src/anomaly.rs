//! Anomaly detection over a target record and its peer set (§4.5).

use adw_model::{WorkflowRecord, COMMON_ERROR_CATEGORIES};

const MIN_PEERS: usize = 3;
const LARGE_INPUT_THRESHOLD: u64 = 5000;
const CACHE_EFFICIENCY_FLOOR: f64 = 0.2;

fn mean(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    let count = values.clone().count();
    if count == 0 {
        return None;
    }
    Some(values.sum::<f64>() / count as f64)
}

/// Detects anomalies against a peer set; returns `[]` when fewer than 3
/// peers are available (the comparisons are not meaningful below that).
pub fn detect(target: &WorkflowRecord, peers: &[WorkflowRecord]) -> Vec<String> {
    if peers.len() < MIN_PEERS {
        return Vec::new();
    }

    let mut flags = Vec::new();

    if let Some(peer_mean_cost) = mean(peers.iter().map(|p| p.actual_cost_total)) {
        if peer_mean_cost > 0.0 && target.actual_cost_total > 2.0 * peer_mean_cost {
            let multiple = target.actual_cost_total / peer_mean_cost;
            flags.push(format!(
                "actual cost ${:.2} is {:.1}x the peer mean of ${:.2}",
                target.actual_cost_total, multiple, peer_mean_cost
            ));
        }
    }

    if let Some(peer_mean_duration) = mean(peers.iter().map(|p| p.total_duration_seconds)) {
        if peer_mean_duration > 0.0 && target.total_duration_seconds > 2.0 * peer_mean_duration {
            let multiple = target.total_duration_seconds / peer_mean_duration;
            flags.push(format!(
                "duration {:.0}s is {:.1}x the peer mean of {:.0}s",
                target.total_duration_seconds, multiple, peer_mean_duration
            ));
        }
    }

    if target.retry_count >= 3 {
        flags.push(format!(
            "retried {} times, well above a healthy run",
            target.retry_count
        ));
    }

    if let Some(entry) = target
        .errors
        .iter()
        .find(|e| !COMMON_ERROR_CATEGORIES.contains(&e.category.as_str()))
    {
        flags.push(format!(
            "error category \"{}\" is outside the common set",
            entry.category
        ));
    }

    if target.input_tokens > LARGE_INPUT_THRESHOLD {
        let rate = target.cache_read_tokens as f64 / target.input_tokens as f64;
        if rate < CACHE_EFFICIENCY_FLOOR {
            flags.push(format!(
                "cache read rate {:.0}% is low for a {} token input",
                rate * 100.0,
                target.input_tokens
            ));
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, ModelSet, WorkflowTemplate};

    fn record(cost: f64) -> WorkflowRecord {
        let mut record = WorkflowRecord::new_queued(
            AdwId::generate(),
            "1",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            "implement auth",
        );
        record.actual_cost_total = cost;
        record
    }

    #[test]
    fn fewer_than_three_peers_yields_no_anomalies() {
        let target = record(10.0);
        let peers = vec![record(2.0), record(2.0)];
        assert!(detect(&target, &peers).is_empty());
    }

    #[test]
    fn cost_spike_flags_with_multiple_in_message() {
        let target = record(10.0);
        let peers = vec![record(2.0), record(2.5), record(3.0)];
        let flags = detect(&target, &peers);
        assert!(flags.iter().any(|f| f.contains("4.0x")));
    }

    #[test]
    fn retry_anomaly_is_peer_independent() {
        let mut target = record(1.0);
        target.retry_count = 3;
        let peers = vec![record(1.0), record(1.0), record(1.0)];
        let flags = detect(&target, &peers);
        assert!(flags.iter().any(|f| f.contains("retried")));
    }
}
