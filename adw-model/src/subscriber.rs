use std::fmt;

use crate::adw_id::AdwId;

/// Fixed enumeration of real-time topics the broadcast hub serves.
///
/// `AdwState` carries the workflow's `adw_id` as payload since it is a
/// per-workflow topic rather than a single global stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Workflows,
    Routes,
    WorkflowHistory,
    AdwMonitor,
    AdwState(AdwId),
    Queue,
    SystemStatus,
    WebhookStatus,
    PlannedFeatures,
}

impl Topic {
    /// Parse the `{topic}` segment of a `/ws/{topic}` path.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(id) = raw.strip_prefix("adw-state/") {
            return AdwId::parse(id).map(Topic::AdwState);
        }
        Some(match raw {
            "workflows" => Topic::Workflows,
            "routes" => Topic::Routes,
            "workflow-history" => Topic::WorkflowHistory,
            "adw-monitor" => Topic::AdwMonitor,
            "queue" => Topic::Queue,
            "system-status" => Topic::SystemStatus,
            "webhook-status" => Topic::WebhookStatus,
            "planned-features" => Topic::PlannedFeatures,
            _ => return None,
        })
    }

    /// The frame-type prefix used in `{type: <topic>_update, data: ...}` frames.
    pub fn frame_type(&self) -> String {
        format!("{}_update", self.slug())
    }

    fn slug(&self) -> String {
        match self {
            Topic::Workflows => "workflows".to_string(),
            Topic::Routes => "routes".to_string(),
            Topic::WorkflowHistory => "workflow-history".to_string(),
            Topic::AdwMonitor => "adw-monitor".to_string(),
            Topic::AdwState(id) => format!("adw-state/{id}"),
            Topic::Queue => "queue".to_string(),
            Topic::SystemStatus => "system-status".to_string(),
            Topic::WebhookStatus => "webhook-status".to_string(),
            Topic::PlannedFeatures => "planned-features".to_string(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_static_topics() {
        assert_eq!(Topic::parse("workflows"), Some(Topic::Workflows));
        assert_eq!(Topic::parse("queue"), Some(Topic::Queue));
        assert_eq!(Topic::parse("nonsense"), None);
    }

    #[test]
    fn parses_per_workflow_topic() {
        let id = AdwId::generate();
        let raw = format!("adw-state/{id}");
        assert_eq!(Topic::parse(&raw), Some(Topic::AdwState(id)));
    }
}
