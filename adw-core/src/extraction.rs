//! Fast deterministic extraction of a workflow command from free text (§4.1).
//!
//! Matches `adw_<name>[ adw-<8hex>][ with (base|advanced) model]`,
//! case-insensitively, before any text is handed to the slow-path classifier.

use std::sync::LazyLock;

use adw_model::{AdwId, ModelSet, WorkflowTemplate};
use regex::Regex;

static FAST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)adw[_-](?P<template>[a-z_]+?)(?:\s+adw-(?P<id>[0-9a-f]{8}))?(?:\s+with\s+(?P<model>base|advanced)\s+model)?(?:\s|$|[.,;!?])",
    )
    .expect("fast path regex is a compile-time constant")
});

/// An extracted command, ready for admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCommand {
    pub workflow_template: WorkflowTemplate,
    pub adw_id: Option<AdwId>,
    pub model_set: ModelSet,
}

/// Attempt fast-path extraction. Returns `None` when no recognizable
/// `adw_<name>` token is present, or when the name doesn't match the fixed
/// workflow enumeration — either case falls through to the slow path.
pub fn extract(text: &str) -> Option<ExtractedCommand> {
    let captures = FAST_PATH.captures(text)?;

    let template_slug = captures.name("template")?.as_str();
    let workflow_template = WorkflowTemplate::from_slug(template_slug).ok()?;

    let adw_id = captures
        .name("id")
        .and_then(|m| AdwId::parse(m.as_str()));

    let model_set = captures
        .name("model")
        .and_then(|m| ModelSet::parse(m.as_str()))
        .unwrap_or_default();

    Some(ExtractedCommand {
        workflow_template,
        adw_id,
        model_set,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_bare_template_name() {
        let extracted = extract("please run adw_plan_iso on this").unwrap();
        assert_eq!(extracted.workflow_template, WorkflowTemplate::PlanIso);
        assert_eq!(extracted.adw_id, None);
        assert_eq!(extracted.model_set, ModelSet::Base);
    }

    #[test]
    fn matches_with_model_and_is_case_insensitive() {
        let extracted = extract("ADW_BUILD_ISO with advanced model please").unwrap();
        assert_eq!(extracted.workflow_template, WorkflowTemplate::BuildIso);
        assert_eq!(extracted.model_set, ModelSet::Advanced);
    }

    #[test]
    fn matches_with_explicit_adw_id() {
        let extracted = extract("adw_test_iso adw-deadbeef with base model").unwrap();
        assert_eq!(extracted.workflow_template, WorkflowTemplate::TestIso);
        assert_eq!(extracted.adw_id, AdwId::parse("deadbeef"));
    }

    #[test]
    fn unknown_template_name_falls_through() {
        assert!(extract("adw_does_not_exist with base model").is_none());
    }

    #[test]
    fn no_token_falls_through() {
        assert!(extract("please look into the login bug").is_none());
    }

    #[test]
    fn extraction_round_trips_through_serialization() {
        let extracted = extract("adw_review_iso adw-0123abcd with advanced model").unwrap();
        let json = serde_json::json!({
            "workflow_template": extracted.workflow_template.slug(),
            "adw_id": extracted.adw_id.map(|id| id.as_hex()),
            "model_set": match extracted.model_set {
                ModelSet::Base => "base",
                ModelSet::Advanced => "advanced",
            },
        });
        let reparsed = WorkflowTemplate::from_slug(json["workflow_template"].as_str().unwrap()).unwrap();
        assert_eq!(reparsed, extracted.workflow_template);
        let reparsed_id = AdwId::parse(json["adw_id"].as_str().unwrap()).unwrap();
        assert_eq!(Some(reparsed_id), extracted.adw_id);
    }
}
