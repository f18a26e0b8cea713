//! Rough cost estimation for the `/request` preview endpoint. Pricing is a
//! coarse per-template, per-model-set table; it is intentionally simple
//! since actual spend is only known after the workflow completes.

use adw_model::{ComplexityLevel, ModelSet, WorkflowTemplate};

fn base_rate(model_set: ModelSet) -> f64 {
    match model_set {
        ModelSet::Base => 0.50,
        ModelSet::Advanced => 2.00,
    }
}

fn template_multiplier(workflow_template: WorkflowTemplate) -> f64 {
    match workflow_template {
        WorkflowTemplate::LightweightIso => 0.5,
        WorkflowTemplate::PlanIso | WorkflowTemplate::ReviewIso => 1.0,
        WorkflowTemplate::PatchIso | WorkflowTemplate::TestIso => 1.5,
        WorkflowTemplate::BuildIso => 2.5,
    }
}

fn complexity_multiplier(complexity_level: ComplexityLevel) -> f64 {
    match complexity_level {
        ComplexityLevel::Simple => 0.6,
        ComplexityLevel::Medium => 1.0,
        ComplexityLevel::Complex => 2.2,
    }
}

pub fn estimate_cost(
    workflow_template: WorkflowTemplate,
    model_set: ModelSet,
    complexity_level: ComplexityLevel,
) -> f64 {
    base_rate(model_set) * template_multiplier(workflow_template) * complexity_multiplier(complexity_level)
}
