//! The slow-path classifier (§4.1) is an external collaborator — an
//! LLM-backed service behind [`adw_contracts::classifier::Classifier`] —
//! deliberately out of scope here. This stub always declines, so ingestion
//! that misses the fast path falls through to the non-fatal "ignored" path
//! until a real provider-backed classifier is wired in.

use adw_contracts::classifier::{Classifier, ClassificationOutcome};
use async_trait::async_trait;

pub struct NoopClassifier;

#[async_trait]
impl Classifier for NoopClassifier {
    async fn classify(&self, _text: &str) -> anyhow::Result<Option<ClassificationOutcome>> {
        Ok(None)
    }
}
