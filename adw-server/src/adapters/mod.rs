pub mod admission_probes;
pub mod classifier;
pub mod issue_tracker;
pub mod state_store;
pub mod supervisor;
