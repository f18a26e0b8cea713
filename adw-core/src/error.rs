use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("admission denied: {0}")]
    AdmissionDenied(#[from] crate::admission::AdmissionDenial),

    #[error("workflow {0} is not known to the dispatcher")]
    UnknownWorkflow(adw_model::AdwId),

    #[error(transparent)]
    Model(#[from] adw_model::ModelError),

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
