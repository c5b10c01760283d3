use rosie_core::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{0} must be fitted before predicting")]
    NotFitted(&'static str),

    #[error("contamination must be greater than 0 and less than 1, got {0}")]
    InvalidContamination(f64),

    #[error("fitted on {fitted} rows but asked to predict {given}")]
    LengthMismatch { fitted: usize, given: usize },

    #[error("model (de)serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
