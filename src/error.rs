//! Pipeline error types. Data-quality problems (bad timestamps, missing
//! identities) are handled by drop/fill during cleaning and never surface here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required stage input file is absent. Fatal; the hint names the
    /// command that produces the file.
    #[error("missing input file {}: {hint}", path.display())]
    MissingInput { path: PathBuf, hint: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed generation or model parameters (e.g. a non-positive
    /// Poisson rate).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Degenerate data reaching the model (empty or misshapen matrix).
    #[error("model error: {0}")]
    Model(String),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl PipelineError {
    /// Missing-input error pointing the operator at the preceding stage.
    pub fn missing_input(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        Self::MissingInput {
            path: path.into(),
            hint: hint.into(),
        }
    }
}
