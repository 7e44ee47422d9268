use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by pipeline construction and classification.
///
/// None of these are recovered internally: a failing stage aborts the
/// single classification call, and a failing model load aborts construction.
#[derive(Debug, Error)]
pub enum Error {
    /// The input path did not resolve to a decodable image.
    #[error("could not load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A required model artifact failed to load at construction time.
    #[error("model '{name}' unavailable: {reason}")]
    ModelUnavailable { name: String, reason: String },

    /// A stage adapter's forward pass failed on malformed input.
    #[error("inference failed in {stage} stage: {reason}")]
    Inference { stage: &'static str, reason: String },

    /// An out-of-range threshold or confidence supplied at construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing a diagnostic overlay failed.
    #[error("could not write diagnostic output: {0}")]
    Diagnostics(String),
}

impl Error {
    pub fn model_unavailable(name: impl Into<String>, reason: impl ToString) -> Self {
        Error::ModelUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(stage: &'static str, reason: impl ToString) -> Self {
        Error::Inference {
            stage,
            reason: reason.to_string(),
        }
    }
}
