use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions hit while loading the model/encoder artifacts.
/// Every variant names the artifact so the operator knows which file to regenerate.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("required artifact `{name}` not found at {}", .path.display())]
    MissingArtifact { name: &'static str, path: PathBuf },

    #[error("artifact `{name}` at {} could not be read: {source}", .path.display())]
    UnreadableArtifact {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact `{name}` is corrupt: {source}")]
    CorruptArtifact {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact `{name}` is invalid: {reason}")]
    InvalidArtifact { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("unknown {field} category `{value}`")]
    UnknownCategory { field: &'static str, value: String },

    #[error("{field} code {code} is outside the encoder domain (size {size})")]
    UnknownCode {
        field: &'static str,
        code: i64,
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("malformed tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },

    #[error("classifier failed: {0}")]
    Backend(String),
}

/// Non-fatal failure of a single facade call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Which of the two recommendation steps failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Crop,
    Fertilizer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Crop => f.write_str("crop"),
            Stage::Fertilizer => f.write_str("fertilizer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("no crop has been recommended yet; request a crop recommendation first")]
    NoCropRecommended,

    #[error("no {0} selected")]
    MissingSelection(&'static str),

    #[error("`{0}` is not one of the known crops")]
    UnknownCrop(String),

    #[error("An error occurred during {stage} prediction: {source}")]
    Prediction {
        stage: Stage,
        #[source]
        source: PredictionError,
    },
}

/// Rejected form input at the request boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: f64,
        value: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value `{value}` for {var}")]
    InvalidEnv { var: &'static str, value: String },
}
