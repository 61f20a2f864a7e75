use thiserror::Error;

/// Errors surfaced by the synthesis engine.
///
/// Out-of-range parameters never reach this type: they are clamped by
/// [`crate::params::ParameterSet::clamped`]. Only structurally unusable
/// input, graph failures and container I/O are reported.
#[derive(Debug, Error)]
pub enum SfxError {
    /// Input that cannot be interpreted as a parameter set at all.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: malformed parameter JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The signal graph could not be built or produced unusable output.
    #[error("Render error: {0}")]
    Render(String),

    /// Parameter data that cannot be encoded as given (e.g. harmonics).
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, SfxError>;
