use thiserror::Error;

/// Failure taxonomy of the volume pipeline. No partial results: a run either
/// returns a fully populated estimate or one of these.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// Malformed image bytes. A client error, not retryable with the same payload.
    #[error("failed to decode image bytes: {0}")]
    DecodeFailure(#[from] image::ImageError),

    /// No hand landmarks in the frame. Recoverable: the caller should prompt
    /// for a retake with the hand visible.
    #[error("no hand detected in the image")]
    NoHandDetected,

    /// A hand was detected but its rasterized mask covers zero pixels, so
    /// there is no reference region for the depth ratio. Distinct from
    /// `NoHandDetected` even though the root cause is detection weakness.
    #[error("hand mask rasterized to zero pixels")]
    EmptyHandMask,

    /// The depth or landmark model failed or exceeded its inference budget.
    /// Fatal for the request; never defaulted to a fabricated volume.
    #[error("model inference failed: {0}")]
    ModelFailure(#[source] anyhow::Error),

    /// Request parameters outside their plausibility bounds.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
