//! skinlight-export: Pure format serializers (sans-IO)
//!
//! Converts analysis results into output formats: the metrics JSON
//! document and PNG-encoded visualizations. Every function returns
//! bytes or a `String`; writing them anywhere is the caller's job.

pub mod json;
pub mod png;

pub use json::{MetricsRecord, to_metrics_json};
pub use png::to_png;

/// Errors that can occur while serializing output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The metrics document could not be serialized.
    #[error("failed to serialize metrics JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The visualization could not be PNG-encoded.
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[from] image::ImageError),
}
