use std::path::PathBuf;

use skinlight_export::ExportError;
use skinlight_pipeline::PipelineError;

/// Errors raised while analysing a photo on disk.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// The source photo could not be read or decoded.
    #[error(
        "cannot load image {}: {reason} (the file may be missing or corrupt, or its format unsupported)",
        .path.display()
    )]
    Load {
        /// Path that was requested.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The pipeline rejected the decoded image.
    #[error("analysis failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// An output could not be serialized.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// An output directory could not be created.
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The face detector model could not be loaded.
    #[error("failed to load face model {}: {reason}", .path.display())]
    FaceModel {
        /// Model path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A session action needs an open image.
    #[error("no image is open")]
    NoImage,

    /// A session action needs a finished analysis.
    #[error("no analysis result yet")]
    NoResult,
}
