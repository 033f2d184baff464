//! skinlight-io: filesystem I/O, orchestration, and the front-end
//! session for skinlight.
//!
//! Reads the source photo, runs the sans-IO pipeline, writes the
//! visualization PNG and the optional metrics JSON. Front ends drive a
//! [`Session`] through their own [`Presenter`].

pub mod analyze;
pub mod error;
pub mod fs;
#[cfg(feature = "rustface")]
pub mod rustface_backend;
pub mod session;

pub use analyze::{
    AnalysisResult, AnalyzeOptions, DEFAULT_FACE_MODEL, DEFAULT_SAVE_PATH, analyze,
};
pub use error::AnalyzeError;
pub use fs::load_image;
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;
pub use session::{Presenter, Session};
