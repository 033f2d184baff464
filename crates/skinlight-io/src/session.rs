//! Front-end session: the open / run / save / export / reset workflow
//! implemented once and shared by every front end.

use std::path::{Path, PathBuf};

use skinlight_export::to_png;
use skinlight_pipeline::RgbImage;
use tracing::info;

use crate::analyze::{AnalysisResult, AnalyzeOptions, DEFAULT_SAVE_PATH, analyze};
use crate::AnalyzeError;
use crate::fs::{load_image, write_file};

/// Display surface driven by a [`Session`].
pub trait Presenter {
    /// Show the photo that was just opened.
    fn show_source(&mut self, path: &Path, image: &RgbImage);

    /// Show a finished analysis. `result.visualization` is always set.
    fn show_result(&mut self, result: &AnalysisResult);

    /// Show a one-line status message.
    fn status(&mut self, message: &str);

    /// Return to the empty state.
    fn clear(&mut self);
}

/// Holds the open photo and the last result between user actions.
pub struct Session<P: Presenter> {
    presenter: P,
    auto_face: bool,
    light_comp: bool,
    face_model: Option<PathBuf>,
    save_path: PathBuf,
    image_path: Option<PathBuf>,
    last: Option<AnalysisResult>,
}

impl<P: Presenter> Session<P> {
    /// Create an empty session writing results to [`DEFAULT_SAVE_PATH`].
    #[must_use]
    pub fn new(presenter: P) -> Self {
        let defaults = AnalyzeOptions::default();
        Self {
            presenter,
            auto_face: defaults.auto_face,
            light_comp: defaults.light_comp,
            face_model: None,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            image_path: None,
            last: None,
        }
    }

    /// Toggle face location for subsequent runs.
    pub const fn set_auto_face(&mut self, enabled: bool) {
        self.auto_face = enabled;
    }

    /// Toggle brightness equalization for subsequent runs.
    pub const fn set_light_comp(&mut self, enabled: bool) {
        self.light_comp = enabled;
    }

    /// Use a SeetaFace model for subsequent runs.
    pub fn set_face_model(&mut self, path: Option<PathBuf>) {
        self.face_model = path;
    }

    /// Where [`Session::run_analysis`] writes the visualization.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) {
        self.save_path = path.into();
    }

    /// The presenter this session drives.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The last finished analysis, if any.
    #[must_use]
    pub const fn last_result(&self) -> Option<&AnalysisResult> {
        self.last.as_ref()
    }

    fn options(&self, export_json: Option<PathBuf>, return_image: bool) -> AnalyzeOptions {
        AnalyzeOptions {
            auto_face: self.auto_face,
            light_comp: self.light_comp,
            export_json,
            return_image,
            face_model: self.face_model.clone(),
        }
    }

    /// Load a photo and show it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::Load`]; the session keeps its previous
    /// photo in that case.
    pub fn open_image(&mut self, path: &Path) -> Result<(), AnalyzeError> {
        let image = load_image(path)?;
        self.presenter.show_source(path, &image);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.presenter.status(&format!("Loaded {name}"));
        self.image_path = Some(path.to_path_buf());
        self.last = None;
        Ok(())
    }

    /// Analyse the open photo and show the result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::NoImage`] before a photo is opened, or any
    /// error from [`analyze`].
    pub fn run_analysis(&mut self) -> Result<&AnalysisResult, AnalyzeError> {
        let image_path = self.image_path.clone().ok_or(AnalyzeError::NoImage)?;
        let result = analyze(&image_path, &self.save_path, &self.options(None, true))?;
        self.presenter.show_result(&result);
        let s = result.scores;
        self.presenter.status(&format!(
            "Analysis complete: Redness={:.2}, Blemish={:.2}, Tone={:.2}",
            s.redness, s.blemish, s.tone_uniformity
        ));
        Ok(self.last.insert(result))
    }

    /// Write the last visualization to `path` as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::NoResult`] before an analysis has run, or
    /// an encode or write error.
    pub fn save_image(&mut self, path: &Path) -> Result<(), AnalyzeError> {
        let image = self
            .last
            .as_ref()
            .and_then(|r| r.visualization.as_ref())
            .ok_or(AnalyzeError::NoResult)?;
        write_file(path, to_png(image)?)?;
        info!(path = %path.display(), "saved visualization");
        self.presenter
            .status(&format!("Saved result: {}", path.display()));
        Ok(())
    }

    /// Write the metrics JSON for the open photo to `path`.
    ///
    /// Re-runs the analysis with the current flags so the exported
    /// metrics match a fresh run exactly. The visualization is rewritten
    /// to the path of the last result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::NoResult`] before an analysis has run, or
    /// any error from [`analyze`].
    pub fn export_json(&mut self, path: &Path) -> Result<(), AnalyzeError> {
        let (Some(image_path), Some(last)) = (&self.image_path, &self.last) else {
            return Err(AnalyzeError::NoResult);
        };
        analyze(
            image_path,
            &last.result_image,
            &self.options(Some(path.to_path_buf()), false),
        )?;
        self.presenter
            .status(&format!("Saved metrics JSON: {}", path.display()));
        Ok(())
    }

    /// Forget the open photo and result.
    pub fn reset(&mut self) {
        self.image_path = None;
        self.last = None;
        self.presenter.clear();
    }
}
